//! Voice configuration.
//!
//! [`VoiceConfig`] holds every construction parameter with its default. A
//! patch file is TOML with the same field names; missing fields take their
//! defaults and unknown fields are rejected.
//!
//! ```toml
//! portamento = 0.05
//! osc_type = "square"
//! detune = 20.0
//! volume = 0.0
//!
//! [filter]
//! q = 6.0
//! frequency = 4000.0
//! type = "lowpass"
//! rolloff = -12
//!
//! [envelope]
//! attack = 0.005
//! decay = 0.1
//! sustain = 0.9
//! release = 1.0
//!
//! [filter_envelope]
//! attack = 0.06
//! decay = 0.2
//! sustain = 0.5
//! release = 2.0
//! min = 10.0
//! max = 4000.0
//! ```
//!
//! [`VoiceUpdate`] is the partial counterpart used for bulk parameter
//! changes: every field is optional, nested structures included.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoiceError};
use crate::filter::{FilterType, Rolloff};
use crate::oscillator::OscillatorWaveform;

/// Complete voice configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoiceConfig {
    /// Glide time in seconds; 0 disables glide.
    pub portamento: f64,
    /// Waveform of both oscillators.
    pub osc_type: OscillatorWaveform,
    /// Detune of the second oscillator in cents.
    pub detune: f32,
    /// Output level in dB.
    pub volume: f32,
    /// Filter settings.
    pub filter: FilterConfig,
    /// Amplitude envelope.
    pub envelope: EnvelopeConfig,
    /// Filter cutoff envelope.
    pub filter_envelope: FilterEnvelopeConfig,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            portamento: 0.05,
            osc_type: OscillatorWaveform::Square,
            detune: 20.0,
            volume: 0.0,
            filter: FilterConfig::default(),
            envelope: EnvelopeConfig::default(),
            filter_envelope: FilterEnvelopeConfig::default(),
        }
    }
}

impl VoiceConfig {
    /// Parse a TOML patch.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML patch from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|e| VoiceError::read_file(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A copy of `self` with every field present in `update` replaced.
    pub fn merged(&self, update: &VoiceUpdate) -> Self {
        let mut next = self.clone();
        update.apply_to(&mut next);
        next
    }

    /// Check every field against its accepted range.
    pub fn validate(&self) -> Result<()> {
        validate_portamento(self.portamento)?;
        validate_detune(self.detune)?;
        validate_volume(self.volume)?;
        self.filter.validate()?;
        self.envelope.validate("envelope")?;
        self.filter_envelope.validate()
    }
}

/// Filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Resonance in [0.5, 20].
    pub q: f32,
    /// Base cutoff in Hz (> 0).
    pub frequency: f32,
    /// Response type.
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Slope in dB/oct.
    pub rolloff: Rolloff,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            q: 6.0,
            frequency: 4000.0,
            filter_type: FilterType::Lowpass,
            rolloff: Rolloff::Db12,
        }
    }
}

impl FilterConfig {
    /// Check Q and base frequency.
    pub fn validate(&self) -> Result<()> {
        if !(0.5..=20.0).contains(&self.q) {
            return Err(VoiceError::invalid(
                "filter.q",
                self.q,
                "must be within [0.5, 20]",
            ));
        }
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(VoiceError::invalid(
                "filter.frequency",
                self.frequency,
                "must be a finite frequency > 0 Hz",
            ));
        }
        Ok(())
    }
}

/// Attack, decay, sustain and release.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvelopeConfig {
    /// Attack duration in seconds.
    pub attack: f64,
    /// Decay duration in seconds.
    pub decay: f64,
    /// Sustain level in [0, 1].
    pub sustain: f32,
    /// Release duration in seconds.
    pub release: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.005,
            decay: 0.1,
            sustain: 0.9,
            release: 1.0,
        }
    }
}

impl EnvelopeConfig {
    /// Check durations and sustain; `prefix` names the envelope in errors.
    pub fn validate(&self, prefix: &str) -> Result<()> {
        for (name, seconds) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(VoiceError::invalid(
                    format!("{prefix}.{name}"),
                    seconds,
                    "must be a finite number of seconds >= 0",
                ));
            }
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(VoiceError::invalid(
                format!("{prefix}.sustain"),
                self.sustain,
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Filter envelope: ADSR plus the frequency range the level maps into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterEnvelopeConfig {
    /// Attack duration in seconds.
    pub attack: f64,
    /// Decay duration in seconds.
    pub decay: f64,
    /// Sustain level in [0, 1].
    pub sustain: f32,
    /// Release duration in seconds.
    pub release: f64,
    /// Output at level 0, in Hz.
    pub min: f32,
    /// Output at level 1, in Hz.
    pub max: f32,
}

impl Default for FilterEnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.06,
            decay: 0.2,
            sustain: 0.5,
            release: 2.0,
            min: 10.0,
            max: 4000.0,
        }
    }
}

impl FilterEnvelopeConfig {
    /// The ADSR part.
    pub fn adsr(&self) -> EnvelopeConfig {
        EnvelopeConfig {
            attack: self.attack,
            decay: self.decay,
            sustain: self.sustain,
            release: self.release,
        }
    }

    /// Check the ADSR part and the range.
    pub fn validate(&self) -> Result<()> {
        self.adsr().validate("filter_envelope")?;
        if !self.min.is_finite() || self.min < 0.0 {
            return Err(VoiceError::invalid(
                "filter_envelope.min",
                self.min,
                "must be finite and >= 0",
            ));
        }
        if !self.max.is_finite() || self.max < self.min {
            return Err(VoiceError::invalid(
                "filter_envelope.max",
                self.max,
                "must be finite and >= min",
            ));
        }
        Ok(())
    }
}

/// Partial [`VoiceConfig`]: only present fields are applied.
///
/// ```rust
/// use portavox_synth::{EnvelopeUpdate, VoiceConfig, VoiceUpdate};
///
/// let update = VoiceUpdate {
///     detune: Some(0.0),
///     envelope: Some(EnvelopeUpdate { release: Some(0.3), ..Default::default() }),
///     ..Default::default()
/// };
/// let config = VoiceConfig::default().merged(&update);
/// assert_eq!(config.detune, 0.0);
/// assert_eq!(config.envelope.release, 0.3);
/// assert_eq!(config.envelope.attack, 0.005);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoiceUpdate {
    /// Glide time in seconds.
    pub portamento: Option<f64>,
    /// Waveform of both oscillators.
    pub osc_type: Option<OscillatorWaveform>,
    /// Detune of the second oscillator in cents.
    pub detune: Option<f32>,
    /// Output level in dB.
    pub volume: Option<f32>,
    /// Filter fields.
    pub filter: Option<FilterUpdate>,
    /// Amplitude envelope fields.
    pub envelope: Option<EnvelopeUpdate>,
    /// Filter envelope fields.
    pub filter_envelope: Option<FilterEnvelopeUpdate>,
}

impl VoiceUpdate {
    /// Parse a partial TOML patch.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Write present fields into `config`.
    pub fn apply_to(&self, config: &mut VoiceConfig) {
        set(&mut config.portamento, self.portamento);
        set(&mut config.osc_type, self.osc_type);
        set(&mut config.detune, self.detune);
        set(&mut config.volume, self.volume);
        if let Some(filter) = &self.filter {
            filter.apply_to(&mut config.filter);
        }
        if let Some(envelope) = &self.envelope {
            envelope.apply_to(&mut config.envelope);
        }
        if let Some(filter_envelope) = &self.filter_envelope {
            filter_envelope.apply_to(&mut config.filter_envelope);
        }
    }
}

/// Partial [`FilterConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterUpdate {
    /// Resonance.
    pub q: Option<f32>,
    /// Base cutoff in Hz.
    pub frequency: Option<f32>,
    /// Response type.
    #[serde(rename = "type")]
    pub filter_type: Option<FilterType>,
    /// Slope in dB/oct.
    pub rolloff: Option<Rolloff>,
}

impl FilterUpdate {
    /// Write present fields into `config`.
    pub fn apply_to(&self, config: &mut FilterConfig) {
        set(&mut config.q, self.q);
        set(&mut config.frequency, self.frequency);
        set(&mut config.filter_type, self.filter_type);
        set(&mut config.rolloff, self.rolloff);
    }
}

/// Partial [`EnvelopeConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvelopeUpdate {
    /// Attack duration in seconds.
    pub attack: Option<f64>,
    /// Decay duration in seconds.
    pub decay: Option<f64>,
    /// Sustain level.
    pub sustain: Option<f32>,
    /// Release duration in seconds.
    pub release: Option<f64>,
}

impl EnvelopeUpdate {
    /// Write present fields into `config`.
    pub fn apply_to(&self, config: &mut EnvelopeConfig) {
        set(&mut config.attack, self.attack);
        set(&mut config.decay, self.decay);
        set(&mut config.sustain, self.sustain);
        set(&mut config.release, self.release);
    }
}

/// Partial [`FilterEnvelopeConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterEnvelopeUpdate {
    /// Attack duration in seconds.
    pub attack: Option<f64>,
    /// Decay duration in seconds.
    pub decay: Option<f64>,
    /// Sustain level.
    pub sustain: Option<f32>,
    /// Release duration in seconds.
    pub release: Option<f64>,
    /// Output at level 0, in Hz.
    pub min: Option<f32>,
    /// Output at level 1, in Hz.
    pub max: Option<f32>,
}

impl FilterEnvelopeUpdate {
    /// Write present fields into `config`.
    pub fn apply_to(&self, config: &mut FilterEnvelopeConfig) {
        set(&mut config.attack, self.attack);
        set(&mut config.decay, self.decay);
        set(&mut config.sustain, self.sustain);
        set(&mut config.release, self.release);
        set(&mut config.min, self.min);
        set(&mut config.max, self.max);
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn validate_portamento(seconds: f64) -> Result<()> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(VoiceError::invalid(
            "portamento",
            seconds,
            "must be a finite number of seconds >= 0",
        ))
    }
}

fn validate_detune(cents: f32) -> Result<()> {
    if cents.is_finite() {
        Ok(())
    } else {
        Err(VoiceError::invalid("detune", cents, "must be finite"))
    }
}

/// `-inf` dB is accepted and mutes the voice.
fn validate_volume(db: f32) -> Result<()> {
    if db.is_nan() || db == f32::INFINITY {
        Err(VoiceError::invalid(
            "volume",
            db,
            "must be a finite dB value or -inf",
        ))
    } else {
        Ok(())
    }
}
