//! Voice filter: cascaded SVF with an additive cutoff modulation input.
//!
//! The filter's type, Q and slope are set by configuration. Its cutoff is
//! recomputed every sample as `frequency + modulation`, where the voice
//! passes the filter envelope's output as the modulation.

use std::fmt;
use std::str::FromStr;

use portavox_core::{Effect, SvfCascade, SvfResponse};
use serde::{Deserialize, Serialize};

use crate::config::{FilterConfig, FilterUpdate};
use crate::error::{Result, VoiceError};

/// Filter response type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Passes below the cutoff.
    #[default]
    Lowpass,
    /// Passes above the cutoff.
    Highpass,
    /// Passes around the cutoff.
    Bandpass,
    /// Rejects around the cutoff.
    Notch,
}

impl FilterType {
    /// All types, in patch-name order.
    pub const ALL: [Self; 4] = [Self::Lowpass, Self::Highpass, Self::Bandpass, Self::Notch];

    /// Patch name of the type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lowpass => "lowpass",
            Self::Highpass => "highpass",
            Self::Bandpass => "bandpass",
            Self::Notch => "notch",
        }
    }
}

impl From<FilterType> for SvfResponse {
    fn from(filter_type: FilterType) -> Self {
        match filter_type {
            FilterType::Lowpass => SvfResponse::Lowpass,
            FilterType::Highpass => SvfResponse::Highpass,
            FilterType::Bandpass => SvfResponse::Bandpass,
            FilterType::Notch => SvfResponse::Notch,
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = VoiceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VoiceError::UnknownFilterType(s.to_string()))
    }
}

/// Filter slope. Serialized as the dB/oct integer (`-12`, `-24`, `-48`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rolloff {
    /// One 2-pole stage.
    #[default]
    Db12,
    /// Two stages.
    Db24,
    /// Four stages.
    Db48,
}

impl Rolloff {
    /// Number of cascaded 2-pole stages.
    pub fn stages(self) -> usize {
        match self {
            Rolloff::Db12 => 1,
            Rolloff::Db24 => 2,
            Rolloff::Db48 => 4,
        }
    }

    /// Slope in dB/oct (negative).
    pub fn db_per_octave(self) -> i32 {
        -12 * self.stages() as i32
    }
}

impl TryFrom<i32> for Rolloff {
    type Error = VoiceError;

    fn try_from(db: i32) -> std::result::Result<Self, Self::Error> {
        match db {
            -12 => Ok(Rolloff::Db12),
            -24 => Ok(Rolloff::Db24),
            -48 => Ok(Rolloff::Db48),
            other => Err(VoiceError::UnsupportedRolloff(other)),
        }
    }
}

impl From<Rolloff> for i32 {
    fn from(rolloff: Rolloff) -> Self {
        rolloff.db_per_octave()
    }
}

/// Resonant voice filter.
///
/// # Example
///
/// ```rust
/// use portavox_synth::{Filter, FilterConfig};
///
/// let mut filter = Filter::new(48000.0, FilterConfig::default()).unwrap();
/// // Cutoff for this sample: 4000 Hz base + 500 Hz from the envelope.
/// let out = filter.process(0.25, 500.0);
/// assert!(out.is_finite());
/// assert_eq!(filter.cutoff(), 4500.0);
/// ```
#[derive(Debug, Clone)]
pub struct Filter {
    cascade: SvfCascade,
    config: FilterConfig,
    last_cutoff: f32,
}

impl Filter {
    /// Create a filter from a validated configuration.
    pub fn new(sample_rate: f32, config: FilterConfig) -> Result<Self> {
        config.validate()?;
        let mut filter = Self {
            cascade: SvfCascade::new(sample_rate, config.rolloff.stages()),
            config,
            last_cutoff: config.frequency,
        };
        filter.configure();
        Ok(filter)
    }

    /// Current settings.
    pub fn config(&self) -> FilterConfig {
        self.config
    }

    /// Base cutoff in Hz.
    pub fn frequency(&self) -> f32 {
        self.config.frequency
    }

    /// Resonance.
    pub fn q(&self) -> f32 {
        self.config.q
    }

    /// Response type.
    pub fn filter_type(&self) -> FilterType {
        self.config.filter_type
    }

    /// Slope.
    pub fn rolloff(&self) -> Rolloff {
        self.config.rolloff
    }

    /// Cutoff used for the most recent sample, after clamping.
    pub fn cutoff(&self) -> f32 {
        self.cascade.cutoff()
    }

    /// Apply every present field, or nothing if the result is invalid.
    pub fn set(&mut self, update: &FilterUpdate) -> Result<()> {
        let mut next = self.config;
        update.apply_to(&mut next);
        next.validate()?;
        self.config = next;
        self.configure();
        Ok(())
    }

    /// Filter one sample with the cutoff at `frequency + modulation`.
    #[inline]
    pub fn process(&mut self, input: f32, modulation: f32) -> f32 {
        let cutoff = self.config.frequency + modulation;
        if cutoff != self.last_cutoff {
            self.last_cutoff = cutoff;
            self.cascade.set_cutoff(cutoff);
        }
        self.cascade.process(input)
    }

    /// Clear filter state.
    pub fn reset(&mut self) {
        self.cascade.reset();
    }

    fn configure(&mut self) {
        self.cascade.set_stages(self.config.rolloff.stages());
        self.cascade.set_resonance(self.config.q);
        self.cascade.set_response(self.config.filter_type.into());
        self.cascade.set_cutoff(self.last_cutoff);
    }
}
