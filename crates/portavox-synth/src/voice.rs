//! Monophonic voice with portamento.
//!
//! [`MonoSynth`] owns one signal graph, wired once at construction:
//!
//! ```text
//!  frequency ──→ OscillatorPair ──→ Filter ──→ × amp envelope ──→ × volume ──→ out
//!  (ControlSignal)                    ↑
//!                     filter envelope ┘ (added to the base cutoff)
//! ```
//!
//! Note events never touch the signal path directly. They schedule changes
//! on three timelines (the frequency signal and the two envelopes), and the
//! render loop evaluates those timelines at every sample's timestamp. The
//! oscillators run for the voice's whole lifetime, so retriggers never
//! restart their phase.
//!
//! Time is counted in samples from construction; `now()` is the timestamp
//! of the next sample to be rendered. Calls that take `Option<f64>` use
//! `now()` for `None`.

use portavox_core::{ControlSignal, db_to_linear};

use crate::config::{VoiceConfig, VoiceUpdate};
use crate::envelope::Envelope;
use crate::error::{Result, VoiceError};
use crate::filter::Filter;
use crate::oscillator::OscillatorWaveform;
use crate::unison::OscillatorPair;

/// Frequency the voice holds before its first note, in Hz.
pub const INITIAL_FREQUENCY: f32 = 440.0;

/// Components owned by a live voice.
#[derive(Debug, Clone)]
struct VoiceGraph {
    frequency: ControlSignal,
    oscillators: OscillatorPair,
    filter: Filter,
    envelope: Envelope,
    filter_envelope: Envelope,
}

impl VoiceGraph {
    fn new(sample_rate: f32, config: &VoiceConfig) -> Result<Self> {
        let filter_envelope = &config.filter_envelope;
        Ok(Self {
            frequency: ControlSignal::new(INITIAL_FREQUENCY)?,
            oscillators: OscillatorPair::new(sample_rate, config.osc_type, config.detune),
            filter: Filter::new(sample_rate, config.filter)?,
            envelope: Envelope::new(config.envelope, 0.0, 1.0)?,
            filter_envelope: Envelope::new(
                filter_envelope.adsr(),
                filter_envelope.min,
                filter_envelope.max,
            )?,
        })
    }

    /// Schedule a pitch change at `time`, gliding over `portamento` seconds.
    fn glide(&mut self, frequency: f32, time: f64, portamento: f64) -> Result<()> {
        let end = time + portamento;
        if end > time {
            self.frequency.hold_at_time(time)?;
            self.frequency.exponential_ramp_to(frequency, time, end)?;
        } else {
            self.frequency.set_value_at_time(frequency, time)?;
        }
        Ok(())
    }

    #[inline]
    fn tick(&mut self, time: f64) -> f32 {
        self.frequency.advance_to(time);
        self.envelope.advance_to(time);
        self.filter_envelope.advance_to(time);

        let osc = self.oscillators.process(self.frequency.value_at(time));
        let filtered = self.filter.process(osc, self.filter_envelope.value_at(time));
        filtered * self.envelope.value_at(time)
    }
}

/// Monophonic synthesizer voice.
///
/// One note at a time: a new attack while a note sounds retriggers both
/// envelopes from their current level and glides the pitch from wherever
/// it is.
///
/// After [`dispose`](Self::dispose) every method returns
/// [`VoiceError::Disposed`].
///
/// # Example
///
/// ```rust
/// use portavox_synth::{MonoSynth, VoiceConfig};
///
/// let mut synth = MonoSynth::new(48000.0, VoiceConfig::default()).unwrap();
/// synth.trigger_attack(220.0, Some(0.0)).unwrap();
/// synth.trigger_release(Some(0.5)).unwrap();
///
/// let mut buffer = vec![0.0f32; 4800];
/// synth.render(&mut buffer).unwrap();
/// assert!(buffer.iter().any(|s| s.abs() > 0.01));
///
/// synth.dispose().unwrap();
/// assert!(synth.render(&mut buffer).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MonoSynth {
    sample_rate: f32,
    clock: u64,
    config: VoiceConfig,
    gain: f32,
    graph: Option<VoiceGraph>,
}

impl MonoSynth {
    /// Build a voice from a configuration.
    pub fn new(sample_rate: f32, config: VoiceConfig) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(VoiceError::invalid(
                "sample_rate",
                sample_rate,
                "must be a finite rate > 0 Hz",
            ));
        }
        config.validate()?;
        let graph = VoiceGraph::new(sample_rate, &config)?;
        tracing::debug!(
            sample_rate,
            osc_type = %config.osc_type,
            detune = config.detune,
            portamento = config.portamento,
            "portavox: voice created"
        );
        Ok(Self {
            sample_rate,
            clock: 0,
            gain: db_to_linear(config.volume),
            config,
            graph: Some(graph),
        })
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> Result<f32> {
        self.graph()?;
        Ok(self.sample_rate)
    }

    /// Timestamp of the next sample to be rendered, in seconds.
    pub fn now(&self) -> Result<f64> {
        self.graph()?;
        Ok(self.clock_time())
    }

    /// Start a note at full velocity.
    pub fn trigger_attack(&mut self, frequency: f32, time: Option<f64>) -> Result<()> {
        self.trigger_attack_with_velocity(frequency, time, 1.0)
    }

    /// Start a note.
    ///
    /// Schedules, at `time`: a linear attack of the amplitude envelope
    /// peaking at `velocity`, an exponential attack of the filter envelope,
    /// and a glide to `frequency`. Every argument is checked first; a
    /// rejected call schedules nothing.
    pub fn trigger_attack_with_velocity(
        &mut self,
        frequency: f32,
        time: Option<f64>,
        velocity: f32,
    ) -> Result<()> {
        let time = self.resolve(time)?;
        check_frequency(frequency)?;
        Envelope::check_trigger(time, velocity)?;

        let portamento = self.config.portamento;
        let graph = self.graph.as_mut().ok_or(VoiceError::Disposed)?;
        graph.envelope.trigger_attack(time, velocity)?;
        graph.filter_envelope.trigger_exponential_attack(time, 1.0)?;
        graph.glide(frequency, time, portamento)?;
        tracing::debug!(frequency, time, velocity, "portavox: attack");
        Ok(())
    }

    /// Release the note: both envelopes fall to zero. Pitch is unchanged.
    pub fn trigger_release(&mut self, time: Option<f64>) -> Result<()> {
        let time = self.resolve(time)?;
        Envelope::check_trigger(time, 1.0)?;

        let graph = self.graph.as_mut().ok_or(VoiceError::Disposed)?;
        graph.envelope.trigger_release(time)?;
        graph.filter_envelope.trigger_exponential_release(time)?;
        tracing::debug!(time, "portavox: release");
        Ok(())
    }

    /// Attack at `time`, then release `duration` seconds later.
    pub fn trigger_attack_release(
        &mut self,
        frequency: f32,
        duration: f64,
        time: Option<f64>,
        velocity: f32,
    ) -> Result<()> {
        let time = self.resolve(time)?;
        if !duration.is_finite() || duration < 0.0 {
            return Err(VoiceError::invalid(
                "duration",
                duration,
                "must be a finite number of seconds >= 0",
            ));
        }
        let release = time + duration;
        check_frequency(frequency)?;
        Envelope::check_trigger(time, velocity)?;
        Envelope::check_trigger(release, 1.0)?;

        self.trigger_attack_with_velocity(frequency, Some(time), velocity)?;
        self.trigger_release(Some(release))
    }

    /// Change pitch at `time` without retriggering the envelopes.
    ///
    /// Follows the same glide rule as an attack.
    pub fn set_note(&mut self, frequency: f32, time: Option<f64>) -> Result<()> {
        let time = self.resolve(time)?;
        check_frequency(frequency)?;
        Envelope::check_trigger(time, 1.0)?;

        let portamento = self.config.portamento;
        let graph = self.graph.as_mut().ok_or(VoiceError::Disposed)?;
        graph.glide(frequency, time, portamento)?;
        tracing::debug!(frequency, time, "portavox: set note");
        Ok(())
    }

    /// Set the waveform of both oscillators.
    pub fn set_osc_type(&mut self, waveform: OscillatorWaveform) -> Result<()> {
        self.set(&VoiceUpdate {
            osc_type: Some(waveform),
            ..Default::default()
        })
    }

    /// Set the second oscillator's detune in cents.
    pub fn set_detune(&mut self, cents: f32) -> Result<()> {
        self.set(&VoiceUpdate {
            detune: Some(cents),
            ..Default::default()
        })
    }

    /// Set the glide time in seconds. Applies to notes scheduled afterward.
    pub fn set_portamento(&mut self, seconds: f64) -> Result<()> {
        self.set(&VoiceUpdate {
            portamento: Some(seconds),
            ..Default::default()
        })
    }

    /// Set the output level in dB. `-inf` mutes.
    pub fn set_volume(&mut self, db: f32) -> Result<()> {
        self.set(&VoiceUpdate {
            volume: Some(db),
            ..Default::default()
        })
    }

    /// Apply every field present in `update`.
    ///
    /// The merged configuration is validated as a whole before any
    /// component changes, so an invalid update leaves the voice untouched.
    /// Envelope settings apply to triggers scheduled afterward.
    pub fn set(&mut self, update: &VoiceUpdate) -> Result<()> {
        let graph = self.graph.as_mut().ok_or(VoiceError::Disposed)?;
        let next = self.config.merged(update);
        next.validate()?;

        if let Some(waveform) = update.osc_type {
            graph.oscillators.set_waveform(waveform);
        }
        if let Some(cents) = update.detune {
            graph.oscillators.set_detune(cents);
        }
        if let Some(filter) = &update.filter {
            graph.filter.set(filter)?;
        }
        if update.envelope.is_some() {
            graph.envelope.set_adsr(next.envelope)?;
        }
        if update.filter_envelope.is_some() {
            let filter_envelope = &next.filter_envelope;
            graph.filter_envelope.set_adsr(filter_envelope.adsr())?;
            graph
                .filter_envelope
                .set_range(filter_envelope.min, filter_envelope.max)?;
        }
        self.gain = db_to_linear(next.volume);
        self.config = next;
        tracing::debug!(?update, "portavox: parameters updated");
        Ok(())
    }

    /// Render consecutive samples into `output`.
    pub fn render(&mut self, output: &mut [f32]) -> Result<()> {
        let graph = self.graph.as_mut().ok_or(VoiceError::Disposed)?;
        let rate = f64::from(self.sample_rate);
        for sample in output.iter_mut() {
            let time = self.clock as f64 / rate;
            *sample = graph.tick(time) * self.gain;
            self.clock += 1;
        }
        Ok(())
    }

    /// Render a single sample.
    pub fn process(&mut self) -> Result<f32> {
        let mut sample = [0.0];
        self.render(&mut sample)?;
        Ok(sample[0])
    }

    /// Pitch in effect at `now()`, in Hz.
    pub fn current_frequency(&self) -> Result<f32> {
        Ok(self.graph()?.frequency.value_at(self.clock_time()))
    }

    /// The frequency timeline.
    pub fn frequency(&self) -> Result<&ControlSignal> {
        Ok(&self.graph()?.frequency)
    }

    /// The frequency timeline, for scheduling custom automation.
    pub fn frequency_mut(&mut self) -> Result<&mut ControlSignal> {
        Ok(&mut self.graph_mut()?.frequency)
    }

    /// The amplitude envelope.
    pub fn envelope(&self) -> Result<&Envelope> {
        Ok(&self.graph()?.envelope)
    }

    /// The amplitude envelope, for direct scheduling.
    pub fn envelope_mut(&mut self) -> Result<&mut Envelope> {
        Ok(&mut self.graph_mut()?.envelope)
    }

    /// The filter envelope.
    pub fn filter_envelope(&self) -> Result<&Envelope> {
        Ok(&self.graph()?.filter_envelope)
    }

    /// The filter envelope, for direct scheduling.
    pub fn filter_envelope_mut(&mut self) -> Result<&mut Envelope> {
        Ok(&mut self.graph_mut()?.filter_envelope)
    }

    /// The oscillator pair.
    pub fn oscillators(&self) -> Result<&OscillatorPair> {
        Ok(&self.graph()?.oscillators)
    }

    /// The filter.
    pub fn filter(&self) -> Result<&Filter> {
        Ok(&self.graph()?.filter)
    }

    /// Glide time in seconds.
    pub fn portamento(&self) -> Result<f64> {
        self.graph()?;
        Ok(self.config.portamento)
    }

    /// Output level in dB.
    pub fn volume(&self) -> Result<f32> {
        self.graph()?;
        Ok(self.config.volume)
    }

    /// Snapshot of the current settings.
    pub fn config(&self) -> Result<VoiceConfig> {
        self.graph()?;
        Ok(self.config.clone())
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.graph.is_none()
    }

    /// Tear the voice down.
    ///
    /// Releases the oscillators, filter, amplitude envelope, filter
    /// envelope and finally the frequency signal. Fails with
    /// [`VoiceError::Disposed`] if called twice.
    pub fn dispose(&mut self) -> Result<()> {
        let VoiceGraph {
            frequency,
            oscillators,
            filter,
            envelope,
            filter_envelope,
        } = self.graph.take().ok_or(VoiceError::Disposed)?;

        release("oscillators", oscillators);
        release("filter", filter);
        release("envelope", envelope);
        release("filter_envelope", filter_envelope);
        release("frequency", frequency);
        tracing::debug!("portavox: voice disposed");
        Ok(())
    }

    fn graph(&self) -> Result<&VoiceGraph> {
        self.graph.as_ref().ok_or(VoiceError::Disposed)
    }

    fn graph_mut(&mut self) -> Result<&mut VoiceGraph> {
        self.graph.as_mut().ok_or(VoiceError::Disposed)
    }

    fn clock_time(&self) -> f64 {
        self.clock as f64 / f64::from(self.sample_rate)
    }

    /// Fail on a disposed voice, else default `time` to `now()`.
    fn resolve(&self, time: Option<f64>) -> Result<f64> {
        self.graph()?;
        Ok(time.unwrap_or_else(|| self.clock_time()))
    }
}

fn check_frequency(frequency: f32) -> Result<()> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(())
    } else {
        Err(VoiceError::invalid(
            "frequency",
            frequency,
            "must be a finite frequency > 0 Hz",
        ))
    }
}

fn release<T>(part: &'static str, component: T) {
    drop(component);
    tracing::debug!(part, "portavox: released");
}
