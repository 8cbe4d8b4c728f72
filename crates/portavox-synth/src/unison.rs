//! Two-oscillator unison.

use crate::oscillator::{Oscillator, OscillatorWaveform};

/// A pair of oscillators tracking the same frequency, the second detuned.
///
/// Both share one waveform. Output is the average of the two so a unison at
/// zero detune has the same level as a single oscillator.
///
/// ```rust
/// use portavox_synth::{OscillatorPair, OscillatorWaveform};
///
/// let mut pair = OscillatorPair::new(48000.0, OscillatorWaveform::Sawtooth, 20.0);
/// pair.set_detune(7.0);
/// assert_eq!(pair.primary().detune(), 0.0);
/// assert_eq!(pair.secondary().detune(), 7.0);
/// assert!(pair.process(110.0).abs() <= 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct OscillatorPair {
    primary: Oscillator,
    secondary: Oscillator,
}

impl OscillatorPair {
    /// Create a pair; `detune` (cents) applies to the second oscillator.
    pub fn new(sample_rate: f32, waveform: OscillatorWaveform, detune: f32) -> Self {
        let mut pair = Self {
            primary: Oscillator::new(sample_rate),
            secondary: Oscillator::new(sample_rate),
        };
        pair.set_waveform(waveform);
        pair.set_detune(detune);
        pair
    }

    /// Set the waveform of both oscillators.
    pub fn set_waveform(&mut self, waveform: OscillatorWaveform) {
        self.primary.set_waveform(waveform);
        self.secondary.set_waveform(waveform);
    }

    /// Shared waveform.
    pub fn waveform(&self) -> OscillatorWaveform {
        self.primary.waveform()
    }

    /// Detune the second oscillator in cents. The first stays at unity.
    pub fn set_detune(&mut self, cents: f32) {
        self.secondary.set_detune(cents);
    }

    /// Detune of the second oscillator in cents.
    pub fn detune(&self) -> f32 {
        self.secondary.detune()
    }

    /// The undetuned oscillator.
    pub fn primary(&self) -> &Oscillator {
        &self.primary
    }

    /// The detuned oscillator.
    pub fn secondary(&self) -> &Oscillator {
        &self.secondary
    }

    /// Next sample of the pair for a tracked frequency of `frequency` Hz.
    #[inline]
    pub fn process(&mut self, frequency: f32) -> f32 {
        (self.primary.process(frequency) + self.secondary.process(frequency)) * 0.5
    }

    /// Reset both oscillators' phase.
    pub fn reset(&mut self) {
        self.primary.reset();
        self.secondary.reset();
    }
}
