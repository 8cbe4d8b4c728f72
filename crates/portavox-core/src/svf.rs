//! State Variable Filter and its cascaded form.
//!
//! # Topology
//!
//! Implements the Topology-Preserving Transform (TPT) SVF after Zavalishin,
//! "The Art of VA Filter Design" (2012). The trapezoidal integrators keep the
//! filter stable while its cutoff is swept every sample, which is how the
//! synth voice drives it from the filter envelope.
//!
//! # Cascading
//!
//! [`SvfCascade`] chains up to four identical stages to steepen the slope:
//! one stage is -12 dB/oct, two are -24 dB/oct, four are -48 dB/oct. Every
//! stage tracks the same cutoff and the combined Q is divided between them.
//!
//! # Performance
//!
//! [`set_cutoff`](StateVariableFilter::set_cutoff) uses [`fast_tan`] below
//! 10 kHz and falls back to [`libm::tanf`] above, where the Padé
//! approximation loses accuracy.
//!
//! # Reference
//!
//! Zavalishin, "The Art of VA Filter Design", rev. 2.1.2 (2018), Chapters 3-4.

use core::f32::consts::PI;
use libm::tanf;

use crate::Effect;
use crate::fast_math::fast_tan;
use crate::flush_denormal;

/// Lowest cutoff accepted by the filter, in Hz.
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Cutoff ceiling as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.49;

/// Which SVF response is taken as the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SvfResponse {
    /// Passes frequencies below the cutoff.
    #[default]
    Lowpass,
    /// Passes frequencies above the cutoff.
    Highpass,
    /// Passes frequencies near the cutoff.
    Bandpass,
    /// Rejects frequencies near the cutoff.
    Notch,
}

/// State Variable Filter (2-pole, 12 dB/oct).
///
/// ## Parameters
///
/// - `cutoff`: Hz, clamped to 20.0 ..= sr × 0.49 (default 1000.0)
/// - `resonance`: Q, clamped to 0.5 ..= 20.0 (default 0.707)
/// - `response`: which output to use (default `Lowpass`)
///
/// # Example
///
/// ```rust
/// use portavox_core::{Effect, StateVariableFilter, SvfResponse};
///
/// let mut svf = StateVariableFilter::new(48000.0);
/// svf.set_cutoff(1000.0);
/// svf.set_resonance(2.0);
/// svf.set_response(SvfResponse::Bandpass);
///
/// let output = svf.process(0.5);
/// assert!(output.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    ic1eq: f32,
    ic2eq: f32,

    g: f32,
    k: f32,

    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    response: SvfResponse,
}

impl Default for StateVariableFilter {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl StateVariableFilter {
    /// Create a filter at 1000 Hz, Q = 0.707 (Butterworth), lowpass.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            g: 0.0,
            k: 0.0,
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.707,
            response: SvfResponse::Lowpass,
        };
        svf.update_coefficients();
        svf
    }

    /// Set cutoff frequency in Hz. Values are clamped.
    pub fn set_cutoff(&mut self, freq: f32) {
        self.cutoff = freq.clamp(MIN_CUTOFF_HZ, self.sample_rate * MAX_CUTOFF_RATIO);
        self.update_coefficients();
    }

    /// Current cutoff frequency in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance (Q factor). Values are clamped.
    pub fn set_resonance(&mut self, q: f32) {
        self.resonance = q.clamp(0.5, 20.0);
        self.update_coefficients();
    }

    /// Current resonance (Q factor).
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Select the output response.
    pub fn set_response(&mut self, response: SvfResponse) {
        self.response = response;
    }

    /// Current output response.
    pub fn response(&self) -> SvfResponse {
        self.response
    }

    fn update_coefficients(&mut self) {
        let arg = PI * self.cutoff / self.sample_rate;
        self.g = if self.cutoff < 10_000.0 {
            fast_tan(arg)
        } else {
            tanf(arg)
        };
        self.k = 1.0 / self.resonance;
    }

    /// Process one sample and return `(lowpass, highpass, bandpass, notch)`.
    pub fn process_all(&mut self, input: f32) -> (f32, f32, f32, f32) {
        let v3 = input - self.ic2eq;
        let v1 = (self.g * v3 + self.ic1eq) / (1.0 + self.g * (self.g + self.k));
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = flush_denormal(2.0 * v1 - self.ic1eq);
        self.ic2eq = flush_denormal(2.0 * v2 - self.ic2eq);

        let lp = v2;
        let bp = v1;
        let hp = input - self.k * v1 - v2;
        (lp, hp, bp, lp + hp)
    }
}

impl Effect for StateVariableFilter {
    fn process(&mut self, input: f32) -> f32 {
        let (lp, hp, bp, notch) = self.process_all(input);
        match self.response {
            SvfResponse::Lowpass => lp,
            SvfResponse::Highpass => hp,
            SvfResponse::Bandpass => bp,
            SvfResponse::Notch => notch,
        }
    }

    fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set_cutoff(self.cutoff);
    }
}

/// Maximum number of stages in an [`SvfCascade`].
pub const MAX_STAGES: usize = 4;

/// Up to four [`StateVariableFilter`] stages in series.
///
/// All stages share cutoff and response. The combined resonance is divided
/// by the stage count (`Q_stage = Q / stages`, floored at 0.5) to keep the
/// peak from compounding. Inactive stages are kept allocated so the stage
/// count can change without allocating; their state is cleared when they
/// are switched back in.
///
/// ```rust
/// use portavox_core::{Effect, SvfCascade, SvfResponse};
///
/// let mut filter = SvfCascade::new(48000.0, 2);
/// filter.set_cutoff(800.0);
/// filter.set_resonance(4.0);
/// filter.set_response(SvfResponse::Lowpass);
/// assert_eq!(filter.stages(), 2);
/// assert!(filter.process(1.0).is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct SvfCascade {
    stages: [StateVariableFilter; MAX_STAGES],
    active: usize,
    resonance: f32,
    response: SvfResponse,
}

impl Default for SvfCascade {
    fn default() -> Self {
        Self::new(48000.0, 1)
    }
}

impl SvfCascade {
    /// Create a cascade with `stages` active stages (clamped to 1..=4).
    pub fn new(sample_rate: f32, stages: usize) -> Self {
        let mut cascade = Self {
            stages: core::array::from_fn(|_| StateVariableFilter::new(sample_rate)),
            active: stages.clamp(1, MAX_STAGES),
            resonance: 0.707,
            response: SvfResponse::Lowpass,
        };
        cascade.update_resonance();
        cascade
    }

    /// Change the number of active stages (clamped to 1..=4).
    pub fn set_stages(&mut self, stages: usize) {
        let stages = stages.clamp(1, MAX_STAGES);
        for stage in &mut self.stages[self.active.min(stages)..stages] {
            stage.reset();
        }
        self.active = stages;
        self.update_resonance();
    }

    /// Number of active stages.
    pub fn stages(&self) -> usize {
        self.active
    }

    /// Set cutoff frequency in Hz on every stage.
    pub fn set_cutoff(&mut self, freq: f32) {
        for stage in &mut self.stages {
            stage.set_cutoff(freq);
        }
    }

    /// Current (clamped) cutoff frequency in Hz.
    pub fn cutoff(&self) -> f32 {
        self.stages[0].cutoff()
    }

    /// Set the combined resonance (Q factor), clamped to 0.5 ..= 20.0.
    pub fn set_resonance(&mut self, q: f32) {
        self.resonance = q.clamp(0.5, 20.0);
        self.update_resonance();
    }

    /// Combined resonance (Q factor).
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Select the output response on every stage.
    pub fn set_response(&mut self, response: SvfResponse) {
        self.response = response;
        for stage in &mut self.stages {
            stage.set_response(response);
        }
    }

    /// Current output response.
    pub fn response(&self) -> SvfResponse {
        self.response
    }

    fn update_resonance(&mut self) {
        let q_stage = self.resonance / self.active as f32;
        for stage in &mut self.stages {
            stage.set_resonance(q_stage);
        }
    }
}

impl Effect for SvfCascade {
    fn process(&mut self, input: f32) -> f32 {
        self.stages[..self.active]
            .iter_mut()
            .fold(input, |signal, stage| stage.process(signal))
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        for stage in &mut self.stages {
            stage.set_sample_rate(sample_rate);
        }
    }
}
