//! Scheduled ADSR envelope.
//!
//! Unlike a free-running gate-driven generator, this envelope is a timeline:
//! triggers are scheduled at absolute timestamps and the output at any time
//! is a pure function of the triggers up to that time. The render loop reads
//! [`Envelope::value_at`] once per sample and calls
//! [`Envelope::advance_to`] to retire triggers that are in the past.
//!
//! ```text
//!  level
//!  peak ┤   ╱╲
//!       │  ╱  ╲______________ sustain · peak
//!       │ ╱                  ╲
//!     0 ┤╱                    ╲_____
//!       └─┬───┬──────────────┬──────┬──→ time
//!       attack decay         release idle
//! ```
//!
//! Every trigger starts from the level in effect at its own timestamp, so a
//! retrigger mid-stage continues from the current output instead of jumping
//! to zero. Each trigger snapshots the ADSR settings at the moment it is
//! scheduled; changing a setting affects later triggers only.
//!
//! Exponential curves are evaluated on the normalized level with a -80 dB
//! floor ([`EXPONENTIAL_FLOOR`]), so attacks from silence and releases to
//! silence stay well defined. A release lands on exactly 0 at its end.

use std::collections::VecDeque;

use portavox_core::exponential_interpolate;

use crate::config::EnvelopeConfig;
use crate::error::{Result, VoiceError};

/// Lowest level an exponential curve passes through (-80 dB).
pub const EXPONENTIAL_FLOOR: f32 = 1e-4;

/// Envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Resting; output is `min`.
    #[default]
    Idle,
    /// Rising toward the peak.
    Attack,
    /// Falling from the peak toward the sustain level.
    Decay,
    /// Holding the sustain level until released.
    Sustain,
    /// Falling toward zero.
    Release,
}

/// Curve shape of a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeCurve {
    /// Straight-line segments; used for amplitude.
    Linear,
    /// Constant-ratio segments; used for frequency-domain targets.
    Exponential,
}

/// A trigger scheduled on an [`Envelope`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trigger {
    /// Timestamp in seconds.
    pub time: f64,
    /// Attack or release.
    pub kind: TriggerKind,
    /// Curve shape of every stage the trigger starts.
    pub curve: EnvelopeCurve,
    /// Settings in effect when the trigger was scheduled.
    pub adsr: EnvelopeConfig,
}

/// What a [`Trigger`] starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerKind {
    /// Attack to `velocity`, then decay to `sustain · velocity`.
    Attack {
        /// Peak level in [0, 1].
        velocity: f32,
    },
    /// Release to zero.
    Release,
}

/// Trajectory started by the most recent committed trigger.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Segment {
    Idle,
    Attack {
        start: f64,
        from: f32,
        peak: f32,
        sustain: f32,
        attack: f64,
        decay: f64,
        curve: EnvelopeCurve,
    },
    Release {
        start: f64,
        from: f32,
        release: f64,
        curve: EnvelopeCurve,
    },
}

impl Segment {
    fn sample(self, time: f64) -> (EnvelopeStage, f32) {
        match self {
            Segment::Idle => (EnvelopeStage::Idle, 0.0),
            Segment::Attack {
                start,
                from,
                peak,
                sustain,
                attack,
                decay,
                curve,
            } => {
                let elapsed = time - start;
                if elapsed < attack {
                    (
                        EnvelopeStage::Attack,
                        interpolate(curve, from, peak, elapsed / attack),
                    )
                } else if elapsed - attack < decay {
                    let progress = (elapsed - attack) / decay;
                    (
                        EnvelopeStage::Decay,
                        interpolate(curve, peak, sustain, progress),
                    )
                } else {
                    (EnvelopeStage::Sustain, sustain)
                }
            }
            Segment::Release {
                start,
                from,
                release,
                curve,
            } => {
                let elapsed = time - start;
                if elapsed < release {
                    (
                        EnvelopeStage::Release,
                        interpolate(curve, from, 0.0, elapsed / release),
                    )
                } else {
                    (EnvelopeStage::Idle, 0.0)
                }
            }
        }
    }

    fn then(self, trigger: &Trigger) -> Self {
        let (stage, level) = self.sample(trigger.time);
        match trigger.kind {
            TriggerKind::Attack { velocity } => Segment::Attack {
                start: trigger.time,
                from: level,
                peak: velocity,
                sustain: trigger.adsr.sustain * velocity,
                attack: trigger.adsr.attack,
                decay: trigger.adsr.decay,
                curve: trigger.curve,
            },
            // Releasing a silent envelope leaves it resting.
            TriggerKind::Release if stage == EnvelopeStage::Idle => Segment::Idle,
            TriggerKind::Release => Segment::Release {
                start: trigger.time,
                from: level,
                release: trigger.adsr.release,
                curve: trigger.curve,
            },
        }
    }
}

/// Interpolate from `from` to `to` at `progress` in [0, 1].
fn interpolate(curve: EnvelopeCurve, from: f32, to: f32, progress: f64) -> f32 {
    if progress <= 0.0 || from == to {
        return from;
    }
    if progress >= 1.0 {
        return to;
    }
    match curve {
        EnvelopeCurve::Linear => from + (to - from) * progress as f32,
        EnvelopeCurve::Exponential => {
            // The floor must not lift a stage past its own endpoints.
            let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
            exponential_interpolate(
                from.max(EXPONENTIAL_FLOOR),
                to.max(EXPONENTIAL_FLOOR),
                0.0,
                1.0,
                progress,
            )
            .clamp(lo, hi)
        }
    }
}

/// Four-stage envelope driven by scheduled triggers.
///
/// The normalized level in [0, 1] is mapped to the output range
/// `[min, max]`; amplitude envelopes use `[0, 1]`, the filter envelope maps
/// into a frequency range.
///
/// # Example
///
/// ```rust
/// use portavox_synth::{Envelope, EnvelopeConfig, EnvelopeStage};
///
/// let adsr = EnvelopeConfig { attack: 0.01, decay: 0.1, sustain: 0.5, release: 0.2 };
/// let mut env = Envelope::new(adsr, 0.0, 1.0).unwrap();
/// env.trigger_attack(0.0, 1.0).unwrap();
/// env.trigger_release(1.0).unwrap();
///
/// assert_eq!(env.state_at(0.05), EnvelopeStage::Decay);
/// assert_eq!(env.level_at(0.5), 0.5);
/// assert_eq!(env.level_at(1.5), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Envelope {
    adsr: EnvelopeConfig,
    min: f32,
    max: f32,
    committed: Segment,
    triggers: VecDeque<Trigger>,
}

impl Envelope {
    /// Create an idle envelope with output range `[min, max]`.
    pub fn new(adsr: EnvelopeConfig, min: f32, max: f32) -> Result<Self> {
        adsr.validate("envelope")?;
        validate_range(min, max)?;
        Ok(Self {
            adsr,
            min,
            max,
            committed: Segment::Idle,
            triggers: VecDeque::new(),
        })
    }

    /// Settings applied to triggers scheduled from now on.
    pub fn adsr(&self) -> EnvelopeConfig {
        self.adsr
    }

    /// Replace all four settings at once.
    pub fn set_adsr(&mut self, adsr: EnvelopeConfig) -> Result<()> {
        adsr.validate("envelope")?;
        self.adsr = adsr;
        Ok(())
    }

    /// Attack duration in seconds.
    pub fn attack(&self) -> f64 {
        self.adsr.attack
    }

    /// Set attack duration in seconds (finite, >= 0).
    pub fn set_attack(&mut self, seconds: f64) -> Result<()> {
        self.set_adsr(EnvelopeConfig {
            attack: seconds,
            ..self.adsr
        })
    }

    /// Decay duration in seconds.
    pub fn decay(&self) -> f64 {
        self.adsr.decay
    }

    /// Set decay duration in seconds (finite, >= 0).
    pub fn set_decay(&mut self, seconds: f64) -> Result<()> {
        self.set_adsr(EnvelopeConfig {
            decay: seconds,
            ..self.adsr
        })
    }

    /// Sustain level in [0, 1].
    pub fn sustain(&self) -> f32 {
        self.adsr.sustain
    }

    /// Set sustain level in [0, 1].
    pub fn set_sustain(&mut self, level: f32) -> Result<()> {
        self.set_adsr(EnvelopeConfig {
            sustain: level,
            ..self.adsr
        })
    }

    /// Release duration in seconds.
    pub fn release(&self) -> f64 {
        self.adsr.release
    }

    /// Set release duration in seconds (finite, >= 0).
    pub fn set_release(&mut self, seconds: f64) -> Result<()> {
        self.set_adsr(EnvelopeConfig {
            release: seconds,
            ..self.adsr
        })
    }

    /// Output range `(min, max)`.
    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    /// Set the output range. Requires `0 <= min <= max`, both finite.
    ///
    /// The range applies to the output at every time, including triggers
    /// already scheduled.
    pub fn set_range(&mut self, min: f32, max: f32) -> Result<()> {
        validate_range(min, max)?;
        self.min = min;
        self.max = max;
        Ok(())
    }

    /// Schedule a linear attack at `time` peaking at `velocity`.
    pub fn trigger_attack(&mut self, time: f64, velocity: f32) -> Result<()> {
        self.schedule_attack(time, velocity, EnvelopeCurve::Linear)
    }

    /// Schedule an exponential attack at `time` peaking at `velocity`.
    pub fn trigger_exponential_attack(&mut self, time: f64, velocity: f32) -> Result<()> {
        self.schedule_attack(time, velocity, EnvelopeCurve::Exponential)
    }

    /// Schedule a linear release at `time`.
    pub fn trigger_release(&mut self, time: f64) -> Result<()> {
        self.schedule(time, TriggerKind::Release, EnvelopeCurve::Linear)
    }

    /// Schedule an exponential release at `time`.
    pub fn trigger_exponential_release(&mut self, time: f64) -> Result<()> {
        self.schedule(time, TriggerKind::Release, EnvelopeCurve::Exponential)
    }

    /// Normalized level in [0, 1] at `time`.
    pub fn level_at(&self, time: f64) -> f32 {
        self.segment_at(time).sample(time).1
    }

    /// Output at `time`, mapped into `[min, max]`.
    #[inline]
    pub fn value_at(&self, time: f64) -> f32 {
        self.min + (self.max - self.min) * self.level_at(time)
    }

    /// Stage at `time`.
    pub fn state_at(&self, time: f64) -> EnvelopeStage {
        self.segment_at(time).sample(time).0
    }

    /// Commit every trigger at or before `time`.
    #[inline]
    pub fn advance_to(&mut self, time: f64) {
        while let Some(&trigger) = self.triggers.front() {
            if trigger.time > time {
                break;
            }
            self.triggers.pop_front();
            self.committed = self.committed.then(&trigger);
        }
    }

    /// Triggers not yet committed.
    pub fn pending(&self) -> usize {
        self.triggers.len()
    }

    /// Pending triggers in timestamp order.
    pub fn triggers(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    /// Check a trigger before scheduling it.
    pub(crate) fn check_trigger(time: f64, velocity: f32) -> Result<()> {
        if !time.is_finite() {
            return Err(VoiceError::invalid("time", time, "must be finite"));
        }
        if !(0.0..=1.0).contains(&velocity) {
            return Err(VoiceError::invalid(
                "velocity",
                velocity,
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }

    fn schedule_attack(&mut self, time: f64, velocity: f32, curve: EnvelopeCurve) -> Result<()> {
        Self::check_trigger(time, velocity)?;
        self.schedule(time, TriggerKind::Attack { velocity }, curve)
    }

    fn schedule(&mut self, time: f64, kind: TriggerKind, curve: EnvelopeCurve) -> Result<()> {
        Self::check_trigger(time, 1.0)?;
        tracing::trace!(time, ?kind, ?curve, "envelope: trigger");
        let trigger = Trigger {
            time,
            kind,
            curve,
            adsr: self.adsr,
        };
        let index = self.triggers.partition_point(|t| t.time <= time);
        self.triggers.insert(index, trigger);
        Ok(())
    }

    fn segment_at(&self, time: f64) -> Segment {
        self.triggers
            .iter()
            .take_while(|trigger| trigger.time <= time)
            .fold(self.committed, |segment, trigger| segment.then(trigger))
    }
}

fn validate_range(min: f32, max: f32) -> Result<()> {
    if !min.is_finite() || min < 0.0 {
        return Err(VoiceError::invalid("min", min, "must be finite and >= 0"));
    }
    if !max.is_finite() || max < min {
        return Err(VoiceError::invalid("max", max, "must be finite and >= min"));
    }
    Ok(())
}
