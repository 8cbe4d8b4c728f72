//! Sample-accurate parameter automation.
//!
//! A [`ControlSignal`] is a strictly positive scalar (typically a frequency in
//! Hz) whose future is described by a queue of timestamped
//! [`AutomationEvent`]s. Callers schedule events ahead of time; the render
//! loop asks for the value in effect at each sample's timestamp and commits
//! events as time passes.
//!
//! ## Timeline semantics
//!
//! - Events are consumed in timestamp order, whatever order they were
//!   scheduled in. Events sharing a timestamp apply in the order they were
//!   scheduled, so the last `SetValue` wins.
//! - A ramp starts from whatever value is in effect at its own start time,
//!   including a value set at that same instant by an earlier call.
//! - A `Hold` freezes whatever value is in effect at its timestamp. The
//!   value is resolved when events are folded, not when the hold is
//!   scheduled, so events inserted before it later are taken into account.
//!   Portamento schedules a hold and a ramp at the same instant.
//! - An event timestamped before the last committed sample takes effect at
//!   the next committed sample.
//!
//! ## Exponential ramps
//!
//! ```text
//!   value
//!     to ┤                 ╭──────
//!        │              ╭──╯
//!        │          ╭───╯
//!   from ┤──────────╯
//!        └──────────┬──────┬──────→ time
//!                 start   end
//! ```
//!
//! `v(t) = from · (to / from)^((t - start) / (end - start))`, evaluated in
//! `f64` and clamped into `[min(from, to), max(from, to)]` so rounding can
//! never overshoot. At and after `end` the exact target is returned.
//!
//! # Example
//!
//! ```rust
//! use portavox_core::ControlSignal;
//!
//! let mut freq = ControlSignal::new(220.0).unwrap();
//! freq.set_value_at_time(220.0, 1.0).unwrap();
//! freq.exponential_ramp_to(440.0, 1.0, 2.0).unwrap();
//!
//! assert_eq!(freq.value_at(1.0), 220.0);
//! assert!((freq.value_at(1.5) - 311.127).abs() < 0.01);
//! assert_eq!(freq.value_at(2.0), 440.0);
//! ```

use alloc::collections::VecDeque;
use core::fmt;

/// A change scheduled on a [`ControlSignal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationEvent {
    /// Jump to `value` exactly at `time`.
    SetValue {
        /// Timestamp in seconds.
        time: f64,
        /// New value.
        value: f32,
    },
    /// Exponential ramp from the value in effect at `start` to `target`,
    /// reached exactly at `end`.
    ExponentialRamp {
        /// Ramp start in seconds.
        start: f64,
        /// Ramp end in seconds (strictly after `start`).
        end: f64,
        /// Value reached at `end`.
        target: f32,
    },
    /// Stop any ramp in progress and keep the value in effect at `time`.
    Hold {
        /// Timestamp in seconds.
        time: f64,
    },
}

impl AutomationEvent {
    /// Timestamp at which the event takes effect.
    pub fn time(&self) -> f64 {
        match *self {
            Self::SetValue { time, .. } => time,
            Self::ExponentialRamp { start, .. } => start,
            Self::Hold { time } => time,
        }
    }
}

/// Errors raised while scheduling automation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutomationError {
    /// Value is zero or negative; exponential automation needs `> 0`.
    NonPositiveValue(f32),
    /// Value is NaN or infinite.
    NonFiniteValue(f32),
    /// Timestamp is NaN or infinite.
    NonFiniteTime(f64),
    /// Ramp end does not lie after its start.
    EmptyRamp {
        /// Ramp start.
        start: f64,
        /// Ramp end.
        end: f64,
    },
}

impl fmt::Display for AutomationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveValue(v) => write!(f, "automation value must be positive, got {v}"),
            Self::NonFiniteValue(v) => write!(f, "automation value must be finite, got {v}"),
            Self::NonFiniteTime(t) => write!(f, "automation time must be finite, got {t}"),
            Self::EmptyRamp { start, end } => {
                write!(f, "ramp end {end}s must lie after its start {start}s")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AutomationError {}

/// Exponential interpolation between two positive values.
///
/// Returns `from` at or before `start` and exactly `to` at or after `end`.
/// Both endpoints must be `> 0`.
#[inline]
pub fn exponential_interpolate(from: f32, to: f32, start: f64, end: f64, time: f64) -> f32 {
    if time <= start {
        return from;
    }
    if time >= end {
        return to;
    }
    let progress = (time - start) / (end - start);
    let value = f64::from(from) * libm::pow(f64::from(to) / f64::from(from), progress);
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    (value as f32).clamp(lo, hi)
}

/// The trajectory in effect after the last committed event.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    Hold(f32),
    Exponential {
        start: f64,
        end: f64,
        from: f32,
        to: f32,
    },
}

impl Segment {
    #[inline]
    fn value_at(self, time: f64) -> f32 {
        match self {
            Self::Hold(value) => value,
            Self::Exponential {
                start,
                end,
                from,
                to,
            } => exponential_interpolate(from, to, start, end, time),
        }
    }

    /// The segment that results from applying `event` on top of `self`.
    #[inline]
    fn then(self, event: &AutomationEvent) -> Self {
        match *event {
            AutomationEvent::SetValue { value, .. } => Self::Hold(value),
            AutomationEvent::ExponentialRamp { start, end, target } => Self::Exponential {
                start,
                end,
                from: self.value_at(start),
                to: target,
            },
            AutomationEvent::Hold { time } => Self::Hold(self.value_at(time)),
        }
    }
}

/// Automatable scalar with a queue of scheduled events.
///
/// The signal's domain is strictly positive. Every value that enters the
/// timeline is checked, so ramps are always between positive endpoints.
///
/// Queries must move forward in time once [`advance_to`](Self::advance_to)
/// has committed events: the committed part of the timeline is collapsed
/// into a single segment and earlier history is gone.
#[derive(Debug, Clone)]
pub struct ControlSignal {
    committed: Segment,
    events: VecDeque<AutomationEvent>,
    latest: f64,
}

impl ControlSignal {
    /// Create a signal holding `initial`.
    pub fn new(initial: f32) -> Result<Self, AutomationError> {
        check_value(initial)?;
        Ok(Self {
            committed: Segment::Hold(initial),
            events: VecDeque::new(),
            latest: f64::NEG_INFINITY,
        })
    }

    /// Schedule a discontinuous jump to `value` at `time`.
    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> Result<(), AutomationError> {
        check_value(value)?;
        check_time(time)?;
        #[cfg(feature = "tracing")]
        tracing::trace!(time, value, "automation: set value");
        self.push(AutomationEvent::SetValue { time, value });
        Ok(())
    }

    /// Schedule a hold of the value in effect at `time`.
    ///
    /// The held value is whatever the timeline yields at `time` once every
    /// event before it is applied, including events scheduled after this call.
    pub fn hold_at_time(&mut self, time: f64) -> Result<(), AutomationError> {
        check_time(time)?;
        #[cfg(feature = "tracing")]
        tracing::trace!(time, "automation: hold");
        self.push(AutomationEvent::Hold { time });
        Ok(())
    }

    /// Schedule an exponential ramp to `target`, running from `start` to `end`.
    ///
    /// The ramp begins at whatever value is in effect at `start`. A ramp
    /// with `end <= start` is rejected: use
    /// [`set_value_at_time`](Self::set_value_at_time) for jumps.
    pub fn exponential_ramp_to(
        &mut self,
        target: f32,
        start: f64,
        end: f64,
    ) -> Result<(), AutomationError> {
        check_value(target)?;
        check_time(start)?;
        check_time(end)?;
        if end <= start {
            return Err(AutomationError::EmptyRamp { start, end });
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(start, end, target, "automation: exponential ramp");
        self.push(AutomationEvent::ExponentialRamp { start, end, target });
        Ok(())
    }

    /// Value in effect at `time`.
    pub fn value_at(&self, time: f64) -> f32 {
        self.events
            .iter()
            .take_while(|event| event.time() <= time)
            .fold(self.committed, |segment, event| segment.then(event))
            .value_at(time)
    }

    /// Commit every event scheduled at or before `time`.
    ///
    /// Allocation-free; called once per rendered sample.
    #[inline]
    pub fn advance_to(&mut self, time: f64) {
        while let Some(&event) = self.events.front() {
            if event.time() > time {
                break;
            }
            self.events.pop_front();
            self.committed = self.committed.then(&event);
        }
    }

    /// Number of events not yet committed.
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Pending events in timestamp order.
    pub fn events(&self) -> impl Iterator<Item = &AutomationEvent> {
        self.events.iter()
    }

    /// Timestamp of the latest event ever scheduled, if any.
    pub fn latest_time(&self) -> Option<f64> {
        self.latest.is_finite().then_some(self.latest)
    }

    /// Insert after every event at or before its timestamp, keeping the
    /// queue sorted and same-instant events in call order.
    fn push(&mut self, event: AutomationEvent) {
        let time = event.time();
        self.latest = self.latest.max(time);
        let index = self.events.partition_point(|e| e.time() <= time);
        self.events.insert(index, event);
    }
}

fn check_time(time: f64) -> Result<(), AutomationError> {
    if time.is_finite() {
        Ok(())
    } else {
        Err(AutomationError::NonFiniteTime(time))
    }
}

fn check_value(value: f32) -> Result<(), AutomationError> {
    if !value.is_finite() {
        return Err(AutomationError::NonFiniteValue(value));
    }
    if value <= 0.0 {
        return Err(AutomationError::NonPositiveValue(value));
    }
    Ok(())
}
