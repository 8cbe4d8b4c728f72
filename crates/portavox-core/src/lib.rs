//! Portavox Core - DSP primitives for the portavox synth voice
//!
//! The building blocks a sample-accurate voice needs, with zero allocation in
//! the per-sample path.
//!
//! # Core Abstractions
//!
//! ## Automation
//!
//! - [`ControlSignal`] - Strictly positive scalar driven by scheduled
//!   set/ramp events, evaluated per sample
//! - [`AutomationEvent`] / [`AutomationError`] - Scheduled changes and the
//!   ways scheduling can fail
//!
//! ## Filters
//!
//! - [`StateVariableFilter`] - TPT SVF (lowpass, highpass, bandpass, notch)
//! - [`SvfCascade`] - Up to four SVF stages in series for 12/24/48 dB/oct
//!
//! ## Processing
//!
//! - [`Effect`] - Object-safe per-sample processor trait
//!
//! ## Utilities
//!
//! - [`db_to_linear`], [`linear_to_db`], [`cents_to_ratio`], [`midi_to_freq`],
//!   [`flush_denormal`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature for embedded targets. The automation
//! queue still needs `alloc`.
//!
//! ```toml
//! [dependencies]
//! portavox-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use portavox_core::{ControlSignal, Effect, SvfCascade};
//!
//! let sample_rate = 48000.0;
//! let mut cutoff = ControlSignal::new(200.0).unwrap();
//! cutoff.exponential_ramp_to(4000.0, 0.0, 0.5).unwrap();
//!
//! let mut filter = SvfCascade::new(sample_rate, 2);
//! for n in 0..4800u64 {
//!     let t = n as f64 / f64::from(sample_rate);
//!     cutoff.advance_to(t);
//!     filter.set_cutoff(cutoff.value_at(t));
//!     let _ = filter.process(if n % 100 < 50 { 1.0 } else { -1.0 });
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod automation;
pub mod effect;
pub mod fast_math;
pub mod math;
pub mod svf;

pub use automation::{AutomationError, AutomationEvent, ControlSignal, exponential_interpolate};
pub use effect::Effect;
pub use math::{cents_to_ratio, db_to_linear, flush_denormal, linear_to_db, midi_to_freq};
pub use svf::{MAX_STAGES, StateVariableFilter, SvfCascade, SvfResponse};
