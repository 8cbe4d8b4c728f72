//! Portavox Synth - monophonic synthesizer voice
//!
//! One voice, one note at a time: a detuned oscillator pair through a
//! resonant filter, shaped by an amplitude envelope and a filter envelope,
//! with exponential pitch glide between notes.
//!
//! # Components
//!
//! - [`MonoSynth`] - The voice. Note events schedule changes on its
//!   timelines; [`MonoSynth::render`] evaluates them sample-accurately.
//! - [`OscillatorPair`] / [`Oscillator`] - PolyBLEP unison oscillators
//! - [`Filter`] - Cascaded SVF with additive cutoff modulation
//! - [`Envelope`] - Scheduled ADSR
//! - [`VoiceConfig`] / [`VoiceUpdate`] - Full and partial settings, TOML patches
//!
//! # Example
//!
//! ```rust
//! use portavox_synth::{MonoSynth, VoiceConfig, VoiceUpdate, midi_to_freq};
//!
//! let config = VoiceConfig {
//!     portamento: 0.1,
//!     ..Default::default()
//! };
//! let mut synth = MonoSynth::new(48000.0, config).unwrap();
//!
//! // Two overlapping notes: the second glides from the first.
//! synth.trigger_attack(midi_to_freq(57), Some(0.0)).unwrap();
//! synth.trigger_attack(midi_to_freq(64), Some(0.25)).unwrap();
//! synth.trigger_release(Some(0.5)).unwrap();
//!
//! // Thinner unison from here on.
//! synth.set(&VoiceUpdate { detune: Some(5.0), ..Default::default() }).unwrap();
//!
//! let mut buffer = vec![0.0; 48000];
//! synth.render(&mut buffer).unwrap();
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod oscillator;
pub mod unison;
pub mod voice;

pub use config::{
    EnvelopeConfig, EnvelopeUpdate, FilterConfig, FilterEnvelopeConfig, FilterEnvelopeUpdate,
    FilterUpdate, VoiceConfig, VoiceUpdate,
};
pub use envelope::{
    EXPONENTIAL_FLOOR, Envelope, EnvelopeCurve, EnvelopeStage, Trigger, TriggerKind,
};
pub use error::{Result, VoiceError};
pub use filter::{Filter, FilterType, Rolloff};
pub use oscillator::{Oscillator, OscillatorWaveform};
pub use unison::OscillatorPair;
pub use voice::{INITIAL_FREQUENCY, MonoSynth};

// Re-export commonly used items from portavox-core
pub use portavox_core::{
    AutomationError, AutomationEvent, ControlSignal, cents_to_ratio, db_to_linear, linear_to_db,
    midi_to_freq,
};
