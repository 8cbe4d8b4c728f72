//! Error types for voice construction, scheduling and patch loading.

use std::path::PathBuf;

use portavox_core::AutomationError;
use thiserror::Error;

/// Errors raised by the voice and its components.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// A numeric parameter is outside its accepted range.
    #[error("invalid {param}: {value} ({reason})")]
    InvalidParameter {
        /// Dotted parameter path, e.g. `filter_envelope.sustain`.
        param: String,
        /// Rejected value.
        value: f64,
        /// What the parameter accepts.
        reason: &'static str,
    },

    /// Oscillator type name not recognized
    #[error("unknown oscillator type '{0}' (expected sine, square, sawtooth or triangle)")]
    UnknownWaveform(String),

    /// Filter type name not recognized
    #[error("unknown filter type '{0}' (expected lowpass, highpass, bandpass or notch)")]
    UnknownFilterType(String),

    /// Filter slope is not one of the supported cascades
    #[error("unsupported filter rolloff {0} dB/oct (expected -12, -24 or -48)")]
    UnsupportedRolloff(i32),

    /// The voice was disposed and can no longer be used.
    #[error("voice has been disposed")]
    Disposed,

    /// A scheduled event was rejected by a timeline.
    #[error("scheduling failed: {0}")]
    Automation(#[from] AutomationError),

    /// Failed to read a patch file
    #[error("failed to read patch '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a TOML patch
    #[error("failed to parse patch: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Failed to serialize a patch to TOML
    #[error("failed to serialize patch: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

impl VoiceError {
    /// Create an invalid parameter error.
    pub fn invalid(param: impl Into<String>, value: impl Into<f64>, reason: &'static str) -> Self {
        VoiceError::InvalidParameter {
            param: param.into(),
            value: value.into(),
            reason,
        }
    }

    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VoiceError::ReadFile {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VoiceError>;
