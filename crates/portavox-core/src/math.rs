//! Level and pitch conversions.
//!
//! All functions are allocation-free and `no_std`.

use libm::{expf, exp2f, logf, powf};

/// Convert decibels to linear gain.
///
/// ```rust
/// use portavox_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs are floored at 1e-10 (-200 dB).
///
/// ```rust
/// use portavox_core::linear_to_db;
///
/// assert!(linear_to_db(1.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) + 6.02).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Frequency ratio for a detune in cents (1200 cents per octave).
///
/// ```rust
/// use portavox_core::cents_to_ratio;
///
/// assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-6);
/// assert_eq!(cents_to_ratio(0.0), 1.0);
/// ```
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    powf(2.0, cents / 1200.0)
}

/// Equal-tempered frequency of a MIDI note number (A4 = 69 = 440 Hz).
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * exp2f((f32::from(note) - 69.0) / 12.0)
}

/// Flush values below 1e-20 to zero.
///
/// Keeps filter feedback paths out of the subnormal range as a signal
/// decays toward silence.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
