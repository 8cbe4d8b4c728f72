//! Integration tests for portavox-core.
//!
//! Verifies filter frequency responses with sine measurements and checks
//! that automation lands on the expected sample when driven by a per-sample
//! clock.

use portavox_core::{ControlSignal, Effect, StateVariableFilter, SvfCascade, SvfResponse};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

/// Generate a sine wave buffer at the given frequency and sample rate.
fn generate_sine(freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / SAMPLE_RATE))
        .collect()
}

fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

fn to_db(linear: f32) -> f32 {
    20.0 * libm::log10f(linear.max(1e-10))
}

/// Gain in dB of `filter` for a sine at `freq_hz`, measured after warmup.
fn measure_gain<E: Effect>(filter: &mut E, freq_hz: f32) -> f32 {
    filter.reset();
    let input = generate_sine(freq_hz, 8192);
    let output: Vec<f32> = input.iter().map(|&x| filter.process(x)).collect();
    to_db(rms(&output[4096..]) / rms(&input[4096..]))
}

// ============================================================================
// 1. Filter frequency responses
// ============================================================================

#[test]
fn butterworth_lowpass_is_3db_down_at_cutoff() {
    let mut svf = StateVariableFilter::new(SAMPLE_RATE);
    svf.set_cutoff(1000.0);
    svf.set_resonance(core::f32::consts::FRAC_1_SQRT_2);

    let at_cutoff = measure_gain(&mut svf, 1000.0);
    assert!(
        (at_cutoff + 3.0).abs() < 0.5,
        "expected about -3 dB at cutoff, got {at_cutoff:.2} dB"
    );

    let passband = measure_gain(&mut svf, 100.0);
    assert!(passband.abs() < 0.5, "passband gain {passband:.2} dB");
}

#[test]
fn lowpass_rolloff_slopes() {
    // One octave is too close to the knee; measure two octaves apart, well
    // above the cutoff, where each stage contributes about 12 dB/oct.
    for (stages, expected) in [(1usize, 24.0f32), (2, 48.0)] {
        let mut cascade = SvfCascade::new(SAMPLE_RATE, stages);
        cascade.set_cutoff(200.0);
        cascade.set_resonance(0.707 * stages as f32);

        let near = measure_gain(&mut cascade, 1600.0);
        let far = measure_gain(&mut cascade, 6400.0);
        let drop = near - far;
        assert!(
            (drop - expected).abs() < expected * 0.25,
            "{stages} stage(s): expected ~{expected} dB over two octaves, got {drop:.1}"
        );
    }

    let mut two = SvfCascade::new(SAMPLE_RATE, 2);
    let mut four = SvfCascade::new(SAMPLE_RATE, 4);
    for cascade in [&mut two, &mut four] {
        cascade.set_cutoff(500.0);
    }
    let two_db = measure_gain(&mut two, 2000.0);
    let four_db = measure_gain(&mut four, 2000.0);
    assert!(
        four_db < two_db - 12.0,
        "48 dB/oct should beat 24 dB/oct two octaves up: {four_db:.1} vs {two_db:.1}"
    );
}

#[test]
fn resonant_bandpass_peaks_at_cutoff() {
    let mut svf = StateVariableFilter::new(SAMPLE_RATE);
    svf.set_cutoff(2000.0);
    svf.set_resonance(8.0);
    svf.set_response(SvfResponse::Bandpass);

    let peak = measure_gain(&mut svf, 2000.0);
    let below = measure_gain(&mut svf, 500.0);
    let above = measure_gain(&mut svf, 8000.0);
    assert!(peak > below + 12.0, "peak {peak:.1} vs below {below:.1}");
    assert!(peak > above + 12.0, "peak {peak:.1} vs above {above:.1}");
}

#[test]
fn notch_rejects_cutoff() {
    let mut svf = StateVariableFilter::new(SAMPLE_RATE);
    svf.set_cutoff(1000.0);
    svf.set_resonance(2.0);
    svf.set_response(SvfResponse::Notch);

    assert!(measure_gain(&mut svf, 1000.0) < -20.0);
    assert!(measure_gain(&mut svf, 100.0).abs() < 1.0);
}

// ============================================================================
// 2. Sample-accurate automation
// ============================================================================

#[test]
fn set_lands_on_exact_sample() {
    let mut signal = ControlSignal::new(110.0).unwrap();
    // Sample 4800 at 48 kHz is t = 0.1 exactly.
    signal.set_value_at_time(220.0, 0.1).unwrap();

    let mut first_change = None;
    for n in 0..9600u32 {
        let t = f64::from(n) / f64::from(SAMPLE_RATE);
        signal.advance_to(t);
        if signal.value_at(t) == 220.0 && first_change.is_none() {
            first_change = Some(n);
        }
    }
    assert_eq!(first_change, Some(4800));
}

#[test]
fn sweeping_cutoff_from_timeline_stays_finite() {
    let mut cutoff = ControlSignal::new(50.0).unwrap();
    cutoff.exponential_ramp_to(18_000.0, 0.0, 0.05).unwrap();
    cutoff.exponential_ramp_to(50.0, 0.05, 0.1).unwrap();

    let mut filter = SvfCascade::new(SAMPLE_RATE, 4);
    filter.set_resonance(18.0);
    let input = generate_sine(330.0, 4800);

    for (n, &x) in input.iter().enumerate() {
        let t = n as f64 / f64::from(SAMPLE_RATE);
        cutoff.advance_to(t);
        filter.set_cutoff(cutoff.value_at(t));
        let y = filter.process(x);
        assert!(y.is_finite(), "non-finite at sample {n}");
    }
}
