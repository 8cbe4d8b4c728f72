//! Integration tests for portavox-synth.
//!
//! Scenarios drive a whole voice through its public API: glide timing,
//! envelope timing, retriggering, partial updates and disposal.

use portavox_synth::{
    EnvelopeStage, INITIAL_FREQUENCY, MonoSynth, OscillatorWaveform, VoiceConfig, VoiceError,
    VoiceUpdate,
};

const SR: f32 = 48000.0;

fn default_synth() -> MonoSynth {
    MonoSynth::new(SR, VoiceConfig::default()).unwrap()
}

fn render_seconds(synth: &mut MonoSynth, seconds: f64) -> Vec<f32> {
    let mut buffer = vec![0.0; (seconds * f64::from(SR)).round() as usize];
    synth.render(&mut buffer).unwrap();
    buffer
}

// ---------------------------------------------------------------------------
// 1. Default voice timing
// ---------------------------------------------------------------------------

#[test]
fn default_voice_attack_and_release_timing() {
    let mut synth = default_synth();
    synth.trigger_attack(440.0, Some(0.0)).unwrap();
    synth.trigger_release(Some(2.0)).unwrap();

    let frequency = synth.frequency().unwrap();
    assert_eq!(frequency.value_at(0.0), INITIAL_FREQUENCY);
    assert_eq!(frequency.value_at(0.05), 440.0);

    let envelope = synth.envelope().unwrap();
    assert_eq!(envelope.level_at(0.0), 0.0);
    assert_eq!(envelope.level_at(0.005), 1.0);
    assert!((envelope.level_at(0.105) - 0.9).abs() < 1e-5);
    assert_eq!(envelope.state_at(1.0), EnvelopeStage::Sustain);
    assert!((envelope.level_at(2.5) - 0.45).abs() < 1e-5);
    assert_eq!(envelope.level_at(3.0), 0.0);
    assert_eq!(envelope.state_at(3.0), EnvelopeStage::Idle);
}

#[test]
fn filter_envelope_spans_its_range() {
    let mut synth = default_synth();
    synth.trigger_attack(440.0, Some(0.0)).unwrap();
    synth.trigger_release(Some(1.0)).unwrap();

    let filter_envelope = synth.filter_envelope().unwrap();
    assert_eq!(filter_envelope.value_at(0.0), 10.0);
    assert_eq!(filter_envelope.value_at(0.06), 4000.0);
    // Exponential decay toward sustain passes below the linear midpoint.
    let mid_decay = filter_envelope.value_at(0.16);
    assert!(mid_decay < 10.0 + 3990.0 * 0.75, "got {mid_decay}");
    assert_eq!(filter_envelope.value_at(3.0), 10.0);
}

#[test]
fn velocity_scales_amplitude_only() {
    let mut synth = default_synth();
    synth
        .trigger_attack_with_velocity(440.0, Some(0.0), 0.5)
        .unwrap();

    let envelope = synth.envelope().unwrap();
    assert_eq!(envelope.level_at(0.005), 0.5);
    assert!((envelope.level_at(1.0) - 0.45).abs() < 1e-6);
    assert_eq!(synth.filter_envelope().unwrap().value_at(0.06), 4000.0);
}

// ---------------------------------------------------------------------------
// 2. Portamento
// ---------------------------------------------------------------------------

#[test]
fn glide_is_monotonic_and_lands_exactly() {
    let mut synth = default_synth();
    synth.trigger_attack(220.0, Some(0.0)).unwrap();
    synth.trigger_attack(440.0, Some(1.0)).unwrap();

    let frequency = synth.frequency().unwrap();
    assert_eq!(frequency.value_at(1.0), 220.0);
    assert_eq!(frequency.value_at(1.05), 440.0);

    let mut previous = frequency.value_at(1.0);
    for i in 1..=100 {
        let value = frequency.value_at(1.0 + 0.05 * f64::from(i) / 100.0);
        assert!(value >= previous, "glide went backwards at step {i}");
        assert!(value <= 440.0, "glide overshot at step {i}: {value}");
        previous = value;
    }
}

#[test]
fn glide_midpoint_is_geometric() {
    let mut synth = default_synth();
    synth.set_portamento(1.0).unwrap();
    synth.trigger_attack(100.0, Some(0.0)).unwrap();
    synth.trigger_attack(400.0, Some(1.0)).unwrap();

    let mid = synth.frequency().unwrap().value_at(1.5);
    assert!((mid - 200.0).abs() < 0.01, "got {mid}");
}

#[test]
fn zero_portamento_jumps_on_the_exact_sample() {
    let config = VoiceConfig {
        portamento: 0.0,
        ..Default::default()
    };
    let mut synth = MonoSynth::new(SR, config).unwrap();
    synth.trigger_attack(220.0, Some(5.0)).unwrap();
    assert_eq!(synth.frequency().unwrap().pending(), 1);

    // 239_999 samples leave the clock one sample short of t = 5.
    let mut buffer = vec![0.0; 239_999];
    synth.render(&mut buffer).unwrap();
    assert_eq!(synth.current_frequency().unwrap(), INITIAL_FREQUENCY);

    synth.process().unwrap();
    assert_eq!(synth.now().unwrap(), 5.0);
    assert_eq!(synth.current_frequency().unwrap(), 220.0);
}

#[test]
fn retrigger_during_glide_starts_from_current_pitch() {
    let mut synth = default_synth();
    synth.set_portamento(1.0).unwrap();
    synth.trigger_attack(100.0, Some(0.0)).unwrap();
    synth.trigger_attack(400.0, Some(1.0)).unwrap();
    synth.trigger_attack(100.0, Some(1.5)).unwrap();

    let frequency = synth.frequency().unwrap();
    let at_retrigger = frequency.value_at(1.5);
    assert!((at_retrigger - 200.0).abs() < 0.01);
    assert!(frequency.value_at(1.75) < at_retrigger);
    assert_eq!(frequency.value_at(2.5), 100.0);
}

#[test]
fn attack_order_does_not_change_glide() {
    let mut forward = default_synth();
    forward.trigger_attack(220.0, Some(0.0)).unwrap();
    forward.trigger_attack(330.0, Some(1.0)).unwrap();

    let mut backward = default_synth();
    backward.trigger_attack(330.0, Some(1.0)).unwrap();
    backward.trigger_attack(220.0, Some(0.0)).unwrap();

    for synth in [&forward, &backward] {
        let frequency = synth.frequency().unwrap();
        assert_eq!(frequency.value_at(0.999), 220.0);
        assert_eq!(frequency.value_at(1.0), 220.0);
        assert!(frequency.value_at(1.025) > 220.0);
        assert_eq!(frequency.value_at(1.05), 330.0);
    }

    let a = render_seconds(&mut forward, 1.2);
    let b = render_seconds(&mut backward, 1.2);
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// 3. Envelope retrigger and release
// ---------------------------------------------------------------------------

#[test]
fn retrigger_mid_decay_continues_from_current_level() {
    let mut synth = default_synth();
    synth.trigger_attack(440.0, Some(0.0)).unwrap();
    synth.trigger_attack(330.0, Some(0.05)).unwrap();

    let envelope = synth.envelope().unwrap();
    let at_retrigger = envelope.level_at(0.05);
    assert!((at_retrigger - 0.955).abs() < 1e-4, "got {at_retrigger}");
    assert_eq!(envelope.state_at(0.0501), EnvelopeStage::Attack);
    assert!(envelope.level_at(0.0501) >= at_retrigger);
    assert!((envelope.level_at(0.055) - 1.0).abs() < 1e-5);
}

#[test]
fn release_leaves_pitch_alone() {
    let mut synth = default_synth();
    synth.trigger_attack(330.0, Some(0.0)).unwrap();
    synth.trigger_release(Some(0.5)).unwrap();

    let frequency = synth.frequency().unwrap();
    assert_eq!(frequency.pending(), 2);
    assert_eq!(frequency.value_at(0.6), 330.0);
    assert_eq!(frequency.value_at(10.0), 330.0);
    assert_eq!(synth.envelope().unwrap().level_at(1.5), 0.0);
}

#[test]
fn scheduling_order_does_not_matter() {
    let mut forward = default_synth();
    forward.trigger_attack(330.0, Some(0.0)).unwrap();
    forward.trigger_release(Some(0.3)).unwrap();

    let mut backward = default_synth();
    backward.trigger_release(Some(0.3)).unwrap();
    backward.trigger_attack(330.0, Some(0.0)).unwrap();

    let a = render_seconds(&mut forward, 1.5);
    let b = render_seconds(&mut backward, 1.5);
    assert_eq!(a, b);
}

#[test]
fn released_voice_falls_silent() {
    let mut synth = default_synth();
    synth.trigger_attack(220.0, Some(0.0)).unwrap();
    synth.trigger_release(Some(0.5)).unwrap();

    let output = render_seconds(&mut synth, 2.0);
    let sounding = &output[..24000];
    let tail = &output[(1.6 * f64::from(SR)) as usize..];

    assert!(output.iter().all(|s| s.is_finite()));
    assert!(sounding.iter().any(|s| s.abs() > 0.05));
    assert!(tail.iter().all(|&s| s == 0.0));
}

#[test]
fn silent_before_first_note() {
    let mut synth = default_synth();
    let output = render_seconds(&mut synth, 0.1);
    assert!(output.iter().all(|&s| s == 0.0));
}

// ---------------------------------------------------------------------------
// 4. Parameter updates
// ---------------------------------------------------------------------------

#[test]
fn detune_update_touches_second_oscillator_only() {
    let mut synth = default_synth();
    assert_eq!(synth.oscillators().unwrap().secondary().detune(), 20.0);

    synth
        .set(&VoiceUpdate {
            detune: Some(0.0),
            ..Default::default()
        })
        .unwrap();

    let pair = synth.oscillators().unwrap();
    assert_eq!(pair.primary().detune(), 0.0);
    assert_eq!(pair.secondary().detune(), 0.0);
    assert_eq!(pair.waveform(), OscillatorWaveform::Square);

    synth.set_osc_type(OscillatorWaveform::Sawtooth).unwrap();
    let pair = synth.oscillators().unwrap();
    assert_eq!(pair.primary().waveform(), OscillatorWaveform::Sawtooth);
    assert_eq!(pair.secondary().waveform(), OscillatorWaveform::Sawtooth);
}

#[test]
fn envelope_update_applies_to_later_notes() {
    let mut synth = default_synth();
    synth.trigger_attack(220.0, Some(0.0)).unwrap();

    let update = VoiceUpdate::from_toml_str("[envelope]\nattack = 0.5").unwrap();
    synth.set(&update).unwrap();
    synth.trigger_attack(220.0, Some(2.0)).unwrap();

    let envelope = synth.envelope().unwrap();
    assert_eq!(envelope.level_at(0.005), 1.0);
    assert!(envelope.level_at(2.25) < 1.0);
    assert_eq!(envelope.state_at(2.25), EnvelopeStage::Attack);
}

#[test]
fn voice_from_patch_text() {
    let config = VoiceConfig::from_toml_str(
        r#"
        osc_type = "triangle"
        portamento = 0.2

        [filter]
        type = "highpass"
        rolloff = -48
        "#,
    )
    .unwrap();
    let mut synth = MonoSynth::new(SR, config).unwrap();

    assert_eq!(synth.portamento().unwrap(), 0.2);
    assert_eq!(synth.filter().unwrap().rolloff().stages(), 4);
    synth.trigger_attack(110.0, None).unwrap();
    let output = render_seconds(&mut synth, 0.5);
    assert!(output.iter().all(|s| s.is_finite()));
}

// ---------------------------------------------------------------------------
// 5. Disposal
// ---------------------------------------------------------------------------

#[test]
fn disposed_voice_fails_every_call() {
    let mut synth = default_synth();
    synth.trigger_attack(220.0, Some(0.0)).unwrap();
    synth.dispose().unwrap();

    let mut buffer = [0.0; 16];
    assert!(matches!(synth.render(&mut buffer), Err(VoiceError::Disposed)));
    assert!(matches!(
        synth.trigger_attack(220.0, None),
        Err(VoiceError::Disposed)
    ));
    assert!(matches!(
        synth.set(&VoiceUpdate::default()),
        Err(VoiceError::Disposed)
    ));
    assert!(matches!(synth.current_frequency(), Err(VoiceError::Disposed)));
    assert!(matches!(synth.envelope(), Err(VoiceError::Disposed)));
    assert!(matches!(synth.dispose(), Err(VoiceError::Disposed)));
}
