//! Criterion benchmarks for portavox-synth components
//!
//! Run with: cargo bench -p portavox-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use portavox_synth::{
    Envelope, EnvelopeConfig, FilterUpdate, MonoSynth, Oscillator, OscillatorPair,
    OscillatorWaveform, Rolloff, VoiceConfig, VoiceUpdate,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

// ============================================================================
// Oscillator benchmarks
// ============================================================================

fn bench_oscillator_waveforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("Oscillator");

    for waveform in OscillatorWaveform::ALL {
        for &block_size in BLOCK_SIZES {
            let mut osc = Oscillator::new(SAMPLE_RATE);
            osc.set_waveform(waveform);

            group.bench_with_input(
                BenchmarkId::new(waveform.name(), block_size),
                &block_size,
                |b, &size| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for _ in 0..size {
                            sum += osc.process(black_box(440.0));
                        }
                        black_box(sum)
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_oscillator_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("OscillatorPair");

    for &block_size in BLOCK_SIZES {
        let mut pair = OscillatorPair::new(SAMPLE_RATE, OscillatorWaveform::Sawtooth, 20.0);
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, &size| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for _ in 0..size {
                        sum += pair.process(black_box(220.0));
                    }
                    black_box(sum)
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Envelope benchmarks
// ============================================================================

fn bench_envelope_timeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Envelope");
    let dt = 1.0 / f64::from(SAMPLE_RATE);

    group.bench_function("attack_release_cycle", |b| {
        b.iter(|| {
            let mut env = Envelope::new(EnvelopeConfig::default(), 0.0, 1.0).unwrap();
            env.trigger_attack(0.0, 1.0).unwrap();
            env.trigger_release(0.2).unwrap();
            let mut sum = 0.0f32;
            for n in 0..4800 {
                let t = f64::from(n) * dt * 4.0;
                env.advance_to(t);
                sum += env.value_at(t);
            }
            black_box(sum)
        })
    });

    group.finish();
}

// ============================================================================
// Voice benchmarks
// ============================================================================

fn bench_mono_synth(c: &mut Criterion) {
    let mut group = c.benchmark_group("MonoSynth");

    for (name, rolloff) in [
        ("db12", Rolloff::Db12),
        ("db24", Rolloff::Db24),
        ("db48", Rolloff::Db48),
    ] {
        for &block_size in BLOCK_SIZES {
            let mut synth = MonoSynth::new(SAMPLE_RATE, VoiceConfig::default()).unwrap();
            synth
                .set(&VoiceUpdate {
                    filter: Some(FilterUpdate {
                        rolloff: Some(rolloff),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .unwrap();
            synth.trigger_attack(220.0, Some(0.0)).unwrap();
            let mut buffer = vec![0.0f32; block_size];

            group.bench_with_input(BenchmarkId::new(name, block_size), &block_size, |b, _| {
                b.iter(|| {
                    synth.render(&mut buffer).unwrap();
                    black_box(buffer[0])
                })
            });
        }
    }

    group.finish();
}

fn bench_mono_synth_glide(c: &mut Criterion) {
    let mut group = c.benchmark_group("MonoSynth_Glide");
    let notes = [110.0, 165.0, 220.0, 330.0];

    group.bench_function("retrigger_every_block", |b| {
        let mut synth = MonoSynth::new(SAMPLE_RATE, VoiceConfig::default()).unwrap();
        let mut buffer = vec![0.0f32; 256];
        let mut i = 0;
        b.iter(|| {
            synth.trigger_attack(notes[i % notes.len()], None).unwrap();
            synth.render(&mut buffer).unwrap();
            i += 1;
            black_box(buffer[255])
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_oscillator_waveforms,
    bench_oscillator_pair,
    bench_envelope_timeline,
    bench_mono_synth,
    bench_mono_synth_glide,
);
criterion_main!(benches);
