//! Render a note sequence through the voice into a WAV file.

use anyhow::{Context, bail, ensure};
use clap::Args;
use hound::{SampleFormat, WavSpec, WavWriter};
use portavox_synth::{
    MonoSynth, OscillatorWaveform, VoiceConfig, VoiceUpdate, linear_to_db, midi_to_freq,
};
use std::path::PathBuf;

/// Notes played when neither `--freqs` nor `--midi` is given (A3 C4 E4 A4).
const DEFAULT_MIDI: [u8; 4] = [57, 60, 64, 69];

const BLOCK_SIZE: usize = 512;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file (32-bit float, mono)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// TOML patch; missing fields take their defaults
    #[arg(long, value_name = "FILE")]
    patch: Option<PathBuf>,

    /// Note frequencies in Hz (comma-separated, e.g. "220,330")
    #[arg(long, value_delimiter = ',')]
    freqs: Vec<f32>,

    /// MIDI note numbers (comma-separated, e.g. "57,60,64"), played after --freqs
    #[arg(long, value_delimiter = ',')]
    midi: Vec<u8>,

    /// Seconds between note onsets
    #[arg(long, default_value = "0.5")]
    step: f64,

    /// Seconds each note is held before release
    #[arg(long, default_value = "0.4")]
    gate: f64,

    /// Seconds rendered after the last release
    #[arg(long, default_value = "1.5")]
    tail: f64,

    /// Note velocity (0-1)
    #[arg(long, default_value = "1.0")]
    velocity: f32,

    /// Override the patch's glide time in seconds
    #[arg(long)]
    portamento: Option<f64>,

    /// Override the patch's oscillator type (sine, square, sawtooth, triangle)
    #[arg(long)]
    osc_type: Option<OscillatorWaveform>,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    ensure!(
        args.step.is_finite() && args.step > 0.0,
        "--step must be a positive number of seconds"
    );
    ensure!(
        args.gate.is_finite() && args.gate >= 0.0,
        "--gate must be a number of seconds >= 0"
    );
    ensure!(
        args.tail.is_finite() && args.tail >= 0.0,
        "--tail must be a number of seconds >= 0"
    );
    if args.sample_rate == 0 {
        bail!("--sample-rate must be greater than 0");
    }

    let config = match &args.patch {
        Some(path) => VoiceConfig::load(path)
            .with_context(|| format!("failed to load patch {}", path.display()))?,
        None => VoiceConfig::default(),
    };

    let mut notes = args.freqs.clone();
    notes.extend(args.midi.iter().map(|&note| midi_to_freq(note)));
    if notes.is_empty() {
        notes.extend(DEFAULT_MIDI.iter().map(|&note| midi_to_freq(note)));
    }

    let mut synth = MonoSynth::new(args.sample_rate as f32, config)?;
    synth.set(&VoiceUpdate {
        portamento: args.portamento,
        osc_type: args.osc_type,
        ..Default::default()
    })?;

    for (i, &frequency) in notes.iter().enumerate() {
        let onset = args.step * i as f64;
        synth
            .trigger_attack_release(frequency, args.gate, Some(onset), args.velocity)
            .with_context(|| format!("note {} ({frequency} Hz)", i + 1))?;
    }

    let last_release = args.step * (notes.len() - 1) as f64 + args.gate;
    let duration = last_release + args.tail;
    let total = (duration * f64::from(args.sample_rate)).round() as usize;

    println!("Rendering {} notes...", notes.len());
    println!(
        "  {:.2}s at {} Hz, portamento {:.3}s",
        duration,
        args.sample_rate,
        synth.portamento()?
    );
    tracing::info!(
        notes = notes.len(),
        duration,
        sample_rate = args.sample_rate,
        "render"
    );

    let spec = WavSpec {
        channels: 1,
        sample_rate: args.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, spec)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let mut block = [0.0f32; BLOCK_SIZE];
    let mut peak = 0.0f32;
    let mut written = 0;
    while written < total {
        let len = BLOCK_SIZE.min(total - written);
        let block = &mut block[..len];
        synth.render(block)?;
        for &sample in block.iter() {
            peak = peak.max(sample.abs());
            writer.write_sample(sample)?;
        }
        written += len;
    }
    writer.finalize()?;
    synth.dispose()?;

    tracing::debug!(peak, "render finished");
    println!("  peak {:.1} dBFS", linear_to_db(peak));
    println!("Wrote {} samples to {}", written, args.output.display());
    Ok(())
}
