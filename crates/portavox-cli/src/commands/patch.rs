//! Print a patch as TOML.

use anyhow::Context;
use clap::Args;
use portavox_synth::VoiceConfig;
use std::path::PathBuf;

#[derive(Args)]
pub struct PatchArgs {
    /// Patch to check; prints it with every default filled in.
    /// Without a file, prints the default patch.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

pub fn run(args: PatchArgs) -> anyhow::Result<()> {
    let config = match &args.file {
        Some(path) => VoiceConfig::load(path)
            .with_context(|| format!("failed to load patch {}", path.display()))?,
        None => VoiceConfig::default(),
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}
