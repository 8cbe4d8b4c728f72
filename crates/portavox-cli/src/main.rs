//! Portavox CLI - render the monophonic voice to audio files.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portavox")]
#[command(author, version, about = "Portavox monophonic synth CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a sequence of notes to a WAV file
    Render(commands::render::RenderArgs),

    /// Print a patch as TOML (the default patch without arguments)
    Patch(commands::patch::PatchArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `portavox patch` output stays valid TOML.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Patch(args) => commands::patch::run(args),
    }
}
