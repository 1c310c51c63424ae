//! Gatesynth CLI - play, render and inspect gatesynth patches.

mod commands;
mod input;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gatesynth")]
#[command(author, version, about = "Gated modular synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a patch through an audio device
    Play(commands::play::PlayArgs),

    /// Render a patch offline to a WAV file
    Render(commands::render::RenderArgs),

    /// Validate a patch and show its chains
    Info(commands::info::InfoArgs),

    /// List factory patches
    Patches,

    /// List audio output devices
    Devices,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Patches => commands::patches::run(),
        Commands::Devices => commands::devices::run(),
    }
}
