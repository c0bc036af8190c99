//! presetkit CLI - extract parameter schemas and decode VST3 presets.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "presetkit")]
#[command(author, version, about = "VST3 preset schema extraction and decoding", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract parameter schemas from parameter.hpp headers
    Extract(commands::extract::ExtractArgs),

    /// Decode .vstpreset files against a plugin schema
    Decode(commands::decode::DecodeArgs),

    /// Show the header and chunk directory of .vstpreset files
    Inspect(commands::inspect::InspectArgs),

    /// Collect processor GUIDs from fuid.hpp headers into GUID.json
    Guid(commands::guid::GuidArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract(args) => commands::extract::run(args),
        Commands::Decode(args) => commands::decode::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Guid(args) => commands::guid::run(args),
    }
}
