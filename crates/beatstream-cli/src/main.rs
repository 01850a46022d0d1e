//! Beatstream CLI - binaural beat streaming server.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beatstream")]
#[command(author, version, about = "Binaural beat WebSocket streaming server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the WebSocket server
    Serve(commands::serve::ServeArgs),

    /// Show compute backend availability
    Backends,

    /// List focus presets
    Presets,

    /// List control parameters with ranges and defaults
    Params(commands::params::ParamsArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; bridge log:: records from tungstenite
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Backends => commands::backends::run(),
        Commands::Presets => commands::presets::run(),
        Commands::Params(args) => commands::params::run(args),
    }
}
