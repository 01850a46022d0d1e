//! Run the streaming server.

use anyhow::Context;
use beatstream_config::ServerConfig;
use beatstream_core::BackendPreference;
use clap::Args;
use std::path::PathBuf;

/// Server options. Flags override values from `--config`.
#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Bind address (0.0.0.0 or 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Listening port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Output sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Frames per block
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Compute backend: cpu or accelerated
    #[arg(long)]
    pub backend: Option<BackendPreference>,

    /// Default lowpass cutoff in Hz
    #[arg(long)]
    pub filter_cutoff: Option<f64>,

    /// Largest accepted control message in bytes
    #[arg(long)]
    pub max_message_size: Option<usize>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl ServeArgs {
    fn resolve(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let config = ServerConfig::load(path)
                    .with_context(|| format!("loading {}", path.display()))?;
                tracing::debug!(path = %path.display(), "configuration loaded");
                config
            }
            None => ServerConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(rate) = self.sample_rate {
            config.sample_rate = rate;
        }
        if let Some(size) = self.block_size {
            config.block_size = size;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if self.filter_cutoff.is_some() {
            config.filter_cutoff = self.filter_cutoff;
        }
        if self.max_message_size.is_some() {
            config.max_message_size = self.max_message_size;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Run the serve command.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    println!("Serving on ws://{}", config.addr());
    println!(
        "  {} Hz, {} frames/block ({:.1} ms), backend preference: {}",
        config.sample_rate,
        config.block_size,
        config.block_duration().as_secs_f64() * 1000.0,
        match config.backend {
            BackendPreference::Cpu => "cpu",
            BackendPreference::Accelerated => "accelerated",
        }
    );
    println!("Press Ctrl+C to stop.");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    tracing::info!(addr = %config.addr(), "starting server");
    runtime.block_on(beatstream_io::serve(config))?;
    tracing::info!("server stopped");

    println!("Server stopped.");
    Ok(())
}
