//! CLI entry point — the composition root. The only place that
//! instantiates concrete adapters and wires them against `ivr-core`'s
//! ports; everything downstream only ever sees `CallMessage` and the
//! port traits.

mod bootstrap;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::bootstrap::bootstrap;
use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "ivr-bridge", about = "Real-time telephony voice-AI bridge")]
struct Cli {
    /// Path to the TOML startup configuration file.
    #[arg(long, default_value = "ivr-bridge.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let app_config = AppConfig::load(&cli.config)?;
    let speech_credentials = config::read_speech_credentials()?;

    let ctx = Arc::new(bootstrap(app_config, speech_credentials));
    bootstrap::run(ctx).await
}
