//! Study gateway server entry point
//!
//! Loads configuration once, builds the OpenAI-compatible provider and serves
//! the HTTP API until ctrl-c.

use clap::Parser;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use study_ai_gateway::{server, GatewayConfig, OpenAiProvider};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "study-gateway", about = "AI study assistant gateway", version)]
struct Args {
    /// YAML configuration file (environment variables override it)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Bind address (overrides config and STUDY_AI_BIND)
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    init_tracing();
    info!("Starting study gateway");

    let mut config = GatewayConfig::load(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.bind = addr;
    }
    debug!(config = ?config, "Configuration loaded");

    let provider = OpenAiProvider::new(&config)?;
    server::serve(Arc::new(config), Arc::new(provider)).await?;

    info!("Study gateway stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();
}
