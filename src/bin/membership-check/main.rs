//! membership-check CLI entry point.

mod cli;

use clap::Parser;
use cli::Cli;
use membership_registry::upstream::HttpChainSource;
use membership_registry::{RegistrationEvaluator, SystemClock};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();
    let nft_id = cli.nft_id.clone();
    let json_logs = cli.json_logs;

    // Build configuration
    let config = cli.into_config()?;

    // Initialize tracing; stdout carries only the verdict
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let layer = fmt::layer().with_writer(std::io::stderr);
    if json_logs {
        tracing_subscriber::registry()
            .with(layer.json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(layer).with(filter).init();
    }

    info!("membership-check v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.evaluator_settings()?;
    let source = Arc::new(HttpChainSource::new(&config.ord_url, &config.esplora_url)?);
    let evaluator =
        RegistrationEvaluator::new(settings, source.clone(), source, Arc::new(SystemClock));

    let status = evaluator.evaluate(&nft_id).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}
