//
// main.rs
// Rtss-Tools-rs
//
// Tokio entry point that sets up logging and hands off execution to the CLI layer.
//
// Thales Matheus Mendonça Santos - November 2025

use rtss_tools::cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    cli::run().await
}
