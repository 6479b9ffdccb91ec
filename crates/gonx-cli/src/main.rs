//! gonx entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use gonx_cli::cli::Cli;
use gonx_cli::commands;

#[tokio::main]
async fn main() {
    // Load .env.local if it exists (GONX_NX_BIN, GONX_DIR, ...)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.root() {
        Ok(root) => commands::execute(cli.command, &root).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
