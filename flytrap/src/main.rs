//! Flytrap Server Entry Point

use clap::Parser;
use flytrap::cli::Cli;
use flytrap::{logging, server};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let config = cli.serve_args().into_config();

    if let Err(e) = server::run(config).await {
        error!(error = %e, "Flytrap failed");
        std::process::exit(1);
    }
}
