use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use helpqueue::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG=debug shows feed and control events
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
