//! Backoffice CLI entry point.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use backoffice_core::config::{AppConfig, LogFormat};
use backoffice_core::error::AppError;

mod app;
mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = cli.execute(config).await {
        tracing::debug!(kind = %e.kind, "Command failed");
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Load configuration from file, the environment overlay and
/// `BACKOFFICE__*` variables.
fn load_configuration(path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(path)
}

/// Initialize tracing. Logs go to stderr so command output stays clean.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
