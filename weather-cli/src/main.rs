//! Binary crate for the `weather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use clap::Parser;
use weather_core::ClassifiedError;

mod cli;
mod render;

const DEFAULT_LOG_FILTER: &str = "weather=warn,weather_core=warn";

/// `RUST_LOG` when set, otherwise the default filter.
fn log_directives(rust_log: Option<String>) -> String {
    rust_log.filter(|v| !v.trim().is_empty()).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[tokio::main]
async fn main() {
    // Keys and RUST_LOG may live in a local .env file, so load it before logging starts.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_directives(
            std::env::var("RUST_LOG").ok(),
        )))
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    if let Err(err) = cmd.run().await {
        match err.downcast_ref::<ClassifiedError>() {
            Some(classified) => eprintln!("{}", render::error_panel(classified)),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}
