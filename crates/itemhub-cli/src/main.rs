//! ItemHub CLI entry point.

use clap::Parser;

mod commands;
mod logging;
mod output;

use commands::Cli;
use itemhub_core::config::LoggingConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = itemhub_core::config::AppConfig::load(&cli.config);
    match &config {
        Ok(config) => logging::init_logging(&config.logging),
        Err(_) => logging::init_logging(&LoggingConfig::default()),
    }

    if let Err(e) = cli.execute(config).await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}
