//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use itemhub_core::config::AppConfig;
use itemhub_core::error::AppError;
use itemhub_database::mask_password;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            shown.database.url = mask_password(&shown.database.url);

            match format {
                OutputFormat::Json => output::print_item(&shown, format),
                OutputFormat::Table => {
                    output::print_kv("Database", &shown.database.url);
                    output::print_kv(
                        "Pool",
                        &format!(
                            "{}..{} connections",
                            shown.database.min_connections, shown.database.max_connections
                        ),
                    );
                    output::print_kv("Storage provider", &shown.storage.provider);
                    output::print_kv("Blob root", &shown.storage.local.root_path);
                    output::print_kv("Namespace root", &shown.tree.namespace_root);
                    output::print_kv(
                        "Logging",
                        &format!("{} ({})", shown.logging.level, shown.logging.format),
                    );
                }
            }
        }
    }

    Ok(())
}
