//! Blob reconciliation command.

use clap::Args;

use super::AppContext;
use crate::output::{self, OutputFormat};
use itemhub_core::config::AppConfig;
use itemhub_core::error::AppError;

/// Arguments for the reconcile command
#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Report drift without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the reconciliation sweep
pub async fn execute(
    args: &ReconcileArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = AppContext::connect(config).await?;
    let report = ctx.reconcile.sweep(args.dry_run).await?;
    ctx.pool.close().await;

    if format == OutputFormat::Json {
        output::print_item(&report, format);
        return Ok(());
    }

    output::print_kv("Blobs scanned", &report.blobs_scanned.to_string());
    output::print_kv("Leaves scanned", &report.leaves_scanned.to_string());
    output::print_kv("Orphaned blobs", &report.orphaned_blobs.len().to_string());
    if !args.dry_run {
        output::print_kv("Removed blobs", &report.purge.purged.len().to_string());
    }
    for failure in &report.purge.failed {
        output::print_warning(&format!(
            "Could not remove blob {}: {}",
            failure.item_id, failure.error
        ));
    }
    for leaf in &report.missing_blobs {
        output::print_warning(&format!("Missing content for {} ({})", leaf.path, leaf.id));
    }

    if report.is_consistent() {
        output::print_success("Metadata and blobs agree.");
    } else if args.dry_run {
        output::print_warning("Drift found; run without --dry-run to remove orphaned blobs.");
    }
    Ok(())
}
