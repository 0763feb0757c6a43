//! Item tree CLI commands.

use bytes::Bytes;
use clap::{Args, Subcommand};
use tokio::io::AsyncWriteExt;

use super::AppContext;
use crate::output::{self, OutputFormat};
use itemhub_core::config::AppConfig;
use itemhub_core::error::{AppError, ErrorKind};
use itemhub_entity::item::{ItemChange, Placement};
use itemhub_service::CreateItemRequest;

/// Arguments for item commands
#[derive(Debug, Args)]
pub struct ItemArgs {
    /// Item subcommand
    #[command(subcommand)]
    pub command: ItemCommand,
}

/// Item subcommands. An item reference is an id or a full path.
#[derive(Debug, Subcommand)]
pub enum ItemCommand {
    /// Create a directory
    Mkdir {
        /// Directory name
        name: String,
        /// Parent directory (omit for root)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Upload a local file as a new item
    Put {
        /// Local file to upload
        file: String,
        /// Item name (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Parent directory (omit for root)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Replace the content of an existing file item
    Write {
        /// Item reference
        item: String,
        /// Local file with the new content
        file: String,
    },
    /// List children of a directory, or the root items
    Ls {
        /// Directory reference (omit for root)
        parent: Option<String>,
        /// List every item instead
        #[arg(short, long)]
        all: bool,
    },
    /// Show the subtree under an item
    Tree {
        /// Item reference
        item: String,
    },
    /// Show one item
    Show {
        /// Item reference
        item: String,
    },
    /// Write a file item's content to stdout
    Cat {
        /// Item reference
        item: String,
    },
    /// Rename and/or move an item
    Mv {
        /// Item reference
        item: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New parent directory
        #[arg(short, long, conflicts_with = "to_root")]
        to: Option<String>,
        /// Move to the root
        #[arg(long)]
        to_root: bool,
    },
    /// Delete an item and everything under it
    Rm {
        /// Item reference
        item: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Execute item commands
pub async fn execute(
    args: &ItemArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = AppContext::connect(config).await?;
    let result = run(&ctx, &args.command, format).await;
    ctx.pool.close().await;
    result
}

async fn run(ctx: &AppContext, command: &ItemCommand, format: OutputFormat) -> Result<(), AppError> {
    match command {
        ItemCommand::Mkdir { name, parent } => {
            let parent_id = ctx.resolve_parent(parent.as_deref()).await?;
            let item = ctx
                .items
                .create_item(CreateItemRequest::directory(name.clone(), parent_id))
                .await?;
            output::print_success(&format!("Created {} (id: {})", item.path, item.id));
        }
        ItemCommand::Put { file, name, parent } => {
            let parent_id = ctx.resolve_parent(parent.as_deref()).await?;
            let name = match name {
                Some(name) => name.clone(),
                None => std::path::Path::new(file)
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .ok_or_else(|| {
                        AppError::invalid_operation(format!("Cannot derive a name from '{file}'"))
                    })?,
            };
            let content = read_local(file).await?;
            let item = ctx
                .items
                .create_item(CreateItemRequest::file(name, parent_id, content))
                .await?;
            output::print_success(&format!(
                "Uploaded {} ({} bytes, id: {})",
                item.path,
                item.size.unwrap_or_default(),
                item.id
            ));
        }
        ItemCommand::Write { item, file } => {
            let target = ctx.resolve(item).await?;
            let content = read_local(file).await?;
            let updated = ctx.items.replace_content(target.id, content).await?;
            output::print_success(&format!(
                "Wrote {} bytes to {}",
                updated.size.unwrap_or_default(),
                updated.path
            ));
        }
        ItemCommand::Ls { parent, all } => {
            let items = if *all {
                ctx.items.list_all().await?
            } else {
                let parent_id = ctx.resolve_parent(parent.as_deref()).await?;
                ctx.items.list_children(parent_id).await?
            };
            output::print_items(&items, format);
        }
        ItemCommand::Tree { item } => {
            let target = ctx.resolve(item).await?;
            let tree = ctx.items.subtree(target.id).await?;
            match format {
                OutputFormat::Json => output::print_item(&tree, format),
                OutputFormat::Table => {
                    output::print_tree(&tree.root);
                    println!("{} item(s)", tree.total_items);
                }
            }
        }
        ItemCommand::Show { item } => {
            let target = ctx.resolve(item).await?;
            output::print_item(&target, format);
        }
        ItemCommand::Cat { item } => {
            let target = ctx.resolve(item).await?;
            let content = ctx.items.read_content(target.id).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&content).await?;
            stdout.flush().await?;
        }
        ItemCommand::Mv {
            item,
            name,
            to,
            to_root,
        } => {
            let target = ctx.resolve(item).await?;
            let parent = if *to_root {
                Some(Placement::Root)
            } else {
                ctx.resolve_parent(to.as_deref())
                    .await?
                    .map(Placement::Directory)
            };
            let change = ItemChange {
                name: name.clone(),
                parent,
            };
            if change.is_empty() {
                output::print_warning("Nothing to change; pass --name, --to, or --to-root.");
                return Ok(());
            }

            let moved = ctx.items.rename_or_move(target.id, change).await?;
            output::print_success(&format!("{} -> {}", target.path, moved.path));
        }
        ItemCommand::Rm { item, force } => {
            let target = ctx.resolve(item).await?;
            if !force {
                let prompt = if target.is_dir {
                    format!("Delete '{}' and everything under it?", target.path)
                } else {
                    format!("Delete '{}'?", target.path)
                };
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let report = ctx.items.delete_item(target.id).await?;
            if format == OutputFormat::Json {
                output::print_item(&report, format);
                return Ok(());
            }

            output::print_success(&format!(
                "Deleted {} ({} item(s), {} blob(s))",
                report.item.path,
                report.removed,
                report.blobs.purged.len()
            ));
            for failure in &report.blobs.failed {
                output::print_warning(&format!(
                    "Blob {} left behind: {}. Run `itemhub reconcile` to retry.",
                    failure.item_id, failure.error
                ));
            }
        }
    }

    Ok(())
}

async fn read_local(file: &str) -> Result<Bytes, AppError> {
    tokio::fs::read(file).await.map(Bytes::from).map_err(|e| {
        AppError::with_source(ErrorKind::Storage, format!("Failed to read '{file}'"), e)
    })
}
