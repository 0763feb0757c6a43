//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use itemhub_entity::item::{Item, ItemNode};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Item display row
#[derive(Debug, Serialize, Tabled)]
pub struct ItemRow {
    /// Item ID
    pub id: String,
    /// Directory or file
    pub kind: &'static str,
    /// Path
    pub path: String,
    /// Size in bytes
    pub size: String,
    /// Content type
    pub mimetype: String,
    /// Last update
    pub updated_at: String,
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.to_string(),
            kind: if item.is_dir { "dir" } else { "file" },
            path: item.path.clone(),
            size: item.size.map(|s| s.to_string()).unwrap_or_default(),
            mimetype: item.mimetype.clone().unwrap_or_default(),
            updated_at: item.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print items as rows
pub fn print_items(items: &[Item], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ItemRow> = items.iter().map(ItemRow::from).collect();
            print_list(&rows, format);
        }
        OutputFormat::Json => print_list_json(items),
    }
}

fn print_list_json<T: Serialize>(items: &[T]) {
    let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
    println!("{}", json);
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a subtree as an indented listing.
pub fn print_tree(root: &ItemNode) {
    let mut pending = vec![(root, 0usize)];
    while let Some((node, depth)) = pending.pop() {
        let indent = "  ".repeat(depth);
        if node.is_dir {
            println!("{}{}/", indent, node.name);
        } else {
            println!(
                "{}{} ({} bytes)",
                indent,
                node.name,
                node.size.unwrap_or_default()
            );
        }
        for child in node.children.iter().rev() {
            pending.push((child, depth + 1));
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}
