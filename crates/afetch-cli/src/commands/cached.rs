//! `afetch cached` command implementation
//!
//! Lists AlphaFold files already present in the fetch directory.

use crate::config::Config;
use crate::error::Result;
use crate::progress::format_bytes;
use crate::store::{LocalStore, StoredFile};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use std::path::PathBuf;

/// Show stored files in `path`, or in the configured fetch directory
pub async fn run(path: Option<PathBuf>) -> Result<()> {
    let dir = match path {
        Some(path) => path,
        None => Config::load()?.fetch_path,
    };
    let store = LocalStore::new(dir);
    let files = store.list()?;

    if files.is_empty() {
        println!("No AlphaFold files in {}", store.dir().display());
        println!("Run 'afetch fetch <UNIPROT_ID>' to download one.");
        return Ok(());
    }

    println!("{}", render_table(&files));
    println!();
    println!("{}", "Summary:".cyan().bold());
    println!("  Files:      {}", files.len());
    println!("  Total size: {}", format_bytes(files.iter().map(|f| f.size).sum()));
    println!("  Directory:  {}", store.dir().display());

    Ok(())
}

fn render_table(files: &[StoredFile]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["ID", "Version", "Format", "Size", "SHA-256"]);

    for file in files {
        table.add_row(vec![
            file.code.clone(),
            format!("v{}", file.version),
            file.extension.clone(),
            format_bytes(file.size),
            file.checksum.chars().take(16).collect::<String>(),
        ]);
    }
    table
}
