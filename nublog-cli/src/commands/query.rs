//! Query command implementation.

use super::{load_config, load_registry};
use anyhow::Result;
use nublog_core::query_content_all;
use std::path::Path;

pub fn query_contents(config_path: &Path, prefix: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = load_registry(&config)?;

    let index = registry.index_data();
    let entries = query_content_all(&index, prefix)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No documents found");
        return Ok(());
    }

    for meta in entries {
        println!(
            "{}  {}  {}",
            meta.post_date.as_deref().unwrap_or_default(),
            meta.url_path,
            meta.title.as_deref().unwrap_or("(untitled)")
        );
    }

    Ok(())
}
