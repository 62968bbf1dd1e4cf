//! Compile a single document.

use super::{load_config, load_registry};
use anyhow::{Context, Result};
use nublog_core::url_path::normalize_file_path;
use std::fs;
use std::path::Path;

/// Compile `file` through the registry (reusing cached output) and print the fragment.
pub fn compile_file(config_path: &Path, file: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let mut registry = load_registry(&config)?;

    let file_path = normalize_file_path(file);
    let full_path = config.content_dir().join(file_path.trim_start_matches('/'));
    let raw = fs::read_to_string(&full_path)
        .with_context(|| format!("Failed to read {:?}", full_path))?;

    let document = registry.compile(&file_path, &raw)?;
    print!("{}", document.fragment);

    registry.save_cache()?;
    Ok(())
}
