//! Check command: compile everything, write nothing but the cache.

use super::{load_config, load_registry};
use anyhow::{Context, Result};
use nublog_core::{atom_feed, sitemap};
use std::path::Path;

pub fn check_site(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let registry = load_registry(&config)?;
    registry.check_invariants()?;

    let index = registry.index_data();
    atom_feed(&config.site, &config.feed, &index).context("Feed entries are incomplete")?;
    sitemap(&config.site.url, &index).context("Sitemap entries are incomplete")?;

    println!("✓ {} documents OK", index.len());
    Ok(())
}
