//! Build command implementation.

use super::{load_config, load_registry};
use anyhow::{Context, Result};
use nublog_core::{atom_feed, sitemap, Config, DocumentMeta, Registry};
use std::fs;
use std::path::{Path, PathBuf};

/// Compile every document and write all generated artifacts.
pub fn build_site(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    tracing::info!("Building site: {}", config.site.title);

    let registry = load_registry(&config)?;

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    write_fragments(&registry, &output_dir)?;

    let index = registry.index_data();
    generate_contents_json(&output_dir, &index)?;
    generate_feed(&config, &output_dir, &index)?;
    generate_sitemap(&config, &output_dir, &index)?;

    tracing::info!("✓ Built {} documents", index.len());
    tracing::info!("✓ Output written to {:?}", output_dir);

    Ok(())
}

/// Location of the fragment for a root-relative source path.
fn fragment_path(output_dir: &Path, file_path: &str) -> PathBuf {
    output_dir
        .join("fragments")
        .join(file_path.trim_start_matches('/'))
        .with_extension("vue")
}

fn write_fragments(registry: &Registry, output_dir: &Path) -> Result<()> {
    for (file_path, document) in registry.outputs() {
        let path = fragment_path(output_dir, file_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        fs::write(&path, &document.fragment)
            .with_context(|| format!("Failed to write fragment {:?}", path))?;
        tracing::debug!("Wrote {:?}", path);
    }
    Ok(())
}

fn generate_contents_json(output_dir: &Path, index: &[DocumentMeta]) -> Result<()> {
    let json = serde_json::to_string_pretty(index).context("Failed to serialize index")?;
    fs::write(output_dir.join("contents.json"), json).context("Failed to write contents.json")?;
    Ok(())
}

fn generate_feed(config: &Config, output_dir: &Path, index: &[DocumentMeta]) -> Result<()> {
    let xml = atom_feed(&config.site, &config.feed, index).context("Failed to generate feed")?;
    fs::write(output_dir.join("atom.xml"), xml).context("Failed to write atom.xml")?;
    Ok(())
}

fn generate_sitemap(config: &Config, output_dir: &Path, index: &[DocumentMeta]) -> Result<()> {
    let xml = sitemap(&config.site.url, index).context("Failed to generate sitemap")?;
    fs::write(output_dir.join("sitemap.xml"), xml).context("Failed to write sitemap.xml")?;
    Ok(())
}
