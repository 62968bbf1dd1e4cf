//! CLI command implementations.

pub mod build;
pub mod check;
pub mod compile;
pub mod query;

pub use build::build_site;
pub use check::check_site;
pub use compile::compile_file;
pub use query::query_contents;

use anyhow::{Context, Result};
use nublog_core::{Compiler, Config, Pipeline, Registry, RegistryOptions};
use std::path::Path;
use std::sync::Arc;

pub(crate) fn load_config(config_path: &Path) -> Result<Config> {
    tracing::info!("Loading config from {:?}", config_path);
    Config::from_file(config_path).context("Failed to load configuration")
}

/// Build the pipeline once and load the whole content directory with it.
pub(crate) fn load_registry(config: &Config) -> Result<Registry> {
    let pipeline =
        Pipeline::new(&config.markdown).context("Failed to construct markdown pipeline")?;
    let compiler = Arc::new(Compiler::new(Arc::new(pipeline)));

    let options = RegistryOptions {
        content_dir: config.content_dir(),
        cache_path: config.cache_path(),
    };
    Registry::load(compiler, options)
        .with_context(|| format!("Failed to load content from {:?}", config.content_dir()))
}
