//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the nublog.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: PathsConfig,

    #[serde(default)]
    pub markdown: PipelineConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    /// Absolute base URL, used by the feed and sitemap
    pub url: String,

    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub content: PathBuf,
    pub output: PathBuf,

    #[serde(default)]
    pub cache: Option<PathBuf>,
}

/// Settings fixed for the lifetime of one pipeline.
///
/// None of these participate in the content hash, so changing any of them
/// requires discarding the persisted cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// syntect theme name
    pub highlight_theme: String,
    /// Localized anchor label used for footnote ids
    pub footnote_label: String,
    pub footnote_heading: String,
    pub footnote_backref_label: String,
    /// Where links to non-source files point, with a `{path}` placeholder
    pub source_url_template: Option<String>,
    /// Typst code prepended to every math span
    pub math_preamble: Option<String>,
    pub components: ComponentConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            highlight_theme: String::from("InspiredGitHub"),
            footnote_label: String::from("footnote"),
            footnote_heading: String::from("Footnotes"),
            footnote_backref_label: String::from("Back to content"),
            source_url_template: None,
            math_preamble: None,
            components: ComponentConfig::default(),
        }
    }
}

/// Import sources of the components a fragment references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    pub page: String,
    pub link: String,
    pub image: String,
    pub graphviz: String,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            page: String::from("~/components/markdown/MarkdownPage.vue"),
            link: String::from("~/components/markdown/XLink.vue"),
            image: String::from("~/components/markdown/MarkdownImage.vue"),
            graphviz: String::from("~/components/markdown/GraphViz.vue"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url_prefix: String,
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url_prefix: String::from("/articles"),
            limit: 20,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Get the persisted cache location (defaults to a file in the output directory)
    pub fn cache_path(&self) -> PathBuf {
        match &self.paths.cache {
            Some(path) => self.resolve_path(path),
            None => self.output_dir().join(".content-cache.json"),
        }
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(parent) => parent.join(path),
            None => path.to_path_buf(),
        }
    }
}
