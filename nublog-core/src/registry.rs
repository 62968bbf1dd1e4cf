//! The authoritative set of compiled documents.

use crate::cache::{CacheError, ContentCache};
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::models::{CompiledDocument, DocumentMeta};
use crate::url_path::{normalize_file_path, to_url_path, SOURCE_EXTENSION};
use crate::validate::{check_post_order_conflicts, MetaError};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL path conflict: {url_path} is claimed by both {first} and {second}")]
    UrlPathConflict {
        url_path: String,
        first: String,
        second: String,
    },

    #[error("Failed to compile {file_path}: {source}")]
    Compile {
        file_path: String,
        source: CompileError,
    },

    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub content_dir: PathBuf,
    pub cache_path: PathBuf,
}

/// A page route derived from a compiled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub url_path: String,
    /// Absolute path of the source file
    pub file: PathBuf,
}

/// Compiled documents keyed by root-relative file path.
///
/// Whole-set invariants (unique URL paths, post-order consistency) are
/// enforced by [`Registry::load`] and [`Registry::check_invariants`], never by
/// the per-file [`Registry::compile`] used while editing.
pub struct Registry {
    compiler: Arc<Compiler>,
    content_dir: PathBuf,
    cache: ContentCache,
    cache_path: PathBuf,
    outputs: BTreeMap<String, CompiledDocument>,
}

impl Registry {
    /// Compile every source under the content directory.
    ///
    /// URL paths are checked before anything is compiled. Unchanged files are
    /// served from the persisted cache, which is saved once every file has
    /// compiled. Post-order consistency is checked over the complete set.
    pub fn load(compiler: Arc<Compiler>, options: RegistryOptions) -> Result<Self, RegistryError> {
        let cache = ContentCache::load(&options.cache_path)?;

        info!("Loading markdown files from {:?}", options.content_dir);
        let file_paths = discover_sources(&options.content_dir)?;
        check_url_paths(file_paths.iter().map(String::as_str))?;

        let mut registry = Self {
            compiler,
            content_dir: options.content_dir,
            cache,
            cache_path: options.cache_path,
            outputs: BTreeMap::new(),
        };

        for file_path in &file_paths {
            let raw = fs::read_to_string(registry.full_path(file_path))?;
            registry.compile(file_path, &raw)?;
        }

        registry.save_cache()?;
        check_post_order_conflicts(registry.outputs.values().map(|doc| &doc.metadata))?;

        info!("Loaded {} markdown files", registry.outputs.len());
        Ok(registry)
    }

    /// Compile one document, or reuse the cached output for identical source.
    ///
    /// On failure the previous output for `file_path`, if any, stays in place.
    pub fn compile(
        &mut self,
        file_path: &str,
        raw: &str,
    ) -> Result<&CompiledDocument, RegistryError> {
        let file_path = normalize_file_path(file_path);

        let document = match self.cache.get(&file_path, raw) {
            Some(document) => {
                debug!("Cache hit: {}", file_path);
                document.clone()
            }
            None => {
                info!("Compiling: {}", file_path);
                let document = self.compiler.compile(&file_path, raw).map_err(|source| {
                    RegistryError::Compile {
                        file_path: file_path.clone(),
                        source,
                    }
                })?;
                self.cache.set(&file_path, raw, document.clone());
                document
            }
        };

        Ok(match self.outputs.entry(file_path) {
            Entry::Occupied(mut entry) => {
                entry.insert(document);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(document),
        })
    }

    pub fn outputs(&self) -> &BTreeMap<String, CompiledDocument> {
        &self.outputs
    }

    /// Metadata of every current document, ordered by file path.
    pub fn index_data(&self) -> Vec<DocumentMeta> {
        self.outputs
            .values()
            .map(|doc| doc.metadata.clone())
            .collect()
    }

    /// Source of the bundler's virtual index module.
    pub fn index_module(&self) -> serde_json::Result<String> {
        let index = serde_json::to_string(&self.index_data())?;
        Ok(format!("export default {};", index))
    }

    /// One route per document; fails if a static route shadows a derived one.
    pub fn routes(&self, static_routes: &[&str]) -> Result<Vec<Route>, RegistryError> {
        let by_url: HashMap<&str, &str> = self
            .outputs
            .values()
            .map(|doc| (doc.metadata.url_path.as_str(), doc.metadata.file_path.as_str()))
            .collect();

        if let Some((route, file_path)) = static_routes
            .iter()
            .find_map(|route| by_url.get(route).map(|file_path| (route, file_path)))
        {
            return Err(RegistryError::UrlPathConflict {
                url_path: route.to_string(),
                first: format!("static route {}", route),
                second: file_path.to_string(),
            });
        }

        Ok(self
            .outputs
            .values()
            .map(|doc| Route {
                url_path: doc.metadata.url_path.clone(),
                file: self.full_path(&doc.metadata.file_path),
            })
            .collect())
    }

    /// Re-run the whole-set checks over the current outputs.
    pub fn check_invariants(&self) -> Result<(), RegistryError> {
        check_url_paths(self.outputs.keys().map(String::as_str))?;
        check_post_order_conflicts(self.outputs.values().map(|doc| &doc.metadata))?;
        Ok(())
    }

    pub fn save_cache(&self) -> Result<(), RegistryError> {
        self.cache.save(&self.cache_path)?;
        Ok(())
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    fn full_path(&self, file_path: &str) -> PathBuf {
        self.content_dir.join(file_path.trim_start_matches('/'))
    }
}

/// Every source file under `content_dir` as a sorted list of `/`-rooted paths.
fn discover_sources(content_dir: &Path) -> Result<Vec<String>, RegistryError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(content_dir) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(content_dir) else {
            continue;
        };

        let file_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if file_path.ends_with(SOURCE_EXTENSION) {
            files.push(format!("/{}", file_path));
        }
    }

    files.sort();
    Ok(files)
}

/// Fail on the first URL path derived from two different files.
fn check_url_paths<'a, I>(file_paths: I) -> Result<(), RegistryError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<String, &str> = HashMap::new();
    for file_path in file_paths {
        let Some(url_path) = to_url_path(file_path) else {
            continue;
        };
        if let Some(first) = seen.get(&url_path) {
            return Err(RegistryError::UrlPathConflict {
                url_path,
                first: first.to_string(),
                second: file_path.to_string(),
            });
        }
        seen.insert(url_path, file_path);
    }
    Ok(())
}
