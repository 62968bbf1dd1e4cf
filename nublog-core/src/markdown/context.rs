//! Per-document side channel threaded through every pipeline stage.

use super::script::Script;
use crate::frontmatter::FrontMatter;
use std::collections::HashMap;

/// Mutable scratch state of one in-flight compilation.
///
/// Created fresh for each document and dropped once the fragment is built;
/// nothing in here outlives a single `compile` call.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub file_path: String,
    pub url_path: String,
    /// Front-matter fields accumulated so far (the title stage may fill `title`)
    pub front_matter: FrontMatter,
    pub script: Script,
    counters: HashMap<&'static str, usize>,
}

impl DocumentContext {
    pub fn new(file_path: impl Into<String>, url_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            url_path: url_path.into(),
            front_matter: FrontMatter::default(),
            script: Script::new(),
            counters: HashMap::new(),
        }
    }

    /// Next generated binding name for `prefix`: `img1`, `img2`, ...
    pub fn next_binding(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        format!("{}{}", prefix, counter)
    }
}
