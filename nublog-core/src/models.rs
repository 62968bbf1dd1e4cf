//! Document metadata and compiled output structs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata of one compiled document, as exposed by the index.
///
/// Known fields are typed; every other front-matter key is carried through
/// untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub file_path: String,

    pub url_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_order: Option<u32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMeta {
    /// Metadata with only the derived path fields set.
    pub fn new(file_path: impl Into<String>, url_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            url_path: url_path.into(),
            title: None,
            post_date: None,
            edit_date: None,
            links: None,
            post_order: None,
            extra: BTreeMap::new(),
        }
    }

    /// Sort key used by listings: `(postDate, postOrder or 0)`.
    pub fn sort_key(&self) -> (Option<&str>, u32) {
        (self.post_date.as_deref(), self.post_order.unwrap_or(0))
    }
}

/// The immutable result of compiling one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledDocument {
    pub metadata: DocumentMeta,

    /// Renderable unit: generated logic block plus template markup
    pub fragment: String,
}
