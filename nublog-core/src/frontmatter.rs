//! Front-matter decoding.
//!
//! The leading YAML block is decoded into a small set of typed fields plus a
//! passthrough bag for every other key. Type checks happen here, at the
//! boundary, so later stages never inspect untyped values.

use crate::error::CompileError;
use crate::markdown::context::DocumentContext;
use crate::markdown::source::{SourceKind, SourceNode};
use crate::validate::{validate_post_order, MetaError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Front-matter fields known to the compiler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub post_date: Option<String>,
    pub edit_date: Option<String>,
    pub links: Option<BTreeMap<String, String>>,
    pub post_order: Option<u32>,
    /// Every other key, untouched
    pub extra: BTreeMap<String, Value>,
}

impl FrontMatter {
    /// Decode a YAML front-matter block.
    ///
    /// ```
    /// use nublog_core::frontmatter::FrontMatter;
    ///
    /// let fm = FrontMatter::from_yaml("postDate: 2024-01-01\npostOrder: 2\ntags: [a]\n").unwrap();
    /// assert_eq!(fm.post_date.as_deref(), Some("2024-01-01"));
    /// assert_eq!(fm.post_order, Some(2));
    /// assert!(fm.extra.contains_key("tags"));
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self, CompileError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| CompileError::Parse(format!("invalid front-matter: {}", e)))?;

        let mut fields = match value {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(CompileError::Parse(format!(
                    "front-matter must be a mapping, found {}",
                    other
                )))
            }
        };

        let title = match fields.remove("title") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => {
                return Err(CompileError::Parse(String::from(
                    "front-matter `title` must be a string",
                )))
            }
        };

        let post_date = take_date(&mut fields, "postDate")?;
        let edit_date = take_date(&mut fields, "editDate")?;

        let links = match fields.remove("links") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => {
                let mut links = BTreeMap::new();
                for (label, url) in map {
                    match url {
                        Value::String(url) => {
                            links.insert(label, url);
                        }
                        other => {
                            return Err(MetaError::InvalidLink {
                                label,
                                url: other.to_string(),
                            }
                            .into())
                        }
                    }
                }
                Some(links)
            }
            Some(other) => {
                return Err(MetaError::InvalidLink {
                    label: String::from("links"),
                    url: other.to_string(),
                }
                .into())
            }
        };

        let post_order = match fields.remove("postOrder") {
            None | Some(Value::Null) => None,
            Some(value) => Some(validate_post_order(&value)?),
        };

        // Path fields are derived from the file location and always win.
        for key in DERIVED_KEYS {
            if fields.remove(*key).is_some() {
                debug!("Ignoring front-matter key `{}`", key);
            }
        }

        Ok(Self {
            title,
            post_date,
            edit_date,
            links,
            post_order,
            extra: fields.into_iter().collect(),
        })
    }
}

/// Metadata keys computed by the compiler, never taken from front-matter.
const DERIVED_KEYS: &[&str] = &["filePath", "urlPath"];

fn take_date(fields: &mut Map<String, Value>, key: &str) -> Result<Option<String>, MetaError> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(MetaError::InvalidDate {
            value: other.to_string(),
            reason: "expected a YYYY-MM-DD string",
        }),
    }
}

/// Pipeline stage: move the leading front-matter block out of the source
/// tree and into the document context.
pub fn extract_front_matter(
    tree: &mut SourceNode,
    ctx: &mut DocumentContext,
) -> Result<(), CompileError> {
    let position = tree
        .children
        .iter()
        .position(|node| matches!(node.kind, SourceKind::FrontMatter(_)));

    if let Some(index) = position {
        let node = tree.children.remove(index);
        if let SourceKind::FrontMatter(yaml) = node.kind {
            ctx.front_matter = FrontMatter::from_yaml(&yaml)?;
        }
    }

    Ok(())
}
