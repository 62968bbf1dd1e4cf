//! Metadata validation.
//!
//! Pure checks over values extracted from front-matter. They run per document
//! while compiling and over the whole index once a full load completes.

use crate::models::DocumentMeta;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetaError {
    #[error("Invalid date {value:?}: {reason}")]
    InvalidDate { value: String, reason: &'static str },

    #[error("Invalid link {label:?}: {url:?} is not an absolute http(s) URL")]
    InvalidLink { label: String, url: String },

    #[error("Invalid postOrder {0}: expected a positive integer")]
    InvalidPostOrder(String),

    #[error("Missing postOrder in {file_path}: postDate {post_date} is shared with other documents")]
    MissingPostOrder { post_date: String, file_path: String },

    #[error("postOrder conflict on {post_date}: {first} and {second} both use postOrder {post_order}")]
    PostOrderConflict {
        post_date: String,
        post_order: u32,
        first: String,
        second: String,
    },

    #[error("Missing postDate")]
    MissingPostDate,
}

static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

/// Validate a `YYYY-MM-DD` date with year >= 2000 and a real calendar day.
///
/// ```
/// use nublog_core::validate::validate_date_string;
///
/// assert!(validate_date_string("2024-02-29").is_ok());
/// assert!(validate_date_string("2023-02-29").is_err());
/// assert!(validate_date_string("1999-12-31").is_err());
/// ```
pub fn validate_date_string(date: &str) -> Result<NaiveDate, MetaError> {
    let invalid = |reason| MetaError::InvalidDate {
        value: date.to_string(),
        reason,
    };

    if !DATE_SHAPE.is_match(date) {
        return Err(invalid("expected YYYY-MM-DD"));
    }

    // The shape check guarantees three ASCII-digit parts.
    let mut parts = date.split('-').map(|p| p.parse::<u32>().unwrap_or(0));
    let (year, month, day) = (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    );

    if year < 2000 {
        return Err(invalid("unsupported year"));
    }
    if !(1..=12).contains(&month) {
        return Err(invalid("invalid month"));
    }

    NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(|| invalid("invalid day"))
}

/// Every link must be an absolute `http`/`https` URL.
pub fn validate_links(links: &BTreeMap<String, String>) -> Result<(), MetaError> {
    for (label, link) in links {
        let ok = Url::parse(link)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
            .unwrap_or(false);
        if !ok {
            return Err(MetaError::InvalidLink {
                label: label.clone(),
                url: link.clone(),
            });
        }
    }
    Ok(())
}

/// Accept only positive integers.
pub fn validate_post_order(value: &serde_json::Value) -> Result<u32, MetaError> {
    value
        .as_u64()
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| MetaError::InvalidPostOrder(value.to_string()))
}

/// Check that documents sharing a `postDate` are totally ordered by `postOrder`.
///
/// Groups with a single member are exempt. Within a larger group every member
/// needs a `postOrder` and the values must be pairwise distinct. Documents
/// without a `postDate` are ignored.
pub fn check_post_order_conflicts<'a, I>(metas: I) -> Result<(), MetaError>
where
    I: IntoIterator<Item = &'a DocumentMeta>,
{
    let mut groups: BTreeMap<&str, Vec<&DocumentMeta>> = BTreeMap::new();
    for meta in metas {
        if let Some(date) = meta.post_date.as_deref() {
            groups.entry(date).or_default().push(meta);
        }
    }

    for (date, group) in groups {
        if group.len() < 2 {
            continue;
        }

        let mut seen: HashMap<u32, &str> = HashMap::new();
        for meta in group {
            let Some(order) = meta.post_order else {
                return Err(MetaError::MissingPostOrder {
                    post_date: date.to_string(),
                    file_path: meta.file_path.clone(),
                });
            };
            if let Some(first) = seen.insert(order, &meta.file_path) {
                return Err(MetaError::PostOrderConflict {
                    post_date: date.to_string(),
                    post_order: order,
                    first: first.to_string(),
                    second: meta.file_path.clone(),
                });
            }
        }
    }

    Ok(())
}
