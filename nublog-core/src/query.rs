//! Listing queries over the metadata index.

use crate::models::DocumentMeta;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Document {0} has no postDate")]
    MissingPostDate(String),
}

/// Documents whose URL path starts with `url_prefix` (all when `None`),
/// newest first: descending by `(postDate, postOrder or 0)`.
///
/// Ties keep index order, so the result is deterministic for a given index.
pub fn query_content_all<'a>(
    index: &'a [DocumentMeta],
    url_prefix: Option<&str>,
) -> Result<Vec<&'a DocumentMeta>, QueryError> {
    let mut entries = index
        .iter()
        .filter(|meta| url_prefix.map_or(true, |prefix| meta.url_path.starts_with(prefix)))
        .map(|meta| match meta.post_date {
            Some(_) => Ok(meta),
            None => Err(QueryError::MissingPostDate(meta.file_path.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    entries.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    Ok(entries)
}
