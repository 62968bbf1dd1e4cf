//! Errors raised while compiling a single document.

use crate::validate::MetaError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing title: {0}")]
    MissingTitle(&'static str),

    #[error("Malformed title: {0}")]
    MalformedTitle(&'static str),

    #[error("Invalid diagram annotation: {0}")]
    InvalidMeta(String),

    #[error("Invalid diagram engine: {0}")]
    InvalidEngine(String),

    #[error("Image without a source")]
    MissingImageSource,

    #[error("Link without an href")]
    MissingLinkHref,

    #[error("Binding `{name}` is already bound to {existing}")]
    BindingConflict { name: String, existing: String },

    #[error("Highlighter error: {0}")]
    Highlight(String),

    #[error("Not a source file path: {0}")]
    NotSourcePath(String),

    #[error(transparent)]
    Meta(#[from] MetaError),
}
