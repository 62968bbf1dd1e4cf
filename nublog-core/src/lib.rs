//! # nublog-core
//!
//! Core library for the nublog document compiler.
//!
//! This crate turns markdown sources into Vue single-file-component
//! fragments plus validated metadata, and keeps the compiled set of a content
//! directory consistent across rebuilds.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod error;
pub mod feed;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod query;
pub mod registry;
pub mod slug;
pub mod url_path;
pub mod validate;

pub use cache::ContentCache;
pub use compiler::Compiler;
pub use config::Config;
pub use error::CompileError;
pub use feed::{atom_feed, sitemap, FeedError};
pub use markdown::Pipeline;
pub use models::{CompiledDocument, DocumentMeta};
pub use query::{query_content_all, QueryError};
pub use registry::{Registry, RegistryError, RegistryOptions, Route};
pub use slug::slugify;
pub use validate::MetaError;
