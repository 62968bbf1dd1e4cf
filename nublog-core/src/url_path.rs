//! File path to URL path derivation and relative reference resolution.
//!
//! File paths here are content-root-relative, `/`-separated and start with
//! `/` (for example `/articles/2024/01/intro.md`).

/// Extension of text sources handled by the compiler.
pub const SOURCE_EXTENSION: &str = ".md";

/// Derive the routable URL path of a source file.
///
/// The extension is stripped and a terminal `index` segment collapses to its
/// parent directory. Returns `None` for paths that are not text sources.
///
/// ```
/// use nublog_core::url_path::to_url_path;
///
/// assert_eq!(to_url_path("/a/b/index.md").as_deref(), Some("/a/b"));
/// assert_eq!(to_url_path("/index.md").as_deref(), Some("/"));
/// assert_eq!(to_url_path("/a.md").as_deref(), Some("/a"));
/// assert_eq!(to_url_path("/a.rs"), None);
/// ```
pub fn to_url_path(file_path: &str) -> Option<String> {
    let file_path = normalize_file_path(file_path);
    let path = file_path.strip_suffix(SOURCE_EXTENSION)?;

    if path == "/index" {
        return Some(String::from("/"));
    }

    Some(path.strip_suffix("/index").unwrap_or(path).to_string())
}

/// Ensure a content path carries exactly one leading slash.
pub fn normalize_file_path(file_path: &str) -> String {
    format!("/{}", file_path.trim_start_matches('/'))
}

/// Whether an href is written relative to the current document (`./x`, `../x`).
pub fn is_relative_reference(href: &str) -> bool {
    href.starts_with("./") || href.starts_with("../")
}

/// Resolve a relative reference against the directory of `base_file`.
///
/// `..` segments never climb above the content root.
///
/// ```
/// use nublog_core::url_path::resolve_relative;
///
/// assert_eq!(resolve_relative("/a/b.md", "./foo.md"), "/a/foo.md");
/// assert_eq!(resolve_relative("/a/b/c.md", "../d.md"), "/a/d.md");
/// ```
pub fn resolve_relative(base_file: &str, reference: &str) -> String {
    let base_file = normalize_file_path(base_file);
    let mut segments: Vec<&str> = base_file.split('/').filter(|s| !s.is_empty()).collect();
    // drop the file name, keep its directory
    segments.pop();

    for part in reference.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Split an href into its path and an optional `#fragment` (fragment keeps the `#`).
pub fn split_fragment(href: &str) -> (&str, &str) {
    match href.find('#') {
        Some(pos) => href.split_at(pos),
        None => (href, ""),
    }
}
