//! Link rewriting.
//!
//! Relative links to other sources are resolved to their URL paths, links to
//! source-code files are pointed at the hosted repository, and the title's
//! self-link points at the page itself.

use super::context::DocumentContext;
use super::render::{Element, RenderNode};
use super::tree::TreeNode;
use crate::error::CompileError;
use crate::url_path::{
    is_relative_reference, resolve_relative, split_fragment, to_url_path, SOURCE_EXTENSION,
};

pub const LINK_COMPONENT: &str = "XLink";

/// File extensions rewritten through the source URL template.
const SOURCE_CODE_EXTENSIONS: &[&str] = &[
    "rs", "c", "cpp", "h", "hpp", "py", "toml", "ts", "js", "go", "java", "sh",
];

#[derive(Debug, Clone, Copy)]
pub struct LinkOptions<'a> {
    pub component_source: &'a str,
    /// `{path}` is replaced by the root-relative path of the linked file
    pub source_url_template: Option<&'a str>,
}

/// Pipeline stage: validate and rewrite every anchor, then retag it as the
/// link component.
pub fn fix_links(
    tree: &mut RenderNode,
    ctx: &mut DocumentContext,
    options: &LinkOptions<'_>,
) -> Result<(), CompileError> {
    fix_node(tree, None, ctx, options)
}

fn fix_node(
    node: &mut RenderNode,
    parent_tag: Option<&str>,
    ctx: &mut DocumentContext,
    options: &LinkOptions<'_>,
) -> Result<(), CompileError> {
    let tag = match node {
        RenderNode::Element(el) => {
            if el.tag == "a" {
                fix_anchor(el, parent_tag == Some("h1"), ctx, options)?;
            }
            Some(el.tag.clone())
        }
        _ => None,
    };

    if let Some(children) = node.children_mut() {
        for child in children {
            fix_node(child, tag.as_deref(), ctx, options)?;
        }
    }
    Ok(())
}

fn fix_anchor(
    el: &mut Element,
    in_title: bool,
    ctx: &mut DocumentContext,
    options: &LinkOptions<'_>,
) -> Result<(), CompileError> {
    let href = match el.attr("href") {
        Some(href) if !href.is_empty() => href.to_string(),
        _ => return Err(CompileError::MissingLinkHref),
    };

    if in_title {
        el.set_attr("href", ctx.url_path.as_str());
    } else if let Some(rewritten) = rewrite_href(&href, &ctx.file_path, options)? {
        el.set_attr("href", rewritten);
    }

    el.tag = String::from(LINK_COMPONENT);
    ctx.script
        .add_import(LINK_COMPONENT, options.component_source)?;
    Ok(())
}

/// New href for a relative reference, `None` when it stays as written.
fn rewrite_href(
    href: &str,
    file_path: &str,
    options: &LinkOptions<'_>,
) -> Result<Option<String>, CompileError> {
    if !is_relative_reference(href) {
        return Ok(None);
    }
    let (path, fragment) = split_fragment(href);

    if path.ends_with(SOURCE_EXTENSION) {
        let target = resolve_relative(file_path, path);
        let url_path = to_url_path(&target).ok_or(CompileError::NotSourcePath(target))?;
        return Ok(Some(format!("{}{}", url_path, fragment)));
    }

    match options.source_url_template {
        Some(template) if is_source_code(path) => {
            let target = resolve_relative(file_path, path);
            let url = template.replace("{path}", target.trim_start_matches('/'));
            Ok(Some(format!("{}{}", url, fragment)))
        }
        _ => Ok(None),
    }
}

fn is_source_code(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| SOURCE_CODE_EXTENSIONS.contains(&ext))
}
