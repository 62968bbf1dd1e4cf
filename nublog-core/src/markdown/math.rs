//! Math span rendering.

use super::render::RenderNode;
use super::tree::{TreeNode, Visit};
use anyhow::Result;
use tracing::warn;

/// External math renderer: turns the source of one math span into markup.
pub trait MathRenderer {
    fn render(&self, source: &str, display: bool) -> Result<String>;
}

/// Pipeline stage: render every `math-inline` / `math-display` span and mark
/// it `v-pre`.
///
/// A span that fails to render keeps its source text.
pub fn render_math(tree: &mut RenderNode, renderer: &dyn MathRenderer) {
    tree.walk_mut(&mut |node| {
        let Some(el) = node.as_element_mut() else {
            return Visit::Continue;
        };
        let display = if el.has_class("math-display") {
            true
        } else if el.has_class("math-inline") {
            false
        } else {
            return Visit::Continue;
        };

        let source = RenderNode::text_content_of(&el.children);
        match renderer.render(&source, display) {
            Ok(markup) => el.children = vec![RenderNode::Raw(markup)],
            Err(err) => warn!("Math rendering failed for `{}`: {err}", source),
        }
        el.set_attr("v-pre", "");
        Visit::Skip
    });
}
