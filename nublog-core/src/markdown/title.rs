//! Title extraction from the single leading level-1 heading.

use super::context::DocumentContext;
use super::source::{SourceKind, SourceNode};
use super::tree::{TreeNode, Visit};
use crate::error::CompileError;

/// Require the first node to be the document's only level-1 heading, holding
/// exactly one plain-text child, and record its text as the title unless
/// front-matter already supplied one.
pub fn extract_title(tree: &SourceNode, ctx: &mut DocumentContext) -> Result<(), CompileError> {
    let mut nodes = tree
        .children
        .iter()
        .filter(|node| !matches!(node.kind, SourceKind::FrontMatter(_)));

    let first = nodes
        .next()
        .ok_or(CompileError::MissingTitle("expected a level-1 heading"))?;

    if first.heading_level() != Some(1) {
        return Err(CompileError::MissingTitle(
            "expected a level-1 heading as the first node",
        ));
    }

    if nodes.any(contains_level_one_heading) {
        return Err(CompileError::MalformedTitle(
            "expected a single level-1 heading",
        ));
    }

    let title = match first.children.as_slice() {
        [SourceNode {
            kind: SourceKind::Text(text),
            ..
        }] => text.clone(),
        [_] => return Err(CompileError::MalformedTitle("expected a plain-text title")),
        _ => {
            return Err(CompileError::MalformedTitle(
                "expected a single child in the title heading",
            ))
        }
    };

    if ctx.front_matter.title.is_none() {
        ctx.front_matter.title = Some(title);
    }

    Ok(())
}

fn contains_level_one_heading(node: &SourceNode) -> bool {
    let mut found = false;
    node.walk(&mut |n| {
        if n.heading_level() == Some(1) {
            found = true;
            Visit::Stop
        } else {
            Visit::Continue
        }
    });
    found
}
