//! `[TOC]` substitution.

use super::source::{SourceKind, SourceNode};
use super::tree::{TreeNode, Visit};
use crate::slug::Slugger;

/// Marker a paragraph must consist of, compared case-insensitively.
const TOC_MARKER: &str = "[TOC]";

#[derive(Debug, Clone, PartialEq)]
struct TocEntry {
    level: u8,
    text: String,
    slug: String,
}

/// Replace every lone `[TOC]` paragraph with a nested list of links to the
/// document's headings.
///
/// Slugs are assigned in document order with the same deduplication the
/// heading anchor stage uses, so the links line up with the ids it emits.
/// The level-1 title is left out of the list.
pub fn substitute_toc(tree: &mut SourceNode) {
    let entries = collect_headings(tree);

    tree.walk_mut(&mut |node| {
        if is_toc_marker(node) {
            *node = build_list(&entries);
            return Visit::Skip;
        }
        Visit::Continue
    });
}

fn is_toc_marker(node: &SourceNode) -> bool {
    if node.kind != SourceKind::Paragraph {
        return false;
    }
    match node.children.as_slice() {
        [SourceNode {
            kind: SourceKind::Text(text),
            ..
        }] => text.trim().eq_ignore_ascii_case(TOC_MARKER),
        _ => false,
    }
}

fn collect_headings(tree: &SourceNode) -> Vec<TocEntry> {
    let mut slugger = Slugger::new();
    let mut entries = Vec::new();

    tree.walk(&mut |node| {
        if let Some(level) = node.heading_level() {
            let text = node.plain_text();
            let slug = slugger.slug(&text);
            if level >= 2 {
                entries.push(TocEntry { level, text, slug });
            }
            return Visit::Skip;
        }
        Visit::Continue
    });

    entries
}

/// Each entry owns the run of deeper entries that follows it.
fn build_list(entries: &[TocEntry]) -> SourceNode {
    let mut list = SourceNode::new(SourceKind::List(None));
    let mut i = 0;

    while i < entries.len() {
        let entry = &entries[i];
        let end = entries[i + 1..]
            .iter()
            .position(|next| next.level <= entry.level)
            .map_or(entries.len(), |offset| i + 1 + offset);

        let link = SourceNode::with_children(
            SourceKind::Link {
                url: format!("#{}", entry.slug),
                title: String::new(),
            },
            vec![SourceNode::text(entry.text.clone())],
        );

        let mut item = SourceNode::with_children(SourceKind::Item, vec![link]);
        if end > i + 1 {
            item.children.push(build_list(&entries[i + 1..end]));
        }
        list.children.push(item);
        i = end;
    }

    list
}
