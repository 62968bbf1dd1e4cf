//! Heading ids and self-links.

use super::render::{Element, RenderNode};
use super::tree::{TreeNode, Visit};
use crate::slug::Slugger;

fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// Text a heading is slugged from. Footnote reference markers are not part
/// of it, so ids agree with the slugs the table of contents computed from
/// the source tree.
fn heading_text(nodes: &[RenderNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            RenderNode::Text(text) => out.push_str(text),
            RenderNode::Raw(_) => {}
            RenderNode::Element(el) if is_footnote_ref(el) => {}
            RenderNode::Element(Element { children, .. }) | RenderNode::Root(children) => {
                out.push_str(&heading_text(children))
            }
        }
    }
    out
}

fn is_footnote_ref(el: &Element) -> bool {
    el.tag == "sup"
        && el
            .children
            .iter()
            .filter_map(RenderNode::as_element)
            .any(|a| a.attr("data-footnote-ref").is_some())
}

/// Pipeline stage: give every heading a slug id and wrap its content in a
/// link to `#id`.
///
/// Ids are assigned in document order, matching the slugs the table of
/// contents links to.
pub fn add_heading_anchors(tree: &mut RenderNode) {
    let mut slugger = Slugger::new();

    tree.walk_mut(&mut |node| {
        let Some(heading) = node.as_element_mut().filter(|el| is_heading(&el.tag)) else {
            return Visit::Continue;
        };

        let id = match heading.attr("id").map(str::to_string) {
            Some(id) => id,
            None => {
                let id = slugger.slug(&heading_text(&heading.children));
                heading.set_attr("id", id.as_str());
                id
            }
        };

        let content = std::mem::take(&mut heading.children);
        heading.children.push(
            Element::new("a")
                .with_attr("href", format!("#{}", id))
                .with_children(content)
                .into_node(),
        );
        Visit::Skip
    });
}
