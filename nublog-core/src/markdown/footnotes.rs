//! Footnote id localization.

use super::render::{RenderNode, FOOTNOTE_ID_PREFIX, FOOTNOTE_LABEL_ID, FOOTNOTE_REF_ID_PREFIX};
use super::tree::{TreeNode, Visit};

const REWRITTEN_ATTRS: &[&str] = &["id", "href", "aria-describedby"];

/// Pipeline stage: replace the renderer's default footnote ids with ids
/// built from `label`, on both the references and the footnote section.
///
/// `user-content-fnref-x` becomes `{label}-ref-x`, `user-content-fn-x`
/// becomes `{label}-x` and `footnote-label` becomes `{label}-label`.
pub fn localize_footnotes(tree: &mut RenderNode, label: &str) {
    tree.walk_mut(&mut |node| {
        if let Some(el) = node.as_element_mut() {
            for (name, value) in el.attrs.iter_mut() {
                if REWRITTEN_ATTRS.contains(&name.as_str()) {
                    if let Some(localized) = localize(value, label) {
                        *value = localized;
                    }
                }
            }
        }
        Visit::Continue
    });
}

fn localize(value: &str, label: &str) -> Option<String> {
    let (hash, id) = match value.strip_prefix('#') {
        Some(id) => ("#", id),
        None => ("", value),
    };

    let localized = if let Some(rest) = id.strip_prefix(FOOTNOTE_REF_ID_PREFIX) {
        format!("{}-ref-{}", label, rest)
    } else if let Some(rest) = id.strip_prefix(FOOTNOTE_ID_PREFIX) {
        format!("{}-{}", label, rest)
    } else if id == FOOTNOTE_LABEL_ID {
        format!("{}-label", label)
    } else {
        return None;
    };
    Some(format!("{}{}", hash, localized))
}
