//! Local images become bundler imports.

use super::context::DocumentContext;
use super::render::RenderNode;
use super::tree::{TreeNode, Visit};
use crate::error::CompileError;

pub const IMAGE_COMPONENT: &str = "MarkdownImage";

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Pipeline stage: bind every local image source to a generated `imgN`
/// import and retag images as the image component.
pub fn extract_images(
    tree: &mut RenderNode,
    ctx: &mut DocumentContext,
    component_source: &str,
) -> Result<(), CompileError> {
    tree.try_walk_mut(&mut |node| {
        let Some(img) = node.as_element_mut().filter(|el| el.tag == "img") else {
            return Ok(Visit::Continue);
        };

        let src = match img.attr("src") {
            Some(src) if !src.is_empty() => src.to_string(),
            _ => return Err(CompileError::MissingImageSource),
        };

        if !is_remote(&src) {
            let name = ctx.next_binding("img");
            ctx.script.add_import(&name, &src)?;
            img.remove_attr("src");
            img.set_attr(":src", name);
        }

        img.tag = String::from(IMAGE_COMPONENT);
        ctx.script.add_import(IMAGE_COMPONENT, component_source)?;
        Ok(Visit::Skip)
    })
}
