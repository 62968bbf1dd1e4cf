//! Graphviz diagrams, rendered client-side by the diagram component.

use super::context::DocumentContext;
use super::highlight::{code_block, find_language, normalize_language};
use super::render::{Element, RenderNode};
use super::tree::{TreeNode, Visit};
use crate::error::CompileError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const DIAGRAM_LANGUAGE: &str = "dot";
pub const DIAGRAM_COMPONENT: &str = "GraphViz";
const DEFAULT_ENGINE: &str = "dot";

const ENGINES: &[&str] = &[
    "circo",
    "dot",
    "fdp",
    "sfdp",
    "neato",
    "osage",
    "patchwork",
    "twopi",
];

static ENGINE_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\{engine="(.+)"\}$"#).expect("valid engine annotation regex"));

/// Payload bound to `graphvizN` for the diagram component.
#[derive(Debug, Serialize)]
struct DiagramData {
    dot: String,
    engine: &'static str,
}

/// Parse a `{engine="name"}` annotation; `None` when there is no annotation.
pub fn parse_engine(meta: Option<&str>) -> Result<Option<&'static str>, CompileError> {
    let Some(meta) = meta else {
        return Ok(None);
    };
    let caps = ENGINE_META
        .captures(meta)
        .ok_or_else(|| CompileError::InvalidMeta(meta.to_string()))?;

    let engine = &caps[1];
    ENGINES
        .iter()
        .copied()
        .find(|known| *known == engine)
        .map(Some)
        .ok_or_else(|| CompileError::InvalidEngine(engine.to_string()))
}

/// Pipeline stage: replace every `dot` code block with a diagram component
/// bound to a generated `graphvizN` constant.
pub fn render_diagrams(
    tree: &mut RenderNode,
    ctx: &mut DocumentContext,
    component_source: &str,
) -> Result<(), CompileError> {
    tree.try_walk_mut(&mut |node| {
        let Some(code) = code_block(node) else {
            return Ok(Visit::Continue);
        };
        if normalize_language(find_language(code).as_deref()) != DIAGRAM_LANGUAGE {
            return Ok(Visit::Skip);
        }

        let engine = parse_engine(code.attr("data-meta"))?.unwrap_or(DEFAULT_ENGINE);
        let data = DiagramData {
            dot: code.text_content(),
            engine,
        };

        let name = ctx.next_binding("graphviz");
        ctx.script.add_import(DIAGRAM_COMPONENT, component_source)?;
        ctx.script.add_constant_json(&name, &data)?;

        *node = Element::new(DIAGRAM_COMPONENT)
            .with_attr(":dot", format!("{}.dot", name))
            .with_attr(":engine", format!("{}.engine", name))
            .into_node();
        Ok(Visit::Skip)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::render::to_html;

    const SOURCE: &str = "~/components/markdown/GraphViz.vue";

    fn block(lang: &str, meta: Option<&str>, text: &str) -> RenderNode {
        let mut code = Element::new("code").with_attr("class", format!("language-{}", lang));
        if let Some(meta) = meta {
            code.set_attr("data-meta", meta);
        }
        code.children.push(RenderNode::text(text));
        Element::new("pre")
            .with_children(vec![code.into_node()])
            .into_node()
    }

    #[test]
    fn test_parse_engine() {
        assert_eq!(parse_engine(None), Ok(None));
        assert_eq!(parse_engine(Some(r#"{engine="neato"}"#)), Ok(Some("neato")));
        assert_eq!(
            parse_engine(Some(r#"{engine="bogus"}"#)),
            Err(CompileError::InvalidEngine(String::from("bogus")))
        );
        assert!(matches!(
            parse_engine(Some("engine=dot")),
            Err(CompileError::InvalidMeta(_))
        ));
    }

    #[test]
    fn test_diagrams_become_components() {
        let mut ctx = DocumentContext::new("/a.md", "/a");
        let mut tree = RenderNode::Root(vec![
            block("dot", Some(r#"{engine="dot"}"#), "digraph { a -> b }\n"),
            block("rust", None, "fn main() {}\n"),
            block("dot", Some(r#"{engine="circo"}"#), "graph { x }\n"),
        ]);

        render_diagrams(&mut tree, &mut ctx, SOURCE).unwrap();

        let html = to_html(&tree);
        assert!(html.starts_with(
            "<GraphViz :dot=\"graphviz1.dot\" :engine=\"graphviz1.engine\" />"
        ));
        assert!(html.contains("language-rust"));
        assert!(html.ends_with("<GraphViz :dot=\"graphviz2.dot\" :engine=\"graphviz2.engine\" />"));

        assert_eq!(
            ctx.script.imports(),
            &[(DIAGRAM_COMPONENT.to_string(), SOURCE.to_string())]
        );
        assert_eq!(
            ctx.script.constants()[0],
            (
                String::from("graphviz1"),
                String::from(r#"{"dot":"digraph { a -> b }\n","engine":"dot"}"#)
            )
        );
        assert_eq!(ctx.script.constants()[1].0, "graphviz2");
    }

    #[test]
    fn test_default_engine() {
        let mut ctx = DocumentContext::new("/a.md", "/a");
        let mut tree = RenderNode::Root(vec![block("dot", None, "digraph {}")]);
        render_diagrams(&mut tree, &mut ctx, SOURCE).unwrap();
        assert!(ctx.script.constants()[0].1.contains(r#""engine":"dot""#));
    }

    #[test]
    fn test_no_diagrams_no_import() {
        let mut ctx = DocumentContext::new("/a.md", "/a");
        let mut tree = RenderNode::Root(vec![block("rust", None, "")]);
        render_diagrams(&mut tree, &mut ctx, SOURCE).unwrap();
        assert!(ctx.script.imports().is_empty());
    }

    #[test]
    fn test_bogus_engine_fails() {
        let mut ctx = DocumentContext::new("/a.md", "/a");
        let mut tree = RenderNode::Root(vec![block("dot", Some(r#"{engine="bogus"}"#), "")]);
        assert_eq!(
            render_diagrams(&mut tree, &mut ctx, SOURCE),
            Err(CompileError::InvalidEngine(String::from("bogus")))
        );
    }
}
