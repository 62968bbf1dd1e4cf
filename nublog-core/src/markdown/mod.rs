//! Markdown processing pipeline.
//!
//! A document goes through a fixed sequence of stages: source-tree stages
//! (front-matter, title, table of contents), lowering to the render tree, and
//! render-tree stages (diagrams, highlighting, anchors, math, images, links,
//! footnotes) before serialization. Stages talk to each other only through
//! the [`DocumentContext`].

pub mod anchors;
pub mod context;
pub mod diagram;
pub mod footnotes;
pub mod highlight;
pub mod image;
pub mod links;
pub mod math;
pub mod render;
pub mod script;
pub mod source;
pub mod title;
pub mod toc;
pub mod tree;
pub mod typst_math;

use crate::config::PipelineConfig;
use crate::error::CompileError;
use crate::frontmatter::extract_front_matter;

pub use context::DocumentContext;
pub use highlight::{Highlighter, SyntectHighlighter};
pub use math::MathRenderer;
pub use render::{Element, LowerOptions, RenderNode};
pub use script::Script;
pub use source::{SourceKind, SourceNode};
pub use tree::{TreeNode, Visit};
pub use typst_math::TypstMathRenderer;

use links::LinkOptions;

/// The reusable, stateless part of compilation.
///
/// Construction loads the highlighter's grammars and theme, so build one
/// pipeline per process and share it. All per-document state lives in the
/// [`DocumentContext`] passed to [`Pipeline::run`].
pub struct Pipeline {
    config: PipelineConfig,
    lower_options: LowerOptions,
    highlighter: Box<dyn Highlighter + Send + Sync>,
    math: Box<dyn MathRenderer + Send + Sync>,
}

impl Pipeline {
    /// Build a pipeline with the syntect highlighter and the Typst math renderer.
    pub fn new(config: &PipelineConfig) -> Result<Self, CompileError> {
        let highlighter = SyntectHighlighter::new(&config.highlight_theme)?;
        let math = TypstMathRenderer::new(config.math_preamble.clone());
        Ok(Self::with_collaborators(
            config,
            Box::new(highlighter),
            Box::new(math),
        ))
    }

    pub fn with_collaborators(
        config: &PipelineConfig,
        highlighter: Box<dyn Highlighter + Send + Sync>,
        math: Box<dyn MathRenderer + Send + Sync>,
    ) -> Self {
        Self {
            config: config.clone(),
            lower_options: LowerOptions {
                footnote_heading: config.footnote_heading.clone(),
                footnote_backref_label: config.footnote_backref_label.clone(),
            },
            highlighter,
            math,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage over `markdown` and return the serialized body.
    ///
    /// Front-matter, the title, and the generated imports and constants are
    /// left in `ctx`.
    pub fn run(&self, markdown: &str, ctx: &mut DocumentContext) -> Result<String, CompileError> {
        let components = &self.config.components;

        let mut source = source::parse(markdown, source::parser_options())?;
        extract_front_matter(&mut source, ctx)?;
        title::extract_title(&source, ctx)?;
        toc::substitute_toc(&mut source);

        let mut tree = render::lower(&source, &self.lower_options);
        diagram::render_diagrams(&mut tree, ctx, &components.graphviz)?;
        highlight::highlight_code_blocks(&mut tree, self.highlighter.as_ref())?;
        anchors::add_heading_anchors(&mut tree);
        math::render_math(&mut tree, self.math.as_ref());
        image::extract_images(&mut tree, ctx, &components.image)?;
        links::fix_links(
            &mut tree,
            ctx,
            &LinkOptions {
                component_source: &components.link,
                source_url_template: self.config.source_url_template.as_deref(),
            },
        )?;
        footnotes::localize_footnotes(&mut tree, &self.config.footnote_label);

        Ok(render::to_html(&tree))
    }
}
