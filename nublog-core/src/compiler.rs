//! Single-document compilation: pipeline, metadata validation, fragment assembly.

use crate::error::CompileError;
use crate::markdown::{DocumentContext, Pipeline};
use crate::models::{CompiledDocument, DocumentMeta};
use crate::url_path::{normalize_file_path, to_url_path};
use crate::validate::{validate_date_string, validate_links, MetaError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Page chrome component wrapping every fragment body.
pub const PAGE_COMPONENT: &str = "MarkdownPage";

/// Name of the constant holding the document metadata.
const META_BINDING: &str = "meta";

/// Compiles documents with a shared [`Pipeline`].
///
/// Output depends only on `(file_path, raw)` and the pipeline configuration.
pub struct Compiler {
    pipeline: Arc<Pipeline>,
    compilations: AtomicUsize,
}

impl Compiler {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            compilations: AtomicUsize::new(0),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Number of times the pipeline has been run by this compiler.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    pub fn compile(&self, file_path: &str, raw: &str) -> Result<CompiledDocument, CompileError> {
        let file_path = normalize_file_path(file_path);
        let url_path = to_url_path(&file_path)
            .ok_or_else(|| CompileError::NotSourcePath(file_path.clone()))?;

        self.compilations.fetch_add(1, Ordering::Relaxed);

        let mut ctx = DocumentContext::new(file_path, url_path);
        let body = self.pipeline.run(raw, &mut ctx)?;
        let metadata = build_metadata(&ctx)?;

        let page_source = &self.pipeline.config().components.page;
        ctx.script.add_import(PAGE_COMPONENT, page_source)?;
        ctx.script.add_constant_json(META_BINDING, &metadata)?;

        let fragment = assemble_fragment(&ctx.script.finalize(), &body);
        Ok(CompiledDocument { metadata, fragment })
    }
}

/// Combine front-matter with the derived path fields and validate the result.
fn build_metadata(ctx: &DocumentContext) -> Result<DocumentMeta, CompileError> {
    let fm = &ctx.front_matter;

    let post_date = fm.post_date.clone().ok_or(MetaError::MissingPostDate)?;
    validate_date_string(&post_date)?;
    if let Some(edit_date) = &fm.edit_date {
        validate_date_string(edit_date)?;
    }
    if let Some(links) = &fm.links {
        validate_links(links)?;
    }

    Ok(DocumentMeta {
        file_path: ctx.file_path.clone(),
        url_path: ctx.url_path.clone(),
        title: fm.title.clone(),
        post_date: Some(post_date),
        edit_date: fm.edit_date.clone(),
        links: fm.links.clone(),
        post_order: fm.post_order,
        extra: fm.extra.clone(),
    })
}

fn assemble_fragment(logic: &str, body: &str) -> String {
    format!(
        "<script setup>\n{logic}\n</script>\n\n\
         <template>\n<{PAGE_COMPONENT} :{META_BINDING}=\"{META_BINDING}\">\n{body}\n</{PAGE_COMPONENT}>\n</template>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::markdown::testing::pipeline;

    fn compiler() -> Compiler {
        Compiler::new(Arc::new(pipeline(&PipelineConfig::default())))
    }

    const DOC: &str = "---\npostDate: 2024-01-01\nlinks:\n  repo: https://github.com/Nugine/nublog\n---\n\n# Hello\n\nBody.\n";

    #[test]
    fn test_compile_fragment_shape() {
        let doc = compiler().compile("/articles/hello.md", DOC).unwrap();

        assert_eq!(doc.metadata.url_path, "/articles/hello");
        assert_eq!(doc.metadata.title.as_deref(), Some("Hello"));
        assert_eq!(
            doc.fragment,
            "<script setup>\n\
             import XLink from \"~/components/markdown/XLink.vue\";\n\
             import MarkdownPage from \"~/components/markdown/MarkdownPage.vue\";\n\
             const meta = {\"filePath\":\"/articles/hello.md\",\"urlPath\":\"/articles/hello\",\"title\":\"Hello\",\"postDate\":\"2024-01-01\",\"links\":{\"repo\":\"https://github.com/Nugine/nublog\"}};\n\
             </script>\n\n\
             <template>\n\
             <MarkdownPage :meta=\"meta\">\n\
             <h1 id=\"hello\"><XLink href=\"/articles/hello\">Hello</XLink></h1>\n<p>Body.</p>\n\
             </MarkdownPage>\n\
             </template>\n"
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let compiler = compiler();
        let first = compiler.compile("hello.md", DOC).unwrap();
        let second = compiler.compile("/hello.md", DOC).unwrap();
        assert_eq!(first, second);
        assert_eq!(compiler.compilations(), 2);
    }

    #[test]
    fn test_post_date_is_required() {
        assert_eq!(
            compiler().compile("/a.md", "# A\n"),
            Err(CompileError::Meta(MetaError::MissingPostDate))
        );
    }

    #[test]
    fn test_invalid_metadata() {
        let compiler = compiler();
        assert!(matches!(
            compiler.compile("/a.md", "---\npostDate: 2023-02-29\n---\n# A\n"),
            Err(CompileError::Meta(MetaError::InvalidDate { .. }))
        ));
        assert!(matches!(
            compiler.compile(
                "/a.md",
                "---\npostDate: 2024-01-01\neditDate: 1999-01-01\n---\n# A\n"
            ),
            Err(CompileError::Meta(MetaError::InvalidDate { .. }))
        ));
        assert!(matches!(
            compiler.compile(
                "/a.md",
                "---\npostDate: 2024-01-01\nlinks:\n  x: ftp://example.com\n---\n# A\n"
            ),
            Err(CompileError::Meta(MetaError::InvalidLink { .. }))
        ));
    }

    #[test]
    fn test_not_a_source_path() {
        let compiler = compiler();
        assert_eq!(
            compiler.compile("/a.txt", DOC),
            Err(CompileError::NotSourcePath(String::from("/a.txt")))
        );
        assert_eq!(compiler.compilations(), 0);
    }
}
