//! Integration tests for loading, caching and querying a content directory.

use nublog_core::config::PipelineConfig;
use nublog_core::markdown::{Element, Highlighter, MathRenderer, RenderNode};
use nublog_core::{
    query_content_all, CompileError, Compiler, MetaError, Pipeline, Registry, RegistryError,
    RegistryOptions,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Result<RenderNode, CompileError> {
        let code = Element::new("code")
            .with_attr("class", format!("language-{}", lang))
            .with_children(vec![RenderNode::text(code)]);
        Ok(Element::new("pre")
            .with_children(vec![code.into_node()])
            .into_node())
    }
}

struct SourceMath;

impl MathRenderer for SourceMath {
    fn render(&self, source: &str, _display: bool) -> anyhow::Result<String> {
        Ok(format!("<svg>{}</svg>", source))
    }
}

fn compiler() -> Arc<Compiler> {
    let pipeline = Pipeline::with_collaborators(
        &PipelineConfig::default(),
        Box::new(PlainHighlighter),
        Box::new(SourceMath),
    );
    Arc::new(Compiler::new(Arc::new(pipeline)))
}

fn write(root: &Path, file_path: &str, contents: &str) {
    let path = root.join(file_path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn doc(title: &str, date: &str, order: Option<u32>) -> String {
    let order = order
        .map(|order| format!("postOrder: {}\n", order))
        .unwrap_or_default();
    format!("---\npostDate: {date}\n{order}---\n\n# {title}\n\nBody of {title}.\n")
}

struct Site {
    dir: TempDir,
}

impl Site {
    fn new(files: &[(&str, String)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (file_path, contents) in files {
            write(&dir.path().join("content"), file_path, contents);
        }
        Self { dir }
    }

    fn content(&self) -> std::path::PathBuf {
        self.dir.path().join("content")
    }

    fn options(&self) -> RegistryOptions {
        RegistryOptions {
            content_dir: self.content(),
            cache_path: self.dir.path().join("dist").join(".content-cache.json"),
        }
    }

    fn load(&self, compiler: Arc<Compiler>) -> Result<Registry, RegistryError> {
        Registry::load(compiler, self.options())
    }
}

#[test]
fn test_load_compiles_every_document() {
    let site = Site::new(&[
        ("index.md", doc("Home", "2020-01-01", None)),
        ("articles/first.md", doc("First", "2024-01-01", None)),
        ("articles/second.md", doc("Second", "2024-02-01", None)),
    ]);

    let compiler = compiler();
    let registry = site.load(compiler.clone()).unwrap();

    assert_eq!(compiler.compilations(), 3);
    let keys: Vec<&str> = registry.outputs().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["/articles/first.md", "/articles/second.md", "/index.md"]
    );

    let index = registry.index_data();
    assert_eq!(index[2].url_path, "/");
    assert_eq!(index[0].title.as_deref(), Some("First"));

    let module = registry.index_module().unwrap();
    assert!(module.starts_with("export default [{\"filePath\":\"/articles/first.md\""));
    assert!(module.ends_with("];"));
}

#[test]
fn test_cache_persists_across_loads() {
    let site = Site::new(&[
        ("a.md", doc("A", "2024-01-01", None)),
        ("b.md", doc("B", "2024-01-02", None)),
    ]);

    let first = compiler();
    site.load(first.clone()).unwrap();
    assert_eq!(first.compilations(), 2);

    let second = compiler();
    let registry = site.load(second.clone()).unwrap();
    assert_eq!(second.compilations(), 0);
    assert_eq!(registry.outputs().len(), 2);

    write(&site.content(), "b.md", &doc("B changed", "2024-01-02", None));
    let third = compiler();
    let registry = site.load(third.clone()).unwrap();
    assert_eq!(third.compilations(), 1);
    assert_eq!(
        registry.outputs()["/b.md"].metadata.title.as_deref(),
        Some("B changed")
    );
}

#[test]
fn test_identical_source_is_not_recompiled() {
    let site = Site::new(&[("a.md", doc("A", "2024-01-01", None))]);
    let compiler = compiler();
    let mut registry = site.load(compiler.clone()).unwrap();

    let raw = doc("A", "2024-01-01", None);
    let loaded = registry.outputs()["/a.md"].clone();
    let first = registry.compile("/a.md", &raw).unwrap().clone();
    let second = registry.compile("a.md", &raw).unwrap().clone();
    assert_eq!(compiler.compilations(), 1);
    assert_eq!(first, loaded);
    assert_eq!(second, first);

    registry
        .compile("/a.md", &doc("A2", "2024-01-01", None))
        .unwrap();
    assert_eq!(compiler.compilations(), 2);
}

#[test]
fn test_cached_output_matches_fresh_compile() {
    let raw = "---\npostDate: 2024-01-01\nurlPath: /elsewhere\nfilePath: /x.md\ntags: [a]\n---\n\n# A\n";
    let site = Site::new(&[("a.md", String::from(raw))]);

    let first = compiler();
    let registry = site.load(first.clone()).unwrap();
    let fresh = registry.outputs()["/a.md"].clone();
    assert_eq!(first.compilations(), 1);
    assert_eq!(fresh.metadata.url_path, "/a");
    assert_eq!(fresh.metadata.file_path, "/a.md");
    assert!(!fresh.fragment.contains("/elsewhere"));

    let module = registry.index_module().unwrap();
    assert_eq!(module.matches("\"urlPath\"").count(), 1);
    assert_eq!(module.matches("\"filePath\"").count(), 1);

    let second = compiler();
    let reloaded = site.load(second.clone()).unwrap();
    assert_eq!(second.compilations(), 0);
    assert_eq!(reloaded.outputs()["/a.md"], fresh);
}

#[test]
fn test_url_path_conflict_fails_before_compiling() {
    let site = Site::new(&[
        ("notes.md", doc("Notes", "2024-01-01", None)),
        ("notes/index.md", doc("Notes index", "2024-01-02", None)),
    ]);

    let compiler = compiler();
    match site.load(compiler.clone()) {
        Err(RegistryError::UrlPathConflict { url_path, .. }) => assert_eq!(url_path, "/notes"),
        Err(other) => panic!("expected a URL path conflict, got {other}"),
        Ok(_) => panic!("expected a URL path conflict"),
    }
    assert_eq!(compiler.compilations(), 0);
}

#[test]
fn test_post_order_checks() {
    let missing = Site::new(&[
        ("a.md", doc("A", "2024-01-01", Some(1))),
        ("b.md", doc("B", "2024-01-01", None)),
    ]);
    assert!(matches!(
        missing.load(compiler()),
        Err(RegistryError::Meta(MetaError::MissingPostOrder { .. }))
    ));

    let conflict = Site::new(&[
        ("a.md", doc("A", "2024-01-01", Some(1))),
        ("b.md", doc("B", "2024-01-01", Some(1))),
    ]);
    assert!(matches!(
        conflict.load(compiler()),
        Err(RegistryError::Meta(MetaError::PostOrderConflict { post_order: 1, .. }))
    ));

    let ordered = Site::new(&[
        ("a.md", doc("A", "2024-01-01", Some(1))),
        ("b.md", doc("B", "2024-01-01", Some(2))),
        ("c.md", doc("C", "2024-01-02", None)),
    ]);
    let registry = ordered.load(compiler()).unwrap();
    assert!(registry.check_invariants().is_ok());

    let index = registry.index_data();
    let urls: Vec<&str> = query_content_all(&index, None)
        .unwrap()
        .iter()
        .map(|meta| meta.url_path.as_str())
        .collect();
    assert_eq!(urls, vec!["/c", "/b", "/a"]);
}

#[test]
fn test_diagrams() {
    let site = Site::new(&[(
        "a.md",
        String::from(
            "---\npostDate: 2024-01-01\n---\n# A\n\n```dot {engine=\"neato\"}\ndigraph { a -> b }\n```\n",
        ),
    )]);
    let registry = site.load(compiler()).unwrap();
    let fragment = &registry.outputs()["/a.md"].fragment;

    assert!(fragment.contains("import GraphViz from \"~/components/markdown/GraphViz.vue\";"));
    assert!(fragment.contains("const graphviz1 = {\"dot\":\"digraph { a -> b }\\n\",\"engine\":\"neato\"};"));
    assert!(fragment.contains("<GraphViz :dot=\"graphviz1.dot\" :engine=\"graphviz1.engine\" />"));

    let bad = Site::new(&[(
        "a.md",
        String::from("---\npostDate: 2024-01-01\n---\n# A\n\n```dot {engine=\"nope\"}\ndigraph {}\n```\n"),
    )]);
    match bad.load(compiler()) {
        Err(RegistryError::Compile { file_path, source }) => {
            assert_eq!(file_path, "/a.md");
            assert_eq!(source, CompileError::InvalidEngine(String::from("nope")));
        }
        Err(other) => panic!("expected a compile error, got {other}"),
        Ok(_) => panic!("expected a compile error"),
    }
}

#[test]
fn test_relative_links_resolve_to_url_paths() {
    let site = Site::new(&[
        (
            "a/b.md",
            String::from(
                "---\npostDate: 2024-01-01\n---\n# B\n\nSee [foo](./foo.md#usage) and [up](../index.md).\n",
            ),
        ),
        ("a/foo.md", doc("Foo", "2024-01-02", None)),
        ("index.md", doc("Home", "2024-01-03", None)),
    ]);
    let registry = site.load(compiler()).unwrap();
    let fragment = &registry.outputs()["/a/b.md"].fragment;

    assert!(fragment.contains("<XLink href=\"/a/foo#usage\">foo</XLink>"));
    assert!(fragment.contains("<XLink href=\"/\">up</XLink>"));
}

#[test]
fn test_failed_compile_keeps_previous_output() {
    let site = Site::new(&[("a.md", doc("A", "2024-01-01", None))]);
    let mut registry = site.load(compiler()).unwrap();
    let before = registry.outputs()["/a.md"].clone();

    let result = registry.compile("/a.md", "no title here\n");
    assert!(matches!(
        result,
        Err(RegistryError::Compile {
            source: CompileError::MissingTitle(_),
            ..
        })
    ));
    assert_eq!(registry.outputs()["/a.md"], before);
}

#[test]
fn test_routes() {
    let site = Site::new(&[
        ("about.md", doc("About", "2024-01-01", None)),
        ("articles/x.md", doc("X", "2024-01-02", None)),
    ]);
    let registry = site.load(compiler()).unwrap();

    let routes = registry.routes(&["/search"]).unwrap();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].url_path, "/about");
    assert_eq!(routes[0].file, site.content().join("about.md"));

    assert!(matches!(
        registry.routes(&["/about"]),
        Err(RegistryError::UrlPathConflict { .. })
    ));
}
