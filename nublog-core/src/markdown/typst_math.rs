//! Typst-based math rendering to inline SVG.

use std::{
    num::NonZeroUsize,
    sync::{Mutex, PoisonError},
};

use super::math::MathRenderer;
use anyhow::{anyhow, Result};
use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use typst::diag::SourceDiagnostic;
use typst::layout::{Abs, PagedDocument};
use typst_as_lib::TypstEngine;

const MATH_CACHE_CAPACITY: usize = 512;

/// Renders math spans written in Typst syntax to SVG.
///
/// Rendered output is kept in an LRU keyed by the span source, so repeated
/// formulas across documents compile once.
#[derive(Debug)]
pub struct TypstMathRenderer {
    fonts: Vec<&'static [u8]>,
    preamble: Option<String>,
    cache: Mutex<LruCache<(String, bool), String>>,
}

impl TypstMathRenderer {
    pub fn new(preamble: Option<String>) -> Self {
        let capacity = NonZeroUsize::new(MATH_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            fonts: typst_assets::fonts().collect(),
            preamble,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn compile_svg(&self, math: &str, display: bool) -> Result<String> {
        let source = build_source(math, display, self.preamble.as_deref());
        let engine = TypstEngine::builder()
            .main_file(source)
            .fonts(self.fonts.iter().copied())
            .build();

        let warned = engine.compile::<PagedDocument>();
        log_warnings(&warned.warnings);
        let doc = warned
            .output
            .map_err(|err| anyhow!("Typst math compilation failed: {err}"))?;

        // small padding so strokes at the edges survive
        let svg = typst_svg::svg_merged(&doc, Abs::pt(0.5));
        Ok(hide_from_a11y(&current_color(&svg)))
    }
}

impl Default for TypstMathRenderer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MathRenderer for TypstMathRenderer {
    fn render(&self, math: &str, display: bool) -> Result<String> {
        let key = (math.to_string(), display);
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();

        let svg = match cached {
            Some(svg) => svg,
            None => {
                let svg = self.compile_svg(math, display)?;
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .put(key, svg.clone());
                svg
            }
        };

        Ok(wrap_svg(&svg, math, display))
    }
}

fn build_source(math: &str, display: bool, preamble: Option<&str>) -> String {
    // display equations need the spaced `$ .. $` form
    let math = if display {
        format!("$ {} $", math.trim())
    } else {
        format!("${}$", math.trim())
    };
    let preamble = preamble.unwrap_or_default();
    format!(
        r#"
#set page(width: auto, height: auto, margin: 0pt, fill: none)
#set text(font: "New Computer Modern", size: 15pt, fill: black)
#set math.equation(numbering: none)

{preamble}

{math}
"#
    )
}

fn wrap_svg(svg: &str, math: &str, display: bool) -> String {
    let alt = attr_escape(math);
    let layout = if display { "typst-display" } else { "typst-inline" };
    format!(
        r#"<span class="typst-math {layout}" role="math" aria-label="{alt}">{svg}</span>"#
    )
}

fn attr_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn log_warnings(warnings: &[SourceDiagnostic]) {
    for warning in warnings {
        warn!("Typst warning: {}", warning.message);
    }
}

/// Black fills and strokes follow the surrounding text color instead.
fn current_color(svg: &str) -> String {
    static BLACK_ATTR: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?i)(fill|stroke)=["']\s*(black|#000(?:000)?)\s*["']"#)
            .expect("valid color attribute regex")
    });
    BLACK_ATTR
        .replace_all(svg, r#"$1="currentColor""#)
        .into_owned()
}

fn hide_from_a11y(svg: &str) -> String {
    if svg.contains("aria-hidden") {
        return svg.to_string();
    }
    svg.replacen("<svg ", "<svg aria-hidden=\"true\" ", 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_becomes_current_color() {
        let out = current_color(r##"<svg><path fill="black" stroke="#000"/></svg>"##);
        assert_eq!(
            out,
            r#"<svg><path fill="currentColor" stroke="currentColor"/></svg>"#
        );
    }

    #[test]
    fn test_svg_hidden_from_a11y_once() {
        let out = hide_from_a11y(r#"<svg width="10"></svg>"#);
        assert_eq!(out, r#"<svg aria-hidden="true" width="10"></svg>"#);
        assert_eq!(hide_from_a11y(&out), out);
    }

    #[test]
    fn test_wrapper_escapes_source() {
        let html = wrap_svg("<svg></svg>", "a < b", false);
        assert!(html.starts_with(r#"<span class="typst-math typst-inline" role="math" aria-label="a &lt; b">"#));
    }

    #[test]
    fn test_source_delimiters() {
        assert!(build_source("x^2", false, None).contains("\n$x^2$\n"));
        assert!(build_source(" sum_i i ", true, Some("#let k = 1")).contains("#let k = 1"));
        assert!(build_source("sum_i i", true, None).contains("$ sum_i i $"));
    }

    #[test]
    fn test_render_inline_math() {
        let renderer = TypstMathRenderer::default();
        let html = renderer.render("x^2", false).unwrap();
        assert!(html.contains("<svg"));
        assert!(html.contains("typst-inline"));

        // second call is served from the cache
        assert_eq!(renderer.render("x^2", false).unwrap(), html);
    }

    #[test]
    fn test_cache_keeps_inline_and_display_apart() {
        let renderer = TypstMathRenderer::default();
        let inline = renderer.render("x", false).unwrap();
        let display = renderer.render("x", true).unwrap();
        assert!(inline.contains("typst-inline"));
        assert!(display.contains("typst-display"));

        let cache = renderer.cache.lock().unwrap();
        assert!(cache.contains(&(String::from("x"), false)));
        assert!(cache.contains(&(String::from("x"), true)));
    }

    #[test]
    fn test_render_failure_is_an_error() {
        let renderer = TypstMathRenderer::default();
        assert!(renderer.render("#undefined_function()", false).is_err());
    }
}
