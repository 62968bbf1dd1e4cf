//! Code syntax highlighting using syntect.

use super::render::{Element, RenderNode};
use super::tree::{TreeNode, Visit};
use crate::error::CompileError;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::debug;

/// Grammar used when a block names no language.
pub const PLAIN_TEXT: &str = "txt";

/// Tags that name a grammar under a different token.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("shell", "bash"),
    ("console", "bash"),
    ("zsh", "bash"),
    ("c++", "cpp"),
    ("dockerfile", "docker"),
    ("plaintext", PLAIN_TEXT),
    ("text", PLAIN_TEXT),
];

/// External highlighter: turns code into a styled `pre > code` subtree.
pub trait Highlighter {
    fn highlight(&self, code: &str, lang: &str) -> Result<RenderNode, CompileError>;
}

pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntectHighlighter {
    /// Load the bundled grammars and the named theme.
    pub fn new(theme_name: &str) -> Result<Self, CompileError> {
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(theme_name)
            .ok_or_else(|| CompileError::Highlight(format!("unknown theme `{}`", theme_name)))?;

        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Result<RenderNode, CompileError> {
        let ss = &self.syntax_set;
        let syntax = match ss
            .find_syntax_by_token(lang)
            .or_else(|| ss.find_syntax_by_extension(lang))
        {
            Some(syntax) => syntax,
            None => {
                debug!("No grammar for `{}`, highlighting as plain text", lang);
                ss.find_syntax_plain_text()
            }
        };

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut html = String::new();
        for line in LinesWithEndings::from(code) {
            let regions = highlighter
                .highlight_line(line, ss)
                .map_err(|e| CompileError::Highlight(e.to_string()))?;
            let line_html = styled_line_to_highlighted_html(&regions[..], IncludeBackground::No)
                .map_err(|e| CompileError::Highlight(e.to_string()))?;
            html.push_str(&line_html);
        }

        let code = Element::new("code")
            .with_attr("class", format!("language-{}", lang))
            .with_children(vec![RenderNode::Raw(html)]);

        let mut pre = Element::new("pre").with_attr("class", "syntect");
        if let Some(bg) = self.theme.settings.background {
            pre.set_attr(
                "style",
                format!("background-color:#{:02x}{:02x}{:02x};", bg.r, bg.g, bg.b),
            );
        }
        pre.children.push(code.into_node());
        Ok(pre.into_node())
    }
}

/// The `code` element of a `pre > code` block.
pub(crate) fn code_block(node: &RenderNode) -> Option<&Element> {
    let pre = node.as_element().filter(|el| el.tag == "pre")?;
    pre.children
        .iter()
        .find_map(RenderNode::as_element)
        .filter(|el| el.tag == "code")
}

/// Language named by `data-language`, or else by a `language-*` class.
pub(crate) fn find_language(code: &Element) -> Option<String> {
    if let Some(lang) = code.attr("data-language").filter(|l| !l.is_empty()) {
        return Some(lang.to_string());
    }
    code.classes()
        .find_map(|class| class.strip_prefix("language-"))
        .map(str::to_string)
}

/// Map a block's language tag onto the grammar token the highlighter knows.
pub(crate) fn normalize_language(lang: Option<&str>) -> String {
    let Some(lang) = lang else {
        return String::from(PLAIN_TEXT);
    };
    let lang = lang.to_ascii_lowercase();
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lang)
        .map_or(lang, |(_, target)| target.to_string())
}

/// Pipeline stage: replace every remaining code block with highlighted markup.
///
/// The highlighter's inline style is dropped and the `code` element is marked
/// `v-pre` so its text is never read as template syntax.
pub fn highlight_code_blocks(
    tree: &mut RenderNode,
    highlighter: &dyn Highlighter,
) -> Result<(), CompileError> {
    tree.try_walk_mut(&mut |node| {
        let Some(code) = code_block(node) else {
            return Ok(Visit::Continue);
        };
        let lang = normalize_language(find_language(code).as_deref());
        let source = code.text_content();

        let mut replacement = highlighter.highlight(&source, &lang)?;
        if let Some(pre) = replacement.as_element_mut() {
            pre.remove_attr("style");
            if let Some(code) = pre.children.iter_mut().find_map(RenderNode::as_element_mut) {
                code.set_attr("v-pre", "");
            }
        }

        *node = replacement;
        Ok(Visit::Skip)
    })
}
