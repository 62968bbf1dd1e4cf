//! Source tree: block/inline structure parsed from raw text.
//!
//! The tree is assembled from the pulldown-cmark event stream. Adjacent text
//! events are merged so that a run of plain text is always a single node.

use super::tree::TreeNode;
use crate::error::CompileError;
use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Root,
    /// Raw text of the leading YAML block
    FrontMatter(String),
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock {
        lang: Option<String>,
        meta: Option<String>,
        value: String,
    },
    HtmlBlock,
    List(Option<u64>),
    Item,
    Table(Vec<Alignment>),
    TableHead,
    TableRow,
    TableCell,
    FootnoteDefinition(String),
    DefinitionList,
    DefinitionTitle,
    DefinitionDetails,
    Emphasis,
    Strong,
    Strikethrough,
    Superscript,
    Subscript,
    Link {
        url: String,
        title: String,
    },
    Image {
        url: String,
        title: String,
    },
    Text(String),
    Code(String),
    Html(String),
    InlineMath(String),
    DisplayMath(String),
    FootnoteReference(String),
    SoftBreak,
    HardBreak,
    Rule,
    TaskListMarker(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceNode {
    pub kind: SourceKind,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(kind: SourceKind, children: Vec<SourceNode>) -> Self {
        Self { kind, children }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(SourceKind::Text(value.into()))
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            SourceKind::Heading(level) => Some(level),
            _ => None,
        }
    }

    /// Concatenated plain text of this node (image alt text excluded).
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            SourceKind::Text(s)
            | SourceKind::Code(s)
            | SourceKind::InlineMath(s)
            | SourceKind::DisplayMath(s) => out.push_str(s),
            SourceKind::SoftBreak | SourceKind::HardBreak => out.push(' '),
            SourceKind::Image { .. } => {}
            _ => {
                for child in &self.children {
                    child.collect_text(out);
                }
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(SourceNode {
            kind: SourceKind::Text(last),
            ..
        }) = self.children.last_mut()
        {
            last.push_str(text);
            return;
        }
        self.children.push(SourceNode::text(text));
    }
}

impl TreeNode for SourceNode {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        Some(&mut self.children)
    }
}

/// Parser capabilities enabled for every document.
pub fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Parse raw text into a source tree rooted at [`SourceKind::Root`].
pub fn parse(markdown: &str, options: Options) -> Result<SourceNode, CompileError> {
    let mut stack = vec![SourceNode::new(SourceKind::Root)];

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(tag) => stack.push(SourceNode::new(start_kind(tag))),
            Event::End(end) => {
                if stack.len() < 2 {
                    return Err(CompileError::Parse(format!(
                        "unbalanced end event {:?}",
                        end
                    )));
                }
                if let Some(node) = stack.pop() {
                    top(&mut stack).children.push(node);
                }
            }
            Event::Text(text) => {
                let current = top(&mut stack);
                match &mut current.kind {
                    SourceKind::CodeBlock { value, .. } | SourceKind::FrontMatter(value) => {
                        value.push_str(&text)
                    }
                    _ => current.push_text(&text),
                }
            }
            Event::Code(code) => leaf(&mut stack, SourceKind::Code(code.to_string())),
            Event::Html(html) | Event::InlineHtml(html) => {
                leaf(&mut stack, SourceKind::Html(html.to_string()))
            }
            Event::InlineMath(math) => leaf(&mut stack, SourceKind::InlineMath(math.to_string())),
            Event::DisplayMath(math) => {
                leaf(&mut stack, SourceKind::DisplayMath(math.to_string()))
            }
            Event::FootnoteReference(label) => {
                leaf(&mut stack, SourceKind::FootnoteReference(label.to_string()))
            }
            Event::SoftBreak => leaf(&mut stack, SourceKind::SoftBreak),
            Event::HardBreak => leaf(&mut stack, SourceKind::HardBreak),
            Event::Rule => leaf(&mut stack, SourceKind::Rule),
            Event::TaskListMarker(checked) => leaf(&mut stack, SourceKind::TaskListMarker(checked)),
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(CompileError::Parse(String::from("unclosed block at end of input"))),
    }
}

fn top(stack: &mut [SourceNode]) -> &mut SourceNode {
    // The root is only popped after the event loop, so the stack is never empty here.
    let last = stack.len() - 1;
    &mut stack[last]
}

fn leaf(stack: &mut [SourceNode], kind: SourceKind) {
    top(stack).children.push(SourceNode::new(kind));
}

fn start_kind(tag: Tag<'_>) -> SourceKind {
    match tag {
        Tag::Paragraph => SourceKind::Paragraph,
        Tag::Heading { level, .. } => SourceKind::Heading(heading_level(level)),
        Tag::BlockQuote(_) => SourceKind::BlockQuote,
        Tag::CodeBlock(CodeBlockKind::Indented) => SourceKind::CodeBlock {
            lang: None,
            meta: None,
            value: String::new(),
        },
        Tag::CodeBlock(CodeBlockKind::Fenced(info)) => {
            let (lang, meta) = split_info_string(&info);
            SourceKind::CodeBlock {
                lang,
                meta,
                value: String::new(),
            }
        }
        Tag::HtmlBlock => SourceKind::HtmlBlock,
        Tag::List(start) => SourceKind::List(start),
        Tag::Item => SourceKind::Item,
        Tag::FootnoteDefinition(label) => SourceKind::FootnoteDefinition(label.to_string()),
        Tag::DefinitionList => SourceKind::DefinitionList,
        Tag::DefinitionListTitle => SourceKind::DefinitionTitle,
        Tag::DefinitionListDefinition => SourceKind::DefinitionDetails,
        Tag::Table(alignments) => SourceKind::Table(alignments),
        Tag::TableHead => SourceKind::TableHead,
        Tag::TableRow => SourceKind::TableRow,
        Tag::TableCell => SourceKind::TableCell,
        Tag::Emphasis => SourceKind::Emphasis,
        Tag::Strong => SourceKind::Strong,
        Tag::Strikethrough => SourceKind::Strikethrough,
        Tag::Superscript => SourceKind::Superscript,
        Tag::Subscript => SourceKind::Subscript,
        Tag::Link {
            dest_url, title, ..
        } => SourceKind::Link {
            url: dest_url.to_string(),
            title: title.to_string(),
        },
        Tag::Image {
            dest_url, title, ..
        } => SourceKind::Image {
            url: dest_url.to_string(),
            title: title.to_string(),
        },
        Tag::MetadataBlock(_) => SourceKind::FrontMatter(String::new()),
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Split a fence info string into its language tag and the trailing annotation.
fn split_info_string(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    let (lang, meta) = match info.find(char::is_whitespace) {
        Some(pos) => (&info[..pos], info[pos..].trim()),
        None => (info, ""),
    };
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    (non_empty(lang), non_empty(meta))
}
