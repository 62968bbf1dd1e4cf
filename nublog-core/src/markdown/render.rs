//! Render tree: output-shaped nodes, lowering from the source tree, and
//! serialization to markup.

use super::source::{SourceKind, SourceNode};
use super::tree::TreeNode;
use crate::slug::slugify;
use pulldown_cmark::Alignment;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Root(Vec<RenderNode>),
    Element(Element),
    Text(String),
    /// Markup emitted verbatim (inline HTML, highlighter and math output)
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    /// Attributes in emission order; an empty value serializes as a bare name
    pub attrs: Vec<(String, String)>,
    pub children: Vec<RenderNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<RenderNode>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        RenderNode::text_content_of(&self.children)
    }

    pub fn into_node(self) -> RenderNode {
        RenderNode::Element(self)
    }
}

impl RenderNode {
    pub fn text(value: impl Into<String>) -> Self {
        RenderNode::Text(value.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            RenderNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            RenderNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.as_element().is_some_and(|el| el.tag == tag)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    pub fn text_content_of(nodes: &[RenderNode]) -> String {
        let mut out = String::new();
        for node in nodes {
            node.collect_text(&mut out);
        }
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            RenderNode::Text(s) => out.push_str(s),
            RenderNode::Raw(_) => {}
            RenderNode::Root(children) | RenderNode::Element(Element { children, .. }) => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl TreeNode for RenderNode {
    fn children(&self) -> &[Self] {
        match self {
            RenderNode::Root(children) | RenderNode::Element(Element { children, .. }) => children,
            RenderNode::Text(_) | RenderNode::Raw(_) => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Self>> {
        match self {
            RenderNode::Root(children) | RenderNode::Element(Element { children, .. }) => {
                Some(children)
            }
            RenderNode::Text(_) | RenderNode::Raw(_) => None,
        }
    }
}

/// Localized text placed into the generated footnote section.
#[derive(Debug, Clone)]
pub struct LowerOptions {
    pub footnote_heading: String,
    pub footnote_backref_label: String,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            footnote_heading: String::from("Footnotes"),
            footnote_backref_label: String::from("Back to content"),
        }
    }
}

/// Id prefixes of the footnote section before localization.
pub const FOOTNOTE_ID_PREFIX: &str = "user-content-fn-";
pub const FOOTNOTE_REF_ID_PREFIX: &str = "user-content-fnref-";
pub const FOOTNOTE_LABEL_ID: &str = "footnote-label";

/// Lower a source tree into a render tree.
///
/// Structure is mapped one-to-one; the only reshaping is that footnote
/// definitions leave the flow and are gathered, in first-reference order,
/// into a trailing `section[data-footnotes]`.
pub fn lower(root: &SourceNode, options: &LowerOptions) -> RenderNode {
    let mut definitions = HashMap::new();
    collect_definitions(root, &mut definitions);

    let mut lowerer = Lowerer {
        options,
        definitions,
        order: Vec::new(),
        ref_counts: HashMap::new(),
    };

    let mut children = lowerer.lower_blocks(&root.children);
    if let Some(section) = lowerer.footnote_section() {
        if !children.is_empty() {
            children.push(RenderNode::text("\n"));
        }
        children.push(section);
    }
    RenderNode::Root(children)
}

fn collect_definitions<'a>(node: &'a SourceNode, out: &mut HashMap<String, &'a SourceNode>) {
    for child in &node.children {
        match &child.kind {
            SourceKind::FootnoteDefinition(label) => {
                out.entry(label.clone()).or_insert(child);
            }
            _ => collect_definitions(child, out),
        }
    }
}

struct Lowerer<'a> {
    options: &'a LowerOptions,
    definitions: HashMap<String, &'a SourceNode>,
    /// Labels in first-reference order
    order: Vec<String>,
    ref_counts: HashMap<String, usize>,
}

impl<'a> Lowerer<'a> {
    /// Lower block children, separating siblings with newlines.
    fn lower_blocks(&mut self, nodes: &[SourceNode]) -> Vec<RenderNode> {
        let mut out = Vec::new();
        for node in nodes {
            let lowered = self.lower_node(node);
            if lowered.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(RenderNode::text("\n"));
            }
            out.extend(lowered);
        }
        out
    }

    fn lower_inlines(&mut self, nodes: &[SourceNode]) -> Vec<RenderNode> {
        nodes.iter().flat_map(|n| self.lower_node(n)).collect()
    }

    fn element(&mut self, tag: &str, node: &SourceNode, block: bool) -> Vec<RenderNode> {
        let children = if block {
            self.lower_blocks(&node.children)
        } else {
            self.lower_inlines(&node.children)
        };
        vec![Element::new(tag).with_children(children).into_node()]
    }

    fn lower_node(&mut self, node: &SourceNode) -> Vec<RenderNode> {
        match &node.kind {
            SourceKind::Root => self.lower_blocks(&node.children),
            SourceKind::FrontMatter(_) | SourceKind::FootnoteDefinition(_) => Vec::new(),
            SourceKind::Paragraph => self.element("p", node, false),
            SourceKind::Heading(level) => self.element(&format!("h{}", level), node, false),
            SourceKind::BlockQuote => self.element("blockquote", node, true),
            SourceKind::CodeBlock { lang, meta, value } => {
                let mut code = Element::new("code");
                if let Some(lang) = lang {
                    code.set_attr("class", format!("language-{}", lang));
                }
                if let Some(meta) = meta {
                    code.set_attr("data-meta", meta.as_str());
                }
                code.children.push(RenderNode::text(value.as_str()));
                vec![Element::new("pre")
                    .with_children(vec![code.into_node()])
                    .into_node()]
            }
            SourceKind::HtmlBlock => self.lower_inlines(&node.children),
            SourceKind::List(start) => {
                let mut list = match start {
                    None => Element::new("ul"),
                    Some(1) => Element::new("ol"),
                    Some(n) => Element::new("ol").with_attr("start", n.to_string()),
                };
                if node.children.iter().any(is_task_item) {
                    list.set_attr("class", "contains-task-list");
                }
                list.children = self.lower_blocks(&node.children);
                vec![list.into_node()]
            }
            SourceKind::Item => {
                let mut item = Element::new("li");
                if is_task_item(node) {
                    item.set_attr("class", "task-list-item");
                }
                item.children = if node.children.iter().any(is_block) {
                    self.lower_blocks(&node.children)
                } else {
                    self.lower_inlines(&node.children)
                };
                vec![item.into_node()]
            }
            SourceKind::Table(alignments) => vec![self.lower_table(node, alignments)],
            // Only reachable through `lower_table`
            SourceKind::TableHead | SourceKind::TableRow | SourceKind::TableCell => {
                self.lower_inlines(&node.children)
            }
            SourceKind::DefinitionList => self.element("dl", node, true),
            SourceKind::DefinitionTitle => self.element("dt", node, false),
            SourceKind::DefinitionDetails => self.element("dd", node, false),
            SourceKind::Emphasis => self.element("em", node, false),
            SourceKind::Strong => self.element("strong", node, false),
            SourceKind::Strikethrough => self.element("del", node, false),
            SourceKind::Superscript => self.element("sup", node, false),
            SourceKind::Subscript => self.element("sub", node, false),
            SourceKind::Link { url, title } => {
                let mut a = Element::new("a").with_attr("href", url.as_str());
                if !title.is_empty() {
                    a.set_attr("title", title.as_str());
                }
                a.children = self.lower_inlines(&node.children);
                vec![a.into_node()]
            }
            SourceKind::Image { url, title } => {
                let mut img = Element::new("img")
                    .with_attr("src", url.as_str())
                    .with_attr("alt", node.plain_text());
                if !title.is_empty() {
                    img.set_attr("title", title.as_str());
                }
                vec![img.into_node()]
            }
            SourceKind::Text(text) => vec![RenderNode::text(text.as_str())],
            SourceKind::Code(code) => vec![Element::new("code")
                .with_children(vec![RenderNode::text(code.as_str())])
                .into_node()],
            SourceKind::Html(html) => vec![RenderNode::Raw(html.clone())],
            SourceKind::InlineMath(math) => vec![math_node(math, "math-inline")],
            SourceKind::DisplayMath(math) => vec![math_node(math, "math-display")],
            SourceKind::FootnoteReference(label) => vec![self.footnote_reference(label)],
            SourceKind::SoftBreak => vec![RenderNode::text("\n")],
            SourceKind::HardBreak => vec![Element::new("br").into_node(), RenderNode::text("\n")],
            SourceKind::Rule => vec![Element::new("hr").into_node()],
            SourceKind::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if *checked {
                    input.set_attr("checked", "");
                }
                vec![input.into_node(), RenderNode::text(" ")]
            }
        }
    }

    fn lower_table(&mut self, table: &SourceNode, alignments: &[Alignment]) -> RenderNode {
        let mut head = Vec::new();
        let mut body = Vec::new();

        for part in &table.children {
            match part.kind {
                SourceKind::TableHead => {
                    let row = self.lower_row(&part.children, alignments, "th");
                    head.push(row);
                }
                SourceKind::TableRow => {
                    if !body.is_empty() {
                        body.push(RenderNode::text("\n"));
                    }
                    body.push(self.lower_row(&part.children, alignments, "td"));
                }
                _ => {}
            }
        }

        let mut sections = vec![Element::new("thead").with_children(head).into_node()];
        if !body.is_empty() {
            sections.push(RenderNode::text("\n"));
            sections.push(Element::new("tbody").with_children(body).into_node());
        }
        Element::new("table").with_children(sections).into_node()
    }

    fn lower_row(&mut self, cells: &[SourceNode], alignments: &[Alignment], tag: &str) -> RenderNode {
        let cells = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let mut el = Element::new(tag);
                if let Some(align) = alignments.get(i).and_then(|a| alignment_name(*a)) {
                    el.set_attr("align", align);
                }
                el.children = self.lower_inlines(&cell.children);
                el.into_node()
            })
            .collect();
        Element::new("tr").with_children(cells).into_node()
    }

    fn footnote_reference(&mut self, label: &str) -> RenderNode {
        if !self.definitions.contains_key(label) {
            return RenderNode::text(format!("[^{}]", label));
        }

        if !self.order.iter().any(|l| l == label) {
            self.order.push(label.to_string());
        }
        let number = self.order.iter().position(|l| l == label).map_or(0, |i| i + 1);
        let id = footnote_id(label, number);

        let count = self.ref_counts.entry(label.to_string()).or_insert(0);
        *count += 1;
        let ref_id = match *count {
            1 => format!("{}{}", FOOTNOTE_REF_ID_PREFIX, id),
            n => format!("{}{}-{}", FOOTNOTE_REF_ID_PREFIX, id, n),
        };

        let anchor = Element::new("a")
            .with_attr("href", format!("#{}{}", FOOTNOTE_ID_PREFIX, id))
            .with_attr("id", ref_id)
            .with_attr("data-footnote-ref", "")
            .with_attr("aria-describedby", FOOTNOTE_LABEL_ID)
            .with_children(vec![RenderNode::text(number.to_string())]);

        Element::new("sup")
            .with_children(vec![anchor.into_node()])
            .into_node()
    }

    fn footnote_section(&mut self) -> Option<RenderNode> {
        if self.order.is_empty() {
            return None;
        }

        let mut items = Vec::new();
        // definitions may reference further footnotes, which extends `order`
        let mut i = 0;
        while i < self.order.len() {
            let label = self.order[i].clone();
            i += 1;
            let Some(definition) = self.definitions.get(label.as_str()).copied() else {
                continue;
            };

            let id = footnote_id(&label, i);
            let mut content = self.lower_blocks(&definition.children);
            let backrefs = self.backrefs(&label, &id);
            match content.last_mut().and_then(RenderNode::as_element_mut) {
                Some(last) if last.tag == "p" => last.children.extend(backrefs),
                _ => content.extend(backrefs),
            }

            if !items.is_empty() {
                items.push(RenderNode::text("\n"));
            }
            items.push(
                Element::new("li")
                    .with_attr("id", format!("{}{}", FOOTNOTE_ID_PREFIX, id))
                    .with_children(content)
                    .into_node(),
            );
        }

        let heading = Element::new("h2")
            .with_attr("id", FOOTNOTE_LABEL_ID)
            .with_attr("class", "sr-only")
            .with_children(vec![RenderNode::text(self.options.footnote_heading.as_str())]);

        Some(
            Element::new("section")
                .with_attr("data-footnotes", "")
                .with_attr("class", "footnotes")
                .with_children(vec![
                    heading.into_node(),
                    RenderNode::text("\n"),
                    Element::new("ol").with_children(items).into_node(),
                ])
                .into_node(),
        )
    }

    fn backrefs(&self, label: &str, id: &str) -> Vec<RenderNode> {
        let count = self.ref_counts.get(label).copied().unwrap_or(1);
        (1..=count)
            .flat_map(|n| {
                let mut href = format!("#{}{}", FOOTNOTE_REF_ID_PREFIX, id);
                let mut children = vec![RenderNode::text("↩")];
                if n > 1 {
                    href = format!("{}-{}", href, n);
                    children.push(
                        Element::new("sup")
                            .with_children(vec![RenderNode::text(n.to_string())])
                            .into_node(),
                    );
                }
                let anchor = Element::new("a")
                    .with_attr("href", href)
                    .with_attr("data-footnote-backref", "")
                    .with_attr("aria-label", self.options.footnote_backref_label.as_str())
                    .with_attr("class", "data-footnote-backref")
                    .with_children(children);
                [RenderNode::text(" "), anchor.into_node()]
            })
            .collect()
    }
}

fn footnote_id(label: &str, number: usize) -> String {
    let id = slugify(label);
    if id.is_empty() {
        number.to_string()
    } else {
        id
    }
}

fn math_node(source: &str, class: &str) -> RenderNode {
    Element::new("span")
        .with_attr("class", format!("math {}", class))
        .with_children(vec![RenderNode::text(source)])
        .into_node()
}

fn alignment_name(alignment: Alignment) -> Option<&'static str> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some("left"),
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
    }
}

fn is_task_item(node: &SourceNode) -> bool {
    node.kind == SourceKind::Item
        && node
            .children
            .iter()
            .any(|c| matches!(c.kind, SourceKind::TaskListMarker(_)))
}

fn is_block(node: &SourceNode) -> bool {
    matches!(
        node.kind,
        SourceKind::Paragraph
            | SourceKind::Heading(_)
            | SourceKind::BlockQuote
            | SourceKind::CodeBlock { .. }
            | SourceKind::HtmlBlock
            | SourceKind::List(_)
            | SourceKind::Table(_)
            | SourceKind::Rule
    )
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Serialize a render tree to markup.
///
/// Components (tags starting with an uppercase letter) without children are
/// written self-closing.
pub fn to_html(node: &RenderNode) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &RenderNode, out: &mut String) {
    match node {
        RenderNode::Root(children) => children.iter().for_each(|c| write_node(c, out)),
        RenderNode::Text(text) => escape_text(text, out),
        RenderNode::Raw(raw) => out.push_str(raw),
        RenderNode::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in &el.attrs {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
            }

            if VOID_ELEMENTS.contains(&el.tag.as_str()) {
                out.push('>');
                return;
            }
            let is_component = el.tag.starts_with(|c: char| c.is_ascii_uppercase());
            if is_component && el.children.is_empty() {
                out.push_str(" />");
                return;
            }

            out.push('>');
            el.children.iter().for_each(|c| write_node(c, out));
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
