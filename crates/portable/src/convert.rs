//! Conversion between the editor document and HTML.
//!
//! Export is exact: every node kind has one HTML form. Import is repairing:
//! loose inline content becomes paragraphs, partial two-column markup is
//! completed and legacy two-column tables turn into layout containers.

use std::mem;

use manos_plate_core::{
    ALIGN_VALUES, Attrs, DIR_VALUES, Document, ElementKind, ElementNode, Marks, Node, VoidKind,
    VoidNode,
};
use serde_json::Value;

use crate::dom::{HtmlElement, HtmlNode, parse_fragment, serialize};
use crate::layout::{
    COLUMN_CLASS, CONTAINER_CLASS, LEFT_CLASS, RIGHT_CLASS, cells, is_div_container,
    is_two_col_table,
};

/// Carries an image's resolution key through pasted HTML.
pub const IMAGE_KEY_ATTR: &str = "data-image-key";

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

pub fn document_to_html(doc: &Document) -> String {
    serialize(&blocks_to_html(&doc.children))
}

pub fn html_to_document(html: &str) -> Document {
    Document {
        children: non_empty_blocks(nodes_to_blocks(&parse_fragment(html))),
    }
}

// Export

fn list_type_of(el: &ElementNode) -> &str {
    match el.attr_str("list_type") {
        Some("ordered") => "ordered",
        _ => "bulleted",
    }
}

pub fn blocks_to_html(blocks: &[Node]) -> Vec<HtmlNode> {
    let mut out = Vec::new();
    let mut ix = 0;
    while ix < blocks.len() {
        if let Node::Element(first) = &blocks[ix] {
            if first.kind == ElementKind::ListItem {
                let list_type = list_type_of(first);
                let mut items = Vec::new();
                while let Some(Node::Element(item)) = blocks.get(ix) {
                    if item.kind != ElementKind::ListItem || list_type_of(item) != list_type {
                        break;
                    }
                    items.push(HtmlNode::Element(element_to_html(item)));
                    ix += 1;
                }
                let tag = if list_type == "ordered" { "ol" } else { "ul" };
                out.push(HtmlElement::new(tag).with_children(items).into());
                continue;
            }
        }
        out.extend(block_to_html(&blocks[ix]));
        ix += 1;
    }
    out
}

fn block_to_html(node: &Node) -> Option<HtmlNode> {
    match node {
        Node::Element(el) => Some(element_to_html(el).into()),
        Node::Void(void) => void_to_html(void),
        Node::Text(_) => {
            let children = inline_to_html(std::slice::from_ref(node));
            Some(HtmlElement::new("p").with_children(children).into())
        }
    }
}

fn element_to_html(el: &ElementNode) -> HtmlElement {
    let mut html = match el.kind {
        ElementKind::Paragraph => HtmlElement::new("p").with_children(text_block_children(el)),
        ElementKind::Heading => {
            let level = el
                .attrs
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .clamp(1, 6);
            HtmlElement::new(format!("h{level}")).with_children(text_block_children(el))
        }
        ElementKind::ListItem => HtmlElement::new("li").with_children(text_block_children(el)),
        ElementKind::Blockquote => {
            HtmlElement::new("blockquote").with_children(blocks_to_html(&el.children))
        }
        ElementKind::TwoColContainer => HtmlElement::new("div")
            .with_attr("class", CONTAINER_CLASS)
            .with_children(blocks_to_html(&el.children)),
        ElementKind::TwoColLeft => HtmlElement::new("div")
            .with_attr("class", format!("{COLUMN_CLASS} {LEFT_CLASS}"))
            .with_children(blocks_to_html(&el.children)),
        ElementKind::TwoColRight => HtmlElement::new("div")
            .with_attr("class", format!("{COLUMN_CLASS} {RIGHT_CLASS}"))
            .with_children(blocks_to_html(&el.children)),
    };

    if let Some(dir) = el.attr_str("dir") {
        html.set_attr("dir", dir);
    }
    if let Some(align) = el.attr_str("align") {
        html.set_style_property("text-align", align);
    }
    html
}

fn text_block_children(el: &ElementNode) -> Vec<HtmlNode> {
    let children = inline_to_html(&el.children);
    if children.is_empty() {
        // Keeps empty lines visible in browsers.
        return vec![HtmlElement::new("br").into()];
    }
    children
}

fn void_to_html(void: &VoidNode) -> Option<HtmlNode> {
    match void.kind {
        VoidKind::Image => {
            let src = void.attr_str("src")?;
            let mut img = HtmlElement::new("img").with_attr("src", src);
            for name in ["alt", "title"] {
                if let Some(value) = void.attr_str(name) {
                    img.set_attr(name, value);
                }
            }
            Some(img.into())
        }
        VoidKind::HardBreak => Some(HtmlElement::new("br").into()),
    }
}

fn inline_to_html(children: &[Node]) -> Vec<HtmlNode> {
    let mut out = Vec::new();
    for child in children {
        match child {
            Node::Text(leaf) => {
                if leaf.text.is_empty() {
                    continue;
                }
                out.push(wrap_marks(HtmlNode::text(leaf.text.clone()), &leaf.marks));
            }
            Node::Void(void) => out.extend(void_to_html(void)),
            Node::Element(el) => out.push(element_to_html(el).into()),
        }
    }
    out
}

fn wrap_marks(mut node: HtmlNode, marks: &Marks) -> HtmlNode {
    let layers = [
        (marks.code, "code"),
        (marks.strikethrough, "s"),
        (marks.underline, "u"),
        (marks.italic, "em"),
        (marks.bold, "strong"),
    ];
    for (active, tag) in layers {
        if active {
            node = HtmlElement::new(tag).with_children(vec![node]).into();
        }
    }
    if let Some(url) = &marks.link {
        node = HtmlElement::new("a")
            .with_attr("href", url.clone())
            .with_children(vec![node])
            .into();
    }
    node
}

// Import

pub fn nodes_to_blocks(nodes: &[HtmlNode]) -> Vec<Node> {
    let mut importer = Importer::default();
    for node in nodes {
        importer.node(node, &Marks::default());
    }
    importer.finish()
}

fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

fn block_attrs(el: &HtmlElement) -> Attrs {
    let mut attrs = Attrs::default();
    let align = el
        .style_property("text-align")
        .or_else(|| el.attr("align").map(str::to_string))
        .map(|value| value.trim().to_ascii_lowercase());
    if let Some(align) = align {
        if ALIGN_VALUES.contains(&align.as_str()) && align != "left" {
            attrs.insert("align".to_string(), Value::String(align));
        }
    }
    if let Some(dir) = el.attr("dir").map(|d| d.trim().to_ascii_lowercase()) {
        if DIR_VALUES.contains(&dir.as_str()) {
            attrs.insert("dir".to_string(), Value::String(dir));
        }
    }
    attrs
}

fn image_from_html(el: &HtmlElement) -> Option<Node> {
    let src = el.attr("src").map(str::trim).filter(|src| !src.is_empty())?;
    let alt = el.attr("alt").map(str::to_string);
    let mut image = Node::image(src, alt);
    if let Node::Void(void) = &mut image {
        if let Some(title) = el.attr("title").filter(|t| !t.is_empty()) {
            void.attrs
                .insert("title".to_string(), Value::String(title.to_string()));
        }
        if let Some(key) = el.attr(IMAGE_KEY_ATTR).filter(|k| !k.is_empty()) {
            void.attrs
                .insert("key".to_string(), Value::String(key.to_string()));
        }
    }
    Some(image)
}

fn marks_for(el: &HtmlElement, marks: &Marks) -> Marks {
    let mut next = marks.clone();
    match el.tag.as_str() {
        "strong" | "b" => next.bold = true,
        "em" | "i" => next.italic = true,
        "u" => next.underline = true,
        "s" | "strike" | "del" => next.strikethrough = true,
        "code" => next.code = true,
        "a" => {
            if let Some(href) = el.attr("href").filter(|href| !href.is_empty()) {
                next.link = Some(href.to_string());
            }
        }
        _ => {}
    }

    for (name, value) in el.style() {
        let value = value.to_ascii_lowercase();
        match name.as_str() {
            "font-weight" if value == "bold" || value == "bolder" || value.starts_with('7') => {
                next.bold = true
            }
            "font-style" if value == "italic" => next.italic = true,
            "text-decoration" | "text-decoration-line" => {
                if value.contains("underline") {
                    next.underline = true;
                }
                if value.contains("line-through") {
                    next.strikethrough = true;
                }
            }
            _ => {}
        }
    }
    next
}

/// Collapses formatting whitespace (newlines, tabs) the way a browser
/// renders it. Plain spaces are kept as written.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for ch in text.chars() {
        if matches!(ch, ' ' | '\n' | '\t' | '\r' | '\x0c') {
            run.push(ch);
            continue;
        }
        flush_run(&mut out, &mut run);
        out.push(ch);
    }
    flush_run(&mut out, &mut run);
    out
}

fn flush_run(out: &mut String, run: &mut String) {
    if run.chars().any(|c| c != ' ') {
        out.push(' ');
    } else {
        out.push_str(run);
    }
    run.clear();
}

/// Trims whitespace at the block edges and drops a trailing line break, which
/// browsers do not render.
fn finish_inline(mut inline: Vec<Node>) -> Vec<Node> {
    if matches!(inline.last(), Some(Node::Void(v)) if v.kind == VoidKind::HardBreak) {
        inline.pop();
    }

    while let Some(Node::Text(first)) = inline.first_mut() {
        let trimmed = first.text.trim_start().to_string();
        if trimmed.is_empty() {
            inline.remove(0);
            continue;
        }
        first.text = trimmed;
        break;
    }
    while let Some(Node::Text(last)) = inline.last_mut() {
        let trimmed = last.text.trim_end().to_string();
        if trimmed.is_empty() {
            inline.pop();
            continue;
        }
        last.text = trimmed;
        break;
    }
    inline
}

fn text_block_node(kind: ElementKind, attrs: Attrs, mut children: Vec<Node>) -> Node {
    if children.is_empty() {
        children.push(Node::text("", Marks::default()));
    }
    Node::Element(ElementNode {
        kind,
        attrs,
        children,
    })
}

fn non_empty_blocks(mut blocks: Vec<Node>) -> Vec<Node> {
    if blocks.is_empty() {
        blocks.push(Node::paragraph(""));
    }
    blocks
}

struct Importer {
    blocks: Vec<Node>,
    inline: Vec<Node>,
    /// Kind and attributes given to flushed inline content.
    text_block: (ElementKind, Attrs),
}

impl Default for Importer {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            inline: Vec::new(),
            text_block: (ElementKind::Paragraph, Attrs::default()),
        }
    }
}

impl Importer {
    fn finish(mut self) -> Vec<Node> {
        self.flush_inline();
        self.blocks
    }

    fn flush_inline(&mut self) {
        let inline = finish_inline(mem::take(&mut self.inline));
        if inline.is_empty() {
            return;
        }
        let (kind, attrs) = self.text_block.clone();
        self.blocks.push(text_block_node(kind, attrs, inline));
    }

    fn node(&mut self, node: &HtmlNode, marks: &Marks) {
        match node {
            HtmlNode::Text(text) => {
                let text = collapse_whitespace(text);
                if !text.is_empty() {
                    self.inline.push(Node::text(text, marks.clone()));
                }
            }
            HtmlNode::Comment(_) => {}
            HtmlNode::Element(el) if is_block_tag(&el.tag) => {
                self.flush_inline();
                self.block(el);
            }
            HtmlNode::Element(el) => self.inline_element(el, marks),
        }
    }

    fn inline_element(&mut self, el: &HtmlElement, marks: &Marks) {
        match el.tag.as_str() {
            "br" => self.inline.push(Node::hard_break()),
            "img" => {
                if let Some(image) = image_from_html(el) {
                    self.flush_inline();
                    self.blocks.push(image);
                }
            }
            _ => {
                let marks = marks_for(el, marks);
                for child in &el.children {
                    self.node(child, &marks);
                }
            }
        }
    }

    /// Runs `el`'s children as the content of one text block of `kind`.
    fn run_text_block(&mut self, el: &HtmlElement, kind: ElementKind, attrs: Attrs) {
        self.flush_inline();
        let saved = mem::replace(&mut self.text_block, (kind, attrs));
        let blocks_before = self.blocks.len();

        for child in &el.children {
            self.node(child, &Marks::default());
        }

        let inline = finish_inline(mem::take(&mut self.inline));
        if !inline.is_empty() || self.blocks.len() == blocks_before {
            let (kind, attrs) = self.text_block.clone();
            self.blocks.push(text_block_node(kind, attrs, inline));
        }
        self.text_block = saved;
    }

    fn block(&mut self, el: &HtmlElement) {
        let tag = el.tag.as_str();
        match tag {
            "p" | "pre" | "dt" | "dd" | "figcaption" => {
                // `<li><p>..</p></li>` keeps producing list items.
                let (kind, attrs) = if self.text_block.0 == ElementKind::ListItem {
                    self.text_block.clone()
                } else {
                    (ElementKind::Paragraph, block_attrs(el))
                };
                self.run_text_block(el, kind, attrs)
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = u64::from(tag.as_bytes()[1] - b'0');
                let mut attrs = block_attrs(el);
                attrs.insert("level".to_string(), Value::from(level));
                self.run_text_block(el, ElementKind::Heading, attrs);
            }
            "ul" | "ol" => {
                let list_type = if tag == "ol" { "ordered" } else { "bulleted" };
                for child in &el.children {
                    match child {
                        HtmlNode::Element(item) if item.tag == "li" => self.list_item(item, list_type),
                        other => self.node(other, &Marks::default()),
                    }
                }
                self.flush_inline();
            }
            "li" => self.list_item(el, "bulleted"),
            "blockquote" => {
                let children = non_empty_blocks(nodes_to_blocks(&el.children));
                let mut attrs = Attrs::default();
                if let Some(dir) = block_attrs(el).remove("dir") {
                    attrs.insert("dir".to_string(), dir);
                }
                self.blocks.push(Node::Element(ElementNode {
                    kind: ElementKind::Blockquote,
                    attrs,
                    children,
                }));
            }
            "hr" => {}
            "div" if is_div_container(el) => self.blocks.push(container_from_div(el)),
            "table" if is_two_col_table(el) => {
                for row in table_rows(el) {
                    self.blocks.push(container_from_row(row));
                }
            }
            "table" => {
                for row in table_rows(el) {
                    for cell in cells(row) {
                        self.blocks.extend(nodes_to_blocks(&cell.children));
                    }
                }
            }
            _ => {
                for child in &el.children {
                    self.node(child, &Marks::default());
                }
                self.flush_inline();
            }
        }
    }

    fn list_item(&mut self, item: &HtmlElement, list_type: &str) {
        let mut attrs = block_attrs(item);
        attrs.insert("list_type".to_string(), Value::String(list_type.to_string()));
        self.run_text_block(item, ElementKind::ListItem, attrs);
    }
}

fn table_rows(table: &HtmlElement) -> Vec<&HtmlElement> {
    let mut rows = Vec::new();
    for child in table.element_children() {
        match child.tag.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child.element_children().filter(|el| el.tag == "tr"))
            }
            _ => {}
        }
    }
    rows
}

fn column(kind: ElementKind, attrs: Attrs, blocks: Vec<Node>) -> Node {
    Node::Element(ElementNode {
        kind,
        attrs,
        children: non_empty_blocks(blocks),
    })
}

fn container(left: Node, right: Node) -> Node {
    Node::element(ElementKind::TwoColContainer, vec![left, right])
}

/// Builds a complete container from `div.two-col-container` markup. Missing
/// columns become placeholders; surplus columns and loose content join the
/// nearest column.
fn container_from_div(el: &HtmlElement) -> Node {
    let mut columns: Vec<(Attrs, Vec<Node>)> = Vec::new();
    let mut loose: Vec<HtmlNode> = Vec::new();

    for child in &el.children {
        match child {
            HtmlNode::Element(col) if col.tag == "div" && !is_div_container(col) => {
                let mut blocks = nodes_to_blocks(&mem::take(&mut loose));
                blocks.extend(nodes_to_blocks(&col.children));
                if columns.len() < 2 {
                    columns.push((block_attrs(col), blocks));
                } else if let Some((_, right)) = columns.last_mut() {
                    right.extend(blocks);
                }
            }
            other => loose.push(other.clone()),
        }
    }

    let trailing = nodes_to_blocks(&loose);
    match columns.last_mut() {
        Some((_, last)) => last.extend(trailing),
        None => columns.push((Attrs::default(), trailing)),
    }

    let mut columns = columns.into_iter();
    let (left_attrs, left) = columns.next().unwrap_or_default();
    let (right_attrs, right) = columns.next().unwrap_or_default();
    container(
        column(ElementKind::TwoColLeft, left_attrs, left),
        column(ElementKind::TwoColRight, right_attrs, right),
    )
}

fn container_from_row(row: &HtmlElement) -> Node {
    let mut left = (Attrs::default(), Vec::new());
    let mut right = (Attrs::default(), Vec::new());
    for (ix, cell) in cells(row).enumerate() {
        let blocks = nodes_to_blocks(&cell.children);
        match ix {
            0 => left = (block_attrs(cell), blocks),
            1 => right = (block_attrs(cell), blocks),
            _ => right.1.extend(blocks),
        }
    }
    container(
        column(ElementKind::TwoColLeft, left.0, left.1),
        column(ElementKind::TwoColRight, right.0, right.1),
    )
}
