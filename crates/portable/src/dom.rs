//! HTML fragments as an owned tree, parsed with html5ever and written back
//! by a canonical serializer.
//!
//! Parsing never fails. Serializing escapes the way html5ever's own
//! serializer does, so a serialized tree parses back into the same tree
//! unless the tree was edited into a shape the parser would not build
//! (a `<table>` inside a `<p>`, say).

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const VOID_TAGS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text the parser takes verbatim.
const RAW_TEXT_TAGS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "xmp",
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    /// Lowercase tag name.
    pub tag: String,
    pub attributes: Vec<HtmlAttribute>,
    pub children: Vec<HtmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Element(HtmlElement),
    Text(String),
    Comment(String),
}

impl HtmlNode {
    pub fn text(text: impl Into<String>) -> Self {
        HtmlNode::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&HtmlElement> {
        match self {
            HtmlNode::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, HtmlNode::Text(text) if text.trim().is_empty())
    }
}

impl From<HtmlElement> for HtmlNode {
    fn from(el: HtmlElement) -> Self {
        HtmlNode::Element(el)
    }
}

impl HtmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_children(mut self, children: Vec<HtmlNode>) -> Self {
        self.children = children;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(HtmlAttribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let ix = self.attributes.iter().position(|attr| attr.name == name)?;
        Some(self.attributes.remove(ix).value)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes().collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attr("class", joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let remaining: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        if remaining.is_empty() {
            self.remove_attr("class");
        } else {
            let joined = remaining.join(" ");
            self.set_attr("class", joined);
        }
    }

    pub fn element_children(&self) -> impl Iterator<Item = &HtmlElement> {
        self.children.iter().filter_map(HtmlNode::as_element)
    }

    pub fn element_children_mut(&mut self) -> impl Iterator<Item = &mut HtmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            HtmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn style(&self) -> Vec<(String, String)> {
        parse_style(self.attr("style").unwrap_or_default())
    }

    pub fn style_property(&self, name: &str) -> Option<String> {
        self.style()
            .into_iter()
            .find(|(prop, _)| prop == name)
            .map(|(_, value)| value)
    }

    pub fn set_style(&mut self, declarations: &[(String, String)]) {
        if declarations.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", serialize_style(declarations));
        }
    }

    pub fn set_style_property(&mut self, name: &str, value: &str) {
        let mut declarations = self.style();
        match declarations.iter_mut().find(|(prop, _)| prop == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => declarations.push((name.to_string(), value.to_string())),
        }
        self.set_style(&declarations);
    }

    pub fn retain_style(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        if self.attr("style").is_none() {
            return;
        }
        let declarations: Vec<(String, String)> = self
            .style()
            .into_iter()
            .filter(|(prop, value)| keep(prop, value))
            .collect();
        self.set_style(&declarations);
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(el) => collect_text(&el.children, out),
            HtmlNode::Comment(_) => {}
        }
    }
}

/// Splits a `style` attribute into lowercase property names and trimmed
/// values. Semicolons inside parentheses or quotes do not split.
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    split_declarations(style)
        .into_iter()
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            (!name.is_empty() && !value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect()
}

pub fn serialize_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn split_declarations(style: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (ix, ch) in style.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                out.push(&style[start..ix]);
                start = ix + 1;
            }
            _ => {}
        }
    }
    out.push(&style[start..]);
    out
}

/// Parses `html` as the children of a `<body>`, with the error recovery a
/// browser applies: implicit closes, `<tbody>` insertion, foster parenting.
pub fn parse_fragment(html: &str) -> Vec<HtmlNode> {
    let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from("body"));
    let dom = html5ever::parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(html);

    // The fragment lands under a synthetic `<html>` root.
    let document = dom.document.children.borrow();
    match document.first() {
        Some(root) => root.children.borrow().iter().filter_map(convert).collect(),
        None => Vec::new(),
    }
}

fn convert(handle: &Handle) -> Option<HtmlNode> {
    match &handle.data {
        NodeData::Text { contents } => {
            let text = contents.borrow();
            (!text.is_empty()).then(|| HtmlNode::Text(text.to_string()))
        }
        NodeData::Comment { contents } => Some(HtmlNode::Comment(contents.to_string())),
        NodeData::Element { name, attrs, .. } => {
            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| HtmlAttribute {
                    name: attr.name.local.to_string(),
                    value: attr.value.to_string(),
                })
                .collect();
            Some(HtmlNode::Element(HtmlElement {
                tag: name.local.to_string(),
                attributes,
                children: handle.children.borrow().iter().filter_map(convert).collect(),
            }))
        }
        NodeData::Document | NodeData::Doctype { .. } | NodeData::ProcessingInstruction { .. } => {
            None
        }
    }
}

pub fn serialize(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

fn write_node(out: &mut String, node: &HtmlNode) {
    match node {
        HtmlNode::Text(text) => out.push_str(html_escape::encode_text(text).as_ref()),
        HtmlNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        HtmlNode::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for attr in &el.attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(html_escape::encode_double_quoted_attribute(&attr.value).as_ref());
                out.push('"');
            }
            out.push('>');

            if is_void_tag(&el.tag) {
                return;
            }

            if RAW_TEXT_TAGS.contains(&el.tag.as_str()) {
                for child in &el.children {
                    if let HtmlNode::Text(text) = child {
                        out.push_str(text);
                    }
                }
            } else {
                for child in &el.children {
                    write_node(out, child);
                }
            }

            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_split_outside_parentheses_only() {
        let parts = split_declarations("a: 1; background: url(data:image/png;base64,AAA); b: 'x;y'");
        assert_eq!(
            parts,
            vec![
                "a: 1",
                " background: url(data:image/png;base64,AAA)",
                " b: 'x;y'"
            ]
        );
    }

    #[test]
    fn tables_get_their_implied_body() {
        assert_eq!(
            serialize(&parse_fragment("<table><tr><td>a<td>b</table>")),
            "<table><tbody><tr><td>a</td><td>b</td></tr></tbody></table>"
        );
    }

    #[test]
    fn escaping_survives_a_second_parse() {
        let html = "<p>a<br>b &amp; &lt;c&gt;</p><img src=\"x.png\" alt=\"&quot;q&quot;\">";
        assert_eq!(serialize(&parse_fragment(html)), html);
    }

    #[test]
    fn unterminated_comment_runs_to_end() {
        assert_eq!(
            parse_fragment("a<!-- open"),
            vec![HtmlNode::text("a"), HtmlNode::Comment(" open".into())]
        );
    }
}
