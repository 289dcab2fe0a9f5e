//! The document model: a tree of block elements, text leaves and void nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ops::Path;

pub type Attrs = BTreeMap<String, Value>;

/// Attribute carrying the transient identity of a pasted image until its
/// final source is known.
pub const IMAGE_KEY: &str = "key";

/// Element kinds. Paragraphs, headings and list items hold inline content;
/// the rest hold blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Paragraph,
    Heading,
    ListItem,
    Blockquote,
    TwoColContainer,
    TwoColLeft,
    TwoColRight,
}

impl ElementKind {
    pub fn is_column(self) -> bool {
        matches!(self, Self::TwoColLeft | Self::TwoColRight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoidKind {
    Image,
    HardBreak,
}

/// Kind of any non-text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Element(ElementKind),
    Void(VoidKind),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Document {
    /// Path of the image whose [`IMAGE_KEY`] attribute equals `key`.
    pub fn find_image(&self, key: &str) -> Option<Path> {
        let mut stack = indexed(&self.children, &[]);
        while let Some((path, node)) = stack.pop() {
            match node {
                Node::Void(void) if void.kind == VoidKind::Image => {
                    if void.attr_str(IMAGE_KEY) == Some(key) {
                        return Some(path);
                    }
                }
                Node::Element(el) => stack.extend(indexed(&el.children, &path)),
                Node::Void(_) | Node::Text(_) => {}
            }
        }
        None
    }

    /// Every element with its path, parents before children.
    pub(crate) fn elements(&self) -> Vec<(Path, &ElementNode)> {
        let mut found = Vec::new();
        let mut stack = indexed(&self.children, &[]);
        while let Some((path, node)) = stack.pop() {
            if let Node::Element(el) = node {
                stack.extend(indexed(&el.children, &path));
                found.push((path, el));
            }
        }
        found
    }
}

/// Children with their paths under `parent`, last child first so that a
/// stack pops them in document order.
fn indexed<'a>(children: &'a [Node], parent: &[usize]) -> Vec<(Path, &'a Node)> {
    children
        .iter()
        .enumerate()
        .rev()
        .map(|(ix, node)| {
            let mut path = parent.to_vec();
            path.push(ix);
            (path, node)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Void(VoidNode),
}

impl Node {
    pub fn element(kind: ElementKind, children: Vec<Node>) -> Self {
        Self::Element(ElementNode {
            kind,
            attrs: Attrs::new(),
            children,
        })
    }

    pub fn text(text: impl Into<String>, marks: Marks) -> Self {
        Self::Text(TextNode {
            text: text.into(),
            marks,
        })
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::element(ElementKind::Paragraph, vec![Self::text(text, Marks::default())])
    }

    /// Block image. An empty `alt` is omitted.
    pub fn image(src: impl Into<String>, alt: Option<String>) -> Self {
        let mut attrs = Attrs::from([("src".to_string(), Value::String(src.into()))]);
        if let Some(alt) = alt.filter(|alt| !alt.is_empty()) {
            attrs.insert("alt".to_string(), Value::String(alt));
        }
        Self::Void(VoidNode {
            kind: VoidKind::Image,
            attrs,
        })
    }

    pub fn hard_break() -> Self {
        Self::Void(VoidNode {
            kind: VoidKind::HardBreak,
            attrs: Attrs::new(),
        })
    }

    /// Sets `src` on every image tagged `key` in this subtree. Returns whether
    /// any matched.
    pub(crate) fn retarget_image(&mut self, key: &str, src: &str) -> bool {
        match self {
            Self::Void(void) if void.kind == VoidKind::Image => {
                let matched = void.attr_str(IMAGE_KEY) == Some(key);
                if matched {
                    void.attrs
                        .insert("src".to_string(), Value::String(src.to_string()));
                }
                matched
            }
            Self::Element(el) => el
                .children
                .iter_mut()
                .fold(false, |found, child| child.retarget_image(key, src) || found),
            Self::Void(_) | Self::Text(_) => false,
        }
    }

    /// A layout container with one empty paragraph in each column.
    pub fn two_col() -> Self {
        let column = |kind| Self::element(kind, vec![Self::paragraph("")]);
        Self::element(
            ElementKind::TwoColContainer,
            vec![column(ElementKind::TwoColLeft), column(ElementKind::TwoColRight)],
        )
    }

    /// `None` for text leaves.
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Self::Element(el) => Some(NodeKind::Element(el.kind)),
            Self::Void(void) => Some(NodeKind::Void(void.kind)),
            Self::Text(_) => None,
        }
    }

    /// Width of the node in its block's inline offsets. A void takes one
    /// position; elements are never inline and take none.
    pub fn inline_len(&self) -> usize {
        match self {
            Self::Text(leaf) => leaf.text.len(),
            Self::Void(_) => 1,
            Self::Element(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        str_attr(&self.attrs, key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidNode {
    pub kind: VoidKind,
    #[serde(default)]
    pub attrs: Attrs,
}

impl VoidNode {
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        str_attr(&self.attrs, key)
    }
}

fn str_attr<'a>(attrs: &'a Attrs, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(Value::as_str)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

/// Inline formatting of a text leaf. Adjacent leaves with equal marks are
/// merged by normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}
