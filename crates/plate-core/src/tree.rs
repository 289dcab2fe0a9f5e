//! Path addressing into a document, and the selection bookkeeping that has to
//! follow every primitive edit.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::node::{Attrs, Document, Node, TextNode};
use crate::ops::Path;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PathError(pub String);

/// Largest char boundary of `s` at or below `ix`.
pub(crate) fn clamp_to_char_boundary(s: &str, ix: usize) -> usize {
    let mut ix = ix.min(s.len());
    while !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}

impl Document {
    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (&first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.children.get(first)?, |node, &ix| match node {
                Node::Element(el) => el.children.get(ix),
                Node::Void(_) | Node::Text(_) => None,
            })
    }

    pub(crate) fn children_at_mut(&mut self, parent: &[usize]) -> Result<&mut Vec<Node>, PathError> {
        let mut children = &mut self.children;
        for (depth, &ix) in parent.iter().enumerate() {
            let len = children.len();
            children = match children.get_mut(ix) {
                Some(Node::Element(el)) => &mut el.children,
                Some(_) => return Err(PathError(format!("leaf node at depth {depth}"))),
                None => {
                    return Err(PathError(format!("index {ix} at depth {depth} exceeds {len}")));
                }
            };
        }
        Ok(children)
    }

    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> Result<&mut Node, PathError> {
        let (&ix, parent) = path
            .split_last()
            .ok_or_else(|| PathError("empty path".into()))?;
        let children = self.children_at_mut(parent)?;
        let len = children.len();
        children
            .get_mut(ix)
            .ok_or_else(|| PathError(format!("index {ix} at depth {} exceeds {len}", parent.len())))
    }

    pub(crate) fn text_at_mut(&mut self, path: &[usize]) -> Result<&mut TextNode, PathError> {
        match self.node_at_mut(path)? {
            Node::Text(text) => Ok(text),
            _ => Err(PathError(format!("no text node at {path:?}"))),
        }
    }

    pub(crate) fn insert_at(&mut self, path: &[usize], node: Node) -> Result<(), PathError> {
        let (&ix, parent) = path
            .split_last()
            .ok_or_else(|| PathError("empty insert path".into()))?;
        let children = self.children_at_mut(parent)?;
        if ix > children.len() {
            return Err(PathError(format!(
                "insert index {ix} past end {}",
                children.len()
            )));
        }
        children.insert(ix, node);
        Ok(())
    }

    pub(crate) fn remove_at(&mut self, path: &[usize]) -> Result<Node, PathError> {
        let (&ix, parent) = path
            .split_last()
            .ok_or_else(|| PathError("empty remove path".into()))?;
        let children = self.children_at_mut(parent)?;
        if ix >= children.len() {
            return Err(PathError(format!(
                "remove index {ix} past end {}",
                children.len()
            )));
        }
        Ok(children.remove(ix))
    }
}

/// Attribute changes: keys to set and keys to drop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttrPatch {
    #[serde(default)]
    pub set: Attrs,
    #[serde(default)]
    pub remove: Vec<String>,
}

impl AttrPatch {
    pub fn set(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            set: Attrs::from([(key.into(), value.into())]),
            remove: Vec::new(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            set: Attrs::new(),
            remove: vec![key.into()],
        }
    }

    /// Applies the patch and returns the one that undoes it.
    pub(crate) fn apply_to(&self, attrs: &mut Attrs) -> AttrPatch {
        let mut undo = AttrPatch::default();
        for (key, value) in &self.set {
            match attrs.insert(key.clone(), value.clone()) {
                Some(previous) => {
                    undo.set.insert(key.clone(), previous);
                }
                None => undo.remove.push(key.clone()),
            }
        }
        for key in &self.remove {
            if let Some(previous) = attrs.remove(key) {
                undo.set.insert(key.clone(), previous);
            }
        }
        undo
    }
}

/// A caret position: path to a text leaf and a byte offset into its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Whether the point sits strictly below `parent`.
    fn is_under(&self, parent: &[usize]) -> bool {
        self.path.len() > parent.len() && self.path.starts_with(parent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Both points in document order.
    pub(crate) fn ordered(&self) -> (&Point, &Point) {
        let key = |point: &Point| (point.path.clone(), point.offset);
        if key(&self.focus) < key(&self.anchor) {
            (&self.focus, &self.anchor)
        } else {
            (&self.anchor, &self.focus)
        }
    }

    fn points_mut(&mut self) -> [&mut Point; 2] {
        [&mut self.anchor, &mut self.focus]
    }

    pub(crate) fn after_insert_text(&mut self, path: &[usize], offset: usize, len: usize) {
        for point in self.points_mut() {
            if point.path == path && point.offset >= offset {
                point.offset += len;
            }
        }
    }

    pub(crate) fn after_remove_text(&mut self, path: &[usize], range: Range<usize>) {
        for point in self.points_mut() {
            if point.path != path || point.offset <= range.start {
                continue;
            }
            point.offset = if point.offset >= range.end {
                point.offset - range.len()
            } else {
                range.start
            };
        }
    }

    pub(crate) fn after_insert_node(&mut self, path: &[usize]) {
        let Some((&ix, parent)) = path.split_last() else {
            return;
        };
        let depth = parent.len();
        for point in self.points_mut() {
            if point.is_under(parent) && point.path[depth] >= ix {
                point.path[depth] += 1;
            }
        }
    }

    /// `doc` is the document after the removal. Points inside a removed text
    /// leaf that merged into its left sibling follow the text there; other
    /// points inside the removed subtree fall back to the previous sibling.
    pub(crate) fn after_remove_node(&mut self, path: &[usize], removed: &Node, doc: &Document) {
        let Some((&ix, parent)) = path.split_last() else {
            return;
        };
        let depth = parent.len();
        let merged = merged_text_prefix(path, removed, doc);

        for point in self.points_mut() {
            if !point.is_under(parent) || point.path[depth] < ix {
                continue;
            }
            if point.path[depth] > ix {
                point.path[depth] -= 1;
                continue;
            }

            point.path.truncate(depth + 1);
            match merged {
                Some((prefix, removed_len)) => {
                    point.path[depth] = ix - 1;
                    point.offset = prefix + point.offset.min(removed_len);
                }
                None => {
                    point.path[depth] = ix.saturating_sub(1);
                    point.offset = 0;
                }
            }
        }
    }
}

/// `(left text length before the merge, removed text length)` when the
/// removed text leaf now ends its left sibling.
fn merged_text_prefix(path: &[usize], removed: &Node, doc: &Document) -> Option<(usize, usize)> {
    let Node::Text(removed) = removed else {
        return None;
    };
    let (&ix, parent) = path.split_last()?;
    let mut left_path = parent.to_vec();
    left_path.push(ix.checked_sub(1)?);

    match doc.node(&left_path)? {
        Node::Text(left) if left.marks == removed.marks && left.text.ends_with(&removed.text) => {
            Some((left.text.len() - removed.text.len(), removed.text.len()))
        }
        _ => None,
    }
}
