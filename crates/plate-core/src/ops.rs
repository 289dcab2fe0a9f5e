//! Primitive edits. Every change to a document is a list of these, and
//! applying one yields the op that reverses it.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::node::{Marks, Node};
use crate::tree::{AttrPatch, Selection};

/// Child indices from the document root.
pub type Path = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// `offset` is a byte offset, clamped to a char boundary.
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        path: Path,
        range: Range<usize>,
    },
    InsertNode {
        path: Path,
        node: Node,
    },
    RemoveNode {
        path: Path,
    },
    SetNodeAttrs {
        path: Path,
        patch: AttrPatch,
    },
    SetTextMarks {
        path: Path,
        marks: Marks,
    },
}

impl Op {
    pub fn is_structural(&self) -> bool {
        matches!(self, Op::InsertNode { .. } | Op::RemoveNode { .. })
    }
}

/// Ops applied as one unit: all of them or none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ops: Vec<Op>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_after: Option<Selection>,
    /// Producer of the edit, e.g. `command:two_col.insert`. Only logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            ..Self::default()
        }
    }

    pub fn selection_after(mut self, selection_after: Selection) -> Self {
        self.selection_after = Some(selection_after);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.selection_after.is_none()
    }

    pub fn label(&self) -> &str {
        self.source.as_deref().unwrap_or("transaction")
    }

    pub fn structural_ops(&self) -> usize {
        self.ops.iter().filter(|op| op.is_structural()).count()
    }
}
