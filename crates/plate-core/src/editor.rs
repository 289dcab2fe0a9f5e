//! The editing session. All document changes enter through
//! [`Editor::apply`], which commits a schema-valid result or leaves the
//! session untouched.

use std::collections::VecDeque;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::node::{Document, Node};
use crate::ops::{Op, Transaction};
use crate::plugin::{CommandError, PluginRegistry, QueryError};
use crate::schema::SchemaError;
use crate::tree::{AttrPatch, PathError, Point, Selection, clamp_to_char_boundary};

const MAX_UNDO: usize = 200;
const MAX_NORMALIZE_ROUNDS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("normalization did not converge")]
    NormalizeDidNotConverge,
    #[error("structural edit rejected: {0}")]
    SchemaViolation(#[from] SchemaError),
}

impl From<PathError> for ApplyError {
    fn from(err: PathError) -> Self {
        Self::InvalidPath(err.0)
    }
}

/// Ops that reverse one committed change, with the selections around it.
#[derive(Debug, Clone)]
struct UndoRecord {
    inverse_ops: Vec<Op>,
    selection_before: Selection,
    selection_after: Selection,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Back,
    Forward,
}

/// A fully checked candidate state.
struct Staged {
    doc: Document,
    selection: Selection,
    inverse_ops: Vec<Op>,
}

pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: PluginRegistry,
    undo_stack: VecDeque<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
    revision: u64,
}

impl Editor {
    /// Loads `doc`, normalizing it first. Fails if the normalized document
    /// still breaks the registry's schema.
    pub fn new(
        doc: Document,
        selection: Selection,
        registry: PluginRegistry,
    ) -> Result<Self, ApplyError> {
        let mut editor = Self::blank(registry);
        editor.doc = doc;
        editor.selection = selection;

        let loaded = editor.stage(&[], None)?;
        editor.doc = loaded.doc;
        editor.selection = loaded.selection;
        Ok(editor)
    }

    pub fn with_core_plugins() -> Self {
        Self::blank(PluginRegistry::core())
    }

    pub fn with_richtext_plugins() -> Self {
        Self::blank(PluginRegistry::richtext())
    }

    /// One empty paragraph with the caret in it.
    fn blank(registry: PluginRegistry) -> Self {
        Self {
            doc: Document {
                children: vec![Node::paragraph("")],
            },
            selection: Selection::collapsed(Point::new(vec![0, 0], 0)),
            registry,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            revision: 0,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Moves the selection, snapping both points onto existing text.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = self.registry.normalize_selection(&self.doc, &selection);
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Count of committed changes, undos and redos included.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        self.travel(Direction::Back)
    }

    pub fn redo(&mut self) -> bool {
        self.travel(Direction::Forward)
    }

    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        if tx.is_empty() {
            return Ok(());
        }

        let staged = self
            .stage(&tx.ops, tx.selection_after.clone())
            .inspect_err(|err| log::debug!("rejected {}: {err}", tx.label()))?;
        let selection_before = self.selection.clone();
        let inverse_ops = self.commit(staged);
        log::debug!(
            "applied {} with {} structural ops (revision {})",
            tx.label(),
            tx.structural_ops(),
            self.revision
        );

        self.redo_stack.clear();
        self.undo_stack.push_back(UndoRecord {
            inverse_ops,
            selection_before,
            selection_after: self.selection.clone(),
        });
        while self.undo_stack.len() > MAX_UNDO {
            self.undo_stack.pop_front();
        }
        Ok(())
    }

    /// Points the image tagged with `key` at `src`, in the document and in
    /// every copy of it the undo and redo stacks would restore. The change
    /// does not become a history step of its own and leaves redo intact.
    /// Returns `false`, leaving the document as is, when that image is no
    /// longer in it.
    pub fn resolve_image(&mut self, key: &str, src: &str) -> bool {
        let retargeted = self
            .undo_stack
            .iter_mut()
            .chain(self.redo_stack.iter_mut())
            .flat_map(|record| record.inverse_ops.iter_mut())
            .filter_map(|op| match op {
                Op::InsertNode { node, .. } => Some(node),
                _ => None,
            })
            .fold(0usize, |count, node| count + usize::from(node.retarget_image(key, src)));

        let Some(path) = self.doc.find_image(key) else {
            log::debug!("image {key} is gone, updated {retargeted} history copies");
            return false;
        };

        let op = Op::SetNodeAttrs {
            path,
            patch: AttrPatch::set("src", src),
        };
        match self.stage(&[op], None) {
            Ok(staged) => {
                self.commit(staged);
                log::debug!("image {key} now hosted (revision {})", self.revision);
                true
            }
            Err(err) => {
                log::warn!("could not point image {key} at its hosted source: {err}");
                false
            }
        }
    }

    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), CommandError> {
        let command = self
            .registry
            .command(id)
            .ok_or_else(|| CommandError::new(format!("Unknown command: {id}")))?;
        (command.handler)(self, args)
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let query = self
            .registry
            .query(id)
            .ok_or_else(|| QueryError::new(format!("Unknown query: {id}")))?;
        (query.handler)(self, args)
    }

    pub fn run_query<T: DeserializeOwned>(
        &self,
        id: &str,
        args: Option<Value>,
    ) -> Result<T, QueryError> {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("Unexpected result from {id}: {err}")))
    }

    /// Replays the newest undo or redo record. A record that no longer
    /// applies stays on its stack.
    fn travel(&mut self, direction: Direction) -> bool {
        let record = match direction {
            Direction::Back => self.undo_stack.pop_back(),
            Direction::Forward => self.redo_stack.pop(),
        };
        let Some(record) = record else {
            return false;
        };

        let target = match direction {
            Direction::Back => record.selection_before.clone(),
            Direction::Forward => record.selection_after.clone(),
        };
        match self.stage(&record.inverse_ops, Some(target)) {
            Ok(staged) => {
                let reversed = UndoRecord {
                    inverse_ops: self.commit(staged),
                    ..record
                };
                match direction {
                    Direction::Back => self.redo_stack.push(reversed),
                    Direction::Forward => self.undo_stack.push_back(reversed),
                }
                true
            }
            Err(err) => {
                log::warn!("history step {direction:?} no longer applies: {err}");
                match direction {
                    Direction::Back => self.undo_stack.push_back(record),
                    Direction::Forward => self.redo_stack.push(record),
                }
                false
            }
        }
    }

    /// Runs `ops` on a copy of the document, then normalizes and validates
    /// the copy. `selection` replaces the mapped selection when given.
    fn stage(&self, ops: &[Op], selection: Option<Selection>) -> Result<Staged, ApplyError> {
        let mut doc = self.doc.clone();
        let mut mapped = self.selection.clone();

        let mut inverse_ops = Vec::with_capacity(ops.len());
        for op in ops {
            inverse_ops.push(apply_op_to(&mut doc, &mut mapped, op.clone())?);
        }

        let mut selection = selection.unwrap_or(mapped);
        normalize_doc(&self.registry, &mut doc, &mut selection, &mut inverse_ops)?;
        self.registry.validate(&doc)?;
        inverse_ops.reverse();

        Ok(Staged {
            selection: self.registry.normalize_selection(&doc, &selection),
            doc,
            inverse_ops,
        })
    }

    fn commit(&mut self, staged: Staged) -> Vec<Op> {
        self.doc = staged.doc;
        self.selection = staged.selection;
        self.revision += 1;
        staged.inverse_ops
    }
}

/// Runs normalize passes until none has work, pushing the inverse of every
/// op it applies.
fn normalize_doc(
    registry: &PluginRegistry,
    doc: &mut Document,
    selection: &mut Selection,
    inverse_ops: &mut Vec<Op>,
) -> Result<(), ApplyError> {
    for _ in 0..MAX_NORMALIZE_ROUNDS {
        let ops = registry.normalize(doc);
        if ops.is_empty() {
            return Ok(());
        }
        for op in ops {
            inverse_ops.push(apply_op_to(doc, selection, op)?);
        }
    }
    Err(ApplyError::NormalizeDidNotConverge)
}

/// Applies one op in place and returns its inverse.
fn apply_op_to(doc: &mut Document, selection: &mut Selection, op: Op) -> Result<Op, ApplyError> {
    let inverse = match op {
        Op::InsertText { path, offset, text } => {
            let leaf = doc.text_at_mut(&path)?;
            let offset = clamp_to_char_boundary(&leaf.text, offset);
            leaf.text.insert_str(offset, &text);
            selection.after_insert_text(&path, offset, text.len());
            Op::RemoveText {
                range: offset..offset + text.len(),
                path,
            }
        }
        Op::RemoveText { path, range } => {
            let leaf = doc.text_at_mut(&path)?;
            let start = clamp_to_char_boundary(&leaf.text, range.start);
            let end = clamp_to_char_boundary(&leaf.text, range.end).max(start);
            let removed: String = leaf.text.drain(start..end).collect();
            if !removed.is_empty() {
                selection.after_remove_text(&path, start..end);
            }
            Op::InsertText {
                path,
                offset: start,
                text: removed,
            }
        }
        Op::InsertNode { path, node } => {
            doc.insert_at(&path, node)?;
            selection.after_insert_node(&path);
            Op::RemoveNode { path }
        }
        Op::RemoveNode { path } => {
            let node = doc.remove_at(&path)?;
            selection.after_remove_node(&path, &node, doc);
            Op::InsertNode { path, node }
        }
        Op::SetNodeAttrs { path, patch } => {
            let patch = match doc.node_at_mut(&path)? {
                Node::Element(el) => patch.apply_to(&mut el.attrs),
                Node::Void(void) => patch.apply_to(&mut void.attrs),
                Node::Text(_) => {
                    return Err(ApplyError::InvalidPath(format!("text at {path:?} has no attrs")));
                }
            };
            Op::SetNodeAttrs { path, patch }
        }
        Op::SetTextMarks { path, marks } => {
            let leaf = doc.text_at_mut(&path)?;
            let marks = std::mem::replace(&mut leaf.marks, marks);
            Op::SetTextMarks { path, marks }
        }
    };
    Ok(inverse)
}
