//! Block-structured rich-text documents: the node tree, reversible edit ops,
//! a plugin registry of node kinds, commands and queries, and the
//! [`Editor`] that applies transactions with undo history.

mod editor;
mod node;
mod ops;
mod plugin;
mod schema;
mod transforms;
mod tree;
mod value;

pub use crate::editor::{ApplyError, Editor};
pub use crate::node::*;
pub use crate::ops::*;
pub use crate::plugin::*;
pub use crate::schema::*;
pub use crate::transforms::{BlockScope, MarkFlag, nearest_element_path};
pub use crate::tree::{AttrPatch, PathError, Point, Selection};
pub use crate::value::*;
