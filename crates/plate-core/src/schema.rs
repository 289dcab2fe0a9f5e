use serde::{Deserialize, Serialize};

use crate::node::{Document, ElementKind, Node, NodeKind, VoidKind};
use crate::ops::Path;
use crate::plugin::PluginRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Block,
    Inline,
}

/// Content model of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    /// Void nodes.
    None,
    /// One or more block nodes.
    BlockOnly,
    /// Text leaves and inline voids.
    InlineOnly,
    /// Exactly these kinds, in this order.
    Sequence(Vec<NodeKind>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: NodeKind,
    pub role: NodeRole,
    pub is_void: bool,
    pub children: ChildConstraint,
    /// When set, the node may only appear directly inside these elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<ElementKind>>,
}

impl NodeSpec {
    pub fn block(kind: ElementKind, children: ChildConstraint) -> Self {
        Self {
            kind: NodeKind::Element(kind),
            role: NodeRole::Block,
            is_void: false,
            children,
            parents: None,
        }
    }

    pub fn void(kind: VoidKind, role: NodeRole) -> Self {
        Self {
            kind: NodeKind::Void(kind),
            role,
            is_void: true,
            children: ChildConstraint::None,
            parents: None,
        }
    }

    pub fn only_inside(mut self, parents: impl IntoIterator<Item = ElementKind>) -> Self {
        self.parents = Some(parents.into_iter().collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("document must contain at least one block")]
    EmptyDocument,
    #[error("no node spec registered for {0:?}")]
    UnknownKind(NodeKind),
    #[error("{kind:?} at {path:?} must not be empty")]
    EmptyContainer { path: Path, kind: ElementKind },
    #[error("{child} is not allowed inside {parent} at {path:?}")]
    DisallowedChild {
        path: Path,
        parent: String,
        child: String,
    },
    #[error("{parent} at {path:?} must contain exactly {expected:?}")]
    ArityMismatch {
        path: Path,
        parent: String,
        expected: Vec<NodeKind>,
    },
}

pub(crate) fn validate_document(
    doc: &Document,
    registry: &PluginRegistry,
) -> Result<(), SchemaError> {
    if doc.children.is_empty() {
        return Err(SchemaError::EmptyDocument);
    }
    validate_children(
        &doc.children,
        None,
        &ChildConstraint::BlockOnly,
        &mut Vec::new(),
        registry,
    )
}

fn describe_parent(parent: Option<ElementKind>) -> String {
    match parent {
        Some(kind) => format!("{kind:?}"),
        None => "document root".to_string(),
    }
}

fn describe_child(node: &Node) -> String {
    match node.kind() {
        Some(kind) => format!("{kind:?}"),
        None => "text".to_string(),
    }
}

fn validate_children(
    children: &[Node],
    parent: Option<ElementKind>,
    constraint: &ChildConstraint,
    path: &mut Vec<usize>,
    registry: &PluginRegistry,
) -> Result<(), SchemaError> {
    match constraint {
        ChildConstraint::None => {
            if let Some(child) = children.first() {
                return Err(SchemaError::DisallowedChild {
                    path: path.clone(),
                    parent: describe_parent(parent),
                    child: describe_child(child),
                });
            }
        }
        ChildConstraint::BlockOnly => {
            if children.is_empty() {
                if let Some(kind) = parent {
                    return Err(SchemaError::EmptyContainer {
                        path: path.clone(),
                        kind,
                    });
                }
                return Err(SchemaError::EmptyDocument);
            }
        }
        ChildConstraint::InlineOnly => {}
        ChildConstraint::Sequence(expected) => {
            let actual: Vec<Option<NodeKind>> = children.iter().map(Node::kind).collect();
            let matches = actual.len() == expected.len()
                && actual
                    .iter()
                    .zip(expected)
                    .all(|(actual, expected)| actual.as_ref() == Some(expected));
            if !matches {
                return Err(SchemaError::ArityMismatch {
                    path: path.clone(),
                    parent: describe_parent(parent),
                    expected: expected.clone(),
                });
            }
        }
    }

    for (ix, child) in children.iter().enumerate() {
        path.push(ix);

        let disallowed = || SchemaError::DisallowedChild {
            path: path.clone(),
            parent: describe_parent(parent),
            child: describe_child(child),
        };

        let Some(kind) = child.kind() else {
            if *constraint != ChildConstraint::InlineOnly {
                return Err(disallowed());
            }
            path.pop();
            continue;
        };

        let spec = registry
            .node_specs()
            .get(&kind)
            .ok_or(SchemaError::UnknownKind(kind))?;

        let role_ok = match constraint {
            ChildConstraint::InlineOnly => spec.role == NodeRole::Inline,
            ChildConstraint::BlockOnly | ChildConstraint::Sequence(_) => {
                spec.role == NodeRole::Block
            }
            ChildConstraint::None => false,
        };
        if !role_ok {
            return Err(disallowed());
        }

        if let Some(parents) = &spec.parents {
            if !parent.is_some_and(|p| parents.contains(&p)) {
                return Err(disallowed());
            }
        }

        if let Node::Element(el) = child {
            validate_children(&el.children, Some(el.kind), &spec.children, path, registry)?;
        }

        path.pop();
    }

    Ok(())
}
