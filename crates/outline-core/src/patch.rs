//! Patch operations: the wire contract between the outline engine and a renderer.
//!
//! Guarantees a renderer may rely on:
//! - `selector` always addresses the *parent container* of the nodes being edited, except for
//!   [`PatchOp::Update`], where it addresses the node itself.
//! - `before` names a sibling inside that container by `(kind, name)`; `None` means append.
//! - A batch must be applied in order: later ops may refer to positions produced by earlier
//!   ones in the same batch.
//! - Ops targeting a selector or sibling that no longer exists must be treated as no-ops.

use crate::diagnostics::DiagnosticSeverity;
use crate::symbols::{NodeKey, Selector, SymbolNode, TextRange};
use serde::Serialize;
use std::fmt;

/// A display-relevant node property that can be updated in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeProperty {
    /// Free-form detail text.
    Detail,
    /// Full node span.
    Range,
    /// Navigation span.
    SelectionRange,
    /// Expansion flag.
    Expand,
    /// Viewport-intersection flag.
    InView,
    /// Cursor-focus flag.
    Focus,
    /// Reported diagnostic severity.
    DiagnosticType,
    /// Reported diagnostic count (`-1` for "present in a descendant").
    DiagnosticCount,
}

impl fmt::Display for NodeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Detail => "detail",
            Self::Range => "range",
            Self::SelectionRange => "selectionRange",
            Self::Expand => "expand",
            Self::InView => "inView",
            Self::Focus => "focus",
            Self::DiagnosticType => "diagnosticType",
            Self::DiagnosticCount => "diagnosticCount",
        };
        f.write_str(name)
    }
}

/// The new value carried by an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A boolean flag.
    Bool(bool),
    /// A text value.
    Text(String),
    /// A range value.
    Range(TextRange),
    /// A reported severity; `None` clears the badge.
    Severity(Option<DiagnosticSeverity>),
    /// A reported count.
    Count(i64),
}

/// One atomic tree-edit instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PatchOp {
    /// Set `property` of the node addressed by `selector` to `value`.
    Update {
        /// Address of the node to update.
        selector: Selector,
        /// Property to change.
        property: NodeProperty,
        /// New value.
        value: PropertyValue,
    },
    /// Insert `nodes` into the container at `selector`, before `before` (or at the end).
    Insert {
        /// Address of the parent container.
        selector: Selector,
        /// Sibling to insert before; `None` appends.
        before: Option<NodeKey>,
        /// Nodes to insert, in order, including their subtrees.
        nodes: Vec<SymbolNode>,
    },
    /// Remove the children `nodes` from the container at `selector`.
    Delete {
        /// Address of the parent container.
        selector: Selector,
        /// Keys of the children to remove.
        nodes: Vec<NodeKey>,
    },
    /// Move the children `nodes` of the container at `selector` before `before` (or to the end).
    Move {
        /// Address of the parent container.
        selector: Selector,
        /// Keys of the children to move, in order.
        nodes: Vec<NodeKey>,
        /// Sibling to move before; `None` moves to the end.
        before: Option<NodeKey>,
    },
}

impl PatchOp {
    /// Shorthand for a boolean update.
    pub fn flag(selector: Selector, property: NodeProperty, value: bool) -> Self {
        Self::Update {
            selector,
            property,
            value: PropertyValue::Bool(value),
        }
    }

    /// The selector the op targets.
    pub fn selector(&self) -> &Selector {
        match self {
            Self::Update { selector, .. }
            | Self::Insert { selector, .. }
            | Self::Delete { selector, .. }
            | Self::Move { selector, .. } => selector,
        }
    }

    /// Returns true for structural ops (insert/delete/move).
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Update { .. })
    }
}
