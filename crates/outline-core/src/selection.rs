//! Cursor and viewport tracking.
//!
//! Editor selection and scroll events arrive several times a second. Instead of re-diffing
//! the tree, [`SelectionIndex`] keeps the small set of nodes it last marked as focused, in view
//! or auto-expanded, and emits updates only for nodes entering or leaving those sets.

use crate::patch::{NodeProperty, PatchOp};
use crate::symbols::{Selector, SymbolNode, TextRange};
use crate::tree::RangeTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How strongly the outline is pinned against automatic changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinStatus {
    /// Follow the editor: focus, viewport and auto-expansion all update.
    #[default]
    Unpinned,
    /// Focus and viewport update, but nodes are not expanded or collapsed automatically.
    Pinned,
    /// Nothing updates until unfrozen.
    Frozen,
}

/// Working sets for focus, viewport and auto-expansion.
#[derive(Debug, Default)]
pub struct SelectionIndex {
    focusing: BTreeSet<Selector>,
    in_view: BTreeSet<Selector>,
    expanded: BTreeSet<Selector>,
    prev_selections: Vec<(usize, usize)>,
    pin: PinStatus,
}

impl SelectionIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pin status.
    pub fn pin(&self) -> PinStatus {
        self.pin
    }

    /// Change the pin status.
    pub fn set_pin(&mut self, pin: PinStatus) {
        self.pin = pin;
    }

    /// Nodes currently focused.
    pub fn focusing(&self) -> &BTreeSet<Selector> {
        &self.focusing
    }

    /// Nodes currently marked in view.
    pub fn in_view(&self) -> &BTreeSet<Selector> {
        &self.in_view
    }

    /// Nodes currently auto-expanded by the viewport.
    pub fn expanded(&self) -> &BTreeSet<Selector> {
        &self.expanded
    }

    /// Forget all working sets. Call when the tree is replaced.
    pub fn reset(&mut self) {
        self.focusing.clear();
        self.in_view.clear();
        self.expanded.clear();
        self.prev_selections.clear();
    }

    /// Update focus for new cursor selections.
    ///
    /// Nothing happens while frozen or when the selections cover the same lines as last time.
    /// A selection with no node in range focuses the nearest node instead.
    pub fn focus(&mut self, tree: &mut RangeTree, selections: &[TextRange]) -> Vec<PatchOp> {
        if self.pin == PinStatus::Frozen {
            return Vec::new();
        }
        let lines: Vec<_> = selections
            .iter()
            .map(|selection| (selection.start.line, selection.end.line))
            .collect();
        if lines == self.prev_selections {
            return Vec::new();
        }
        self.prev_selections = lines;

        let mut next = BTreeSet::new();
        for selection in selections {
            let query = tree.find_nodes_in(selection);
            if query.in_range.is_empty() {
                next.extend(query.closest.map(|node| node.path.clone()));
            } else {
                next.extend(query.in_range.iter().map(|node| node.path.clone()));
            }
        }

        let ops = sync_flag(tree, &self.focusing, &next, NodeProperty::Focus, |node| {
            &mut node.focus
        });
        self.focusing = next;
        ops
    }

    /// Update viewport flags for a new visible range.
    ///
    /// Nodes starting inside the viewport are marked in view. While unpinned, those nodes and
    /// every node overlapping the viewport are expanded, and nodes that scrolled away are
    /// collapsed again.
    pub fn viewport(&mut self, tree: &mut RangeTree, range: &TextRange) -> Vec<PatchOp> {
        if self.pin == PinStatus::Frozen {
            return Vec::new();
        }
        let query = tree.find_nodes_in(range);
        let next_view: BTreeSet<Selector> = paths(&query.in_range);
        let next_expanded: BTreeSet<Selector> = next_view
            .iter()
            .cloned()
            .chain(paths(&query.involves))
            .collect();

        let mut ops = sync_flag(tree, &self.in_view, &next_view, NodeProperty::InView, |node| {
            &mut node.in_view
        });
        self.in_view = next_view;

        if self.pin == PinStatus::Unpinned {
            ops.extend(sync_flag(
                tree,
                &self.expanded,
                &next_expanded,
                NodeProperty::Expand,
                |node| &mut node.expand,
            ));
            self.expanded = next_expanded;
        }
        ops
    }
}

fn paths(nodes: &[&SymbolNode]) -> BTreeSet<Selector> {
    nodes.iter().map(|node| node.path.clone()).collect()
}

/// Clear `flag` on nodes leaving the set and raise it on nodes entering it, reporting only
/// the nodes whose flag actually changed.
fn sync_flag(
    tree: &mut RangeTree,
    previous: &BTreeSet<Selector>,
    next: &BTreeSet<Selector>,
    property: NodeProperty,
    flag: impl Fn(&mut SymbolNode) -> &mut bool,
) -> Vec<PatchOp> {
    let leaving = previous.difference(next).map(|s| (s, false));
    let entering = next.difference(previous).map(|s| (s, true));
    let mut ops = Vec::new();
    for (selector, value) in leaving.chain(entering) {
        let Some(node) = tree.node_at_mut(selector) else {
            continue;
        };
        let slot = flag(node);
        if *slot != value {
            *slot = value;
            ops.push(PatchOp::flag(selector.clone(), property, value));
        }
    }
    ops
}
