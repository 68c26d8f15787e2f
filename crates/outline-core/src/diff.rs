//! Keyed reconciliation of two outline trees.
//!
//! Siblings are matched by `(kind, name)`. Each sibling list is scanned from both ends at
//! once, trying four cheap matches before falling back to a linear search:
//!
//! 1. old start / new start: patch in place
//! 2. old end / new end: patch in place
//! 3. old start / new end: patch, move towards the end
//! 4. old end / new start: patch, move towards the start
//! 5. otherwise search the remaining old nodes for the new start; move it if found,
//!    else insert it and stop scanning
//!
//! Whatever remains after the scan is deleted (old) or inserted (new) in one op each.
//!
//! The expansion flag is never diffed. Instead the differ records each matched node's old
//! expansion state, and the caller lends it to the new tree with
//! [`crate::RangeTree::lend_expansion`], so user-toggled folds survive rebuilds.
//!
//! Keys are expected to be unique among siblings. With duplicates, the first sibling carrying
//! a key is the one that matches.

use crate::patch::{NodeProperty, PatchOp, PropertyValue};
use crate::symbols::{Selector, SymbolNode};
use crate::tree::RangeTree;
use std::collections::BTreeMap;

/// Output of a tree diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Ops transforming the old tree into the new one, to be applied in order.
    pub ops: Vec<PatchOp>,
    /// Expansion state of every matched node, keyed by path.
    pub expansion: BTreeMap<Selector, bool>,
}

/// Accumulates patch ops while reconciling sibling lists.
#[derive(Debug, Default)]
pub struct TreeDiffer {
    ops: Vec<PatchOp>,
    expansion: BTreeMap<Selector, bool>,
}

impl TreeDiffer {
    /// Create an empty differ.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff two whole trees.
    pub fn diff(old: &RangeTree, new: &RangeTree) -> TreeDiff {
        let mut differ = Self::new();
        differ.diff_children(&Selector::root(), old.roots(), new.roots());
        let diff = differ.finish();
        tracing::debug!(
            ops = diff.ops.len(),
            matched = diff.expansion.len(),
            "diffed outline trees"
        );
        diff
    }

    /// Reconcile the children of the container at `parent`.
    pub fn diff_children(&mut self, parent: &Selector, old: &[SymbolNode], new: &[SymbolNode]) {
        let mut old: Vec<&SymbolNode> = old.iter().collect();
        let (mut old_start, mut old_end) = (0, old.len());
        let (mut new_start, mut new_end) = (0, new.len());

        while old_start < old_end && new_start < new_end {
            if old[old_start].same_key(&new[new_start]) {
                self.patch(old[old_start], &new[new_start]);
                old_start += 1;
                new_start += 1;
            } else if old[old_end - 1].same_key(&new[new_end - 1]) {
                self.patch(old[old_end - 1], &new[new_end - 1]);
                old_end -= 1;
                new_end -= 1;
            } else if old[old_start].same_key(&new[new_end - 1]) {
                self.patch(old[old_start], &new[new_end - 1]);
                self.ops.push(PatchOp::Move {
                    selector: parent.clone(),
                    nodes: vec![old[old_start].key()],
                    before: new.get(new_end).map(SymbolNode::key),
                });
                old_start += 1;
                new_end -= 1;
            } else if old[old_end - 1].same_key(&new[new_start]) {
                self.patch(old[old_end - 1], &new[new_start]);
                self.ops.push(PatchOp::Move {
                    selector: parent.clone(),
                    nodes: vec![old[old_end - 1].key()],
                    before: Some(old[old_start].key()),
                });
                old_end -= 1;
                new_start += 1;
            } else {
                let found = old[old_start..old_end]
                    .iter()
                    .position(|node| node.same_key(&new[new_start]));
                match found {
                    Some(offset) => {
                        let index = old_start + offset;
                        self.patch(old[index], &new[new_start]);
                        self.ops.push(PatchOp::Move {
                            selector: parent.clone(),
                            nodes: vec![old[index].key()],
                            before: Some(old[old_start].key()),
                        });
                        old.remove(index);
                        old_end -= 1;
                        new_start += 1;
                    }
                    None => {
                        self.ops.push(PatchOp::Insert {
                            selector: parent.clone(),
                            before: Some(old[old_start].key()),
                            nodes: vec![new[new_start].clone()],
                        });
                        new_start += 1;
                        break;
                    }
                }
            }
        }

        if old_start < old_end {
            self.ops.push(PatchOp::Delete {
                selector: parent.clone(),
                nodes: old[old_start..old_end].iter().map(|n| n.key()).collect(),
            });
        }
        if new_start < new_end {
            self.ops.push(PatchOp::Insert {
                selector: parent.clone(),
                before: new.get(new_end).map(SymbolNode::key),
                nodes: new[new_start..new_end].to_vec(),
            });
        }
    }

    /// Finish and take the accumulated result.
    pub fn finish(self) -> TreeDiff {
        TreeDiff {
            ops: self.ops,
            expansion: self.expansion,
        }
    }

    fn patch(&mut self, old: &SymbolNode, new: &SymbolNode) {
        for ((property, old_value), (_, new_value)) in
            properties(old).into_iter().zip(properties(new))
        {
            if old_value != new_value {
                self.ops.push(PatchOp::Update {
                    selector: new.path.clone(),
                    property,
                    value: new_value,
                });
            }
        }
        self.expansion.insert(new.path.clone(), old.expand);

        match (old.children.is_empty(), new.children.is_empty()) {
            (false, false) => self.diff_children(&new.path, &old.children, &new.children),
            (false, true) => self.ops.push(PatchOp::Delete {
                selector: new.path.clone(),
                nodes: old.children.iter().map(SymbolNode::key).collect(),
            }),
            (true, false) => self.ops.push(PatchOp::Insert {
                selector: new.path.clone(),
                before: None,
                nodes: new.children.clone(),
            }),
            (true, true) => {}
        }
    }
}

fn properties(node: &SymbolNode) -> [(NodeProperty, PropertyValue); 7] {
    let (severity, count) = node.diagnostics.report();
    [
        (NodeProperty::Detail, PropertyValue::Text(node.detail.clone())),
        (NodeProperty::Range, PropertyValue::Range(node.range)),
        (
            NodeProperty::SelectionRange,
            PropertyValue::Range(node.selection_range),
        ),
        (NodeProperty::InView, PropertyValue::Bool(node.in_view)),
        (NodeProperty::Focus, PropertyValue::Bool(node.focus)),
        (NodeProperty::DiagnosticType, PropertyValue::Severity(severity)),
        (NodeProperty::DiagnosticCount, PropertyValue::Count(count)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{NodeKey, SymbolKind, TextRange};
    use pretty_assertions::assert_eq;

    fn leaf(name: &str, line: usize) -> SymbolNode {
        SymbolNode::new(SymbolKind::Function, name, TextRange::lines(line, line + 1))
    }

    fn list(names: &[&str]) -> RangeTree {
        RangeTree::from_nodes(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| leaf(name, i * 2))
                .collect(),
        )
    }

    fn key(name: &str) -> NodeKey {
        NodeKey::new(SymbolKind::Function, name)
    }

    fn structural(ops: &[PatchOp]) -> Vec<&PatchOp> {
        ops.iter().filter(|op| op.is_structural()).collect()
    }

    #[test]
    fn test_identical_trees_produce_no_ops() {
        let diff = TreeDiffer::diff(&list(&["a", "b", "c"]), &list(&["a", "b", "c"]));
        assert!(diff.ops.is_empty());
        assert_eq!(diff.expansion.len(), 3);
    }

    #[test]
    fn test_front_to_back_is_one_move() {
        let old = RangeTree::from_nodes(vec![leaf("a", 0), leaf("b", 2), leaf("c", 4)]);
        let new = RangeTree::from_nodes(vec![leaf("b", 2), leaf("c", 4), leaf("a", 0)]);
        let diff = TreeDiffer::diff(&old, &new);
        assert_eq!(
            diff.ops,
            vec![PatchOp::Move {
                selector: Selector::root(),
                nodes: vec![key("a")],
                before: None,
            }]
        );
    }

    #[test]
    fn test_back_to_front_is_one_move() {
        let old = RangeTree::from_nodes(vec![leaf("a", 0), leaf("b", 2), leaf("c", 4)]);
        let new = RangeTree::from_nodes(vec![leaf("c", 4), leaf("a", 0), leaf("b", 2)]);
        let diff = TreeDiffer::diff(&old, &new);
        assert_eq!(
            diff.ops,
            vec![PatchOp::Move {
                selector: Selector::root(),
                nodes: vec![key("c")],
                before: Some(key("a")),
            }]
        );
    }

    #[test]
    fn test_changed_range_is_one_update() {
        let old = list(&["a", "b"]);
        let mut nodes = old.roots().to_vec();
        nodes[1].range = TextRange::lines(5, 9);
        let new = RangeTree::from_nodes(nodes);
        let diff = TreeDiffer::diff(&old, &new);
        assert_eq!(
            diff.ops,
            vec![PatchOp::Update {
                selector: Selector::root().child(key("b")),
                property: NodeProperty::Range,
                value: PropertyValue::Range(TextRange::lines(5, 9)),
            }]
        );
    }

    #[test]
    fn test_unmatched_insert_stops_the_scan() {
        // x is new; after inserting it the scan stops, so b and c are swept by one delete
        // and reinserted.
        let diff = TreeDiffer::diff(&list(&["a", "b", "c", "d"]), &list(&["x", "c", "b", "d"]));
        let ops = structural(&diff.ops);
        assert_eq!(
            ops,
            vec![
                &PatchOp::Insert {
                    selector: Selector::root(),
                    before: Some(key("a")),
                    nodes: vec![list(&["x"]).roots()[0].clone()],
                },
                &PatchOp::Delete {
                    selector: Selector::root(),
                    nodes: vec![key("a"), key("b"), key("c")],
                },
                &PatchOp::Insert {
                    selector: Selector::root(),
                    before: Some(key("d")),
                    nodes: list(&["x", "c", "b"]).roots()[1..].to_vec(),
                },
            ]
        );
    }

    #[test]
    fn test_children_added_and_removed_wholesale() {
        let mut parent = SymbolNode::new(SymbolKind::Class, "A", TextRange::lines(0, 10));
        let old = RangeTree::from_nodes(vec![parent.clone()]);
        parent.children = vec![leaf("m", 1), leaf("n", 3)];
        let new = RangeTree::from_nodes(vec![parent]);
        let class_a = Selector::root().child(NodeKey::new(SymbolKind::Class, "A"));

        let diff = TreeDiffer::diff(&old, &new);
        assert_eq!(diff.ops.len(), 1);
        match &diff.ops[0] {
            PatchOp::Insert {
                selector,
                before,
                nodes,
            } => {
                assert_eq!(selector, &class_a);
                assert!(before.is_none());
                assert_eq!(nodes.len(), 2);
            }
            other => panic!("unexpected op {other:?}"),
        }

        let diff = TreeDiffer::diff(&new, &old);
        assert_eq!(
            diff.ops,
            vec![PatchOp::Delete {
                selector: class_a,
                nodes: vec![key("m"), key("n")],
            }]
        );
    }

    #[test]
    fn test_expansion_is_carried_not_reported() {
        let mut old = list(&["a", "b"]);
        old.node_at_mut(&Selector::root().child(key("a"))).unwrap().expand = true;
        let new = list(&["a", "b"]);
        let diff = TreeDiffer::diff(&old, &new);
        assert!(diff.ops.is_empty());
        assert_eq!(diff.expansion.get(&Selector::root().child(key("a"))), Some(&true));
        assert_eq!(diff.expansion.get(&Selector::root().child(key("b"))), Some(&false));
    }
}
