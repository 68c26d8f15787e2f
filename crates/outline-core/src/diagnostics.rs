//! Diagnostics folding.
//!
//! Diagnostics arrive as a flat list from the host. [`DiagnosticAggregator`] folds them onto
//! the current outline: the innermost node whose line range contains a diagnostic receives an
//! own count, and each ancestor on the way down receives a descendant flag instead.

use crate::patch::{NodeProperty, PatchOp, PropertyValue};
use crate::symbols::{Selector, SymbolNode, TextRange};
use crate::tree::RangeTree;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// Error diagnostics.
    Error,
    /// Warning diagnostics.
    Warning,
    /// Informational diagnostics.
    Information,
    /// Hint diagnostics.
    Hint,
}

impl DiagnosticSeverity {
    /// Convert an LSP `DiagnosticSeverity` numeric value.
    pub fn from_lsp(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Information),
            4 => Some(Self::Hint),
            _ => None,
        }
    }
}

/// A single diagnostic item for the current document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Diagnostic range.
    pub range: TextRange,
    /// Optional diagnostic severity.
    pub severity: Option<DiagnosticSeverity>,
    /// Optional diagnostic code (stringified).
    pub code: Option<String>,
    /// Optional diagnostic source (e.g. `"rust-analyzer"`).
    pub source: Option<String>,
    /// Diagnostic message.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with only a range, severity and message.
    pub fn new(range: TextRange, severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: Some(severity),
            code: None,
            source: None,
            message: message.into(),
        }
    }
}

/// Per-node diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticStats {
    /// Errors attached directly to the node.
    pub errors: u32,
    /// Warnings attached directly to the node.
    pub warnings: u32,
    /// Some descendant carries an error.
    pub error_in_descendant: bool,
    /// Some descendant carries a warning.
    pub warning_in_descendant: bool,
}

impl DiagnosticStats {
    /// The badge to display: `(severity, count)`.
    ///
    /// Ordering is own errors, descendant errors, own warnings, descendant warnings. A
    /// descendant report always has count `-1`. Nodes without problems report `(None, 0)`.
    pub fn report(&self) -> (Option<DiagnosticSeverity>, i64) {
        if self.errors > 0 {
            (Some(DiagnosticSeverity::Error), i64::from(self.errors))
        } else if self.error_in_descendant {
            (Some(DiagnosticSeverity::Error), -1)
        } else if self.warnings > 0 {
            (Some(DiagnosticSeverity::Warning), i64::from(self.warnings))
        } else if self.warning_in_descendant {
            (Some(DiagnosticSeverity::Warning), -1)
        } else {
            (None, 0)
        }
    }

    /// Returns true when nothing is recorded.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Absorbed {
    error: bool,
    warning: bool,
}

impl Absorbed {
    fn merge(&mut self, other: Absorbed) {
        self.error |= other.error;
        self.warning |= other.warning;
    }
}

/// Folds diagnostics onto the tree and reports badge changes as update ops.
///
/// The aggregator remembers which nodes it touched last time, so clearing stale badges does
/// not require a full tree walk.
#[derive(Debug, Default)]
pub struct DiagnosticAggregator {
    touched: BTreeSet<Selector>,
}

impl DiagnosticAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the working set. Call when the tree is replaced.
    pub fn reset(&mut self) {
        self.touched.clear();
    }

    /// Selectors of the nodes currently carrying diagnostic state.
    pub fn touched(&self) -> &BTreeSet<Selector> {
        &self.touched
    }

    /// Recompute all diagnostic stats and return update ops for badges that changed.
    pub fn apply(&mut self, tree: &mut RangeTree, diagnostics: &[Diagnostic]) -> Vec<PatchOp> {
        let mut previous = BTreeMap::new();
        for selector in &self.touched {
            if let Some(node) = tree.node_at_mut(selector) {
                previous.insert(selector.clone(), node.diagnostics.report());
                node.diagnostics = DiagnosticStats::default();
            }
        }

        let mut relevant: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| {
                matches!(
                    d.severity,
                    Some(DiagnosticSeverity::Error | DiagnosticSeverity::Warning)
                )
            })
            .collect();
        relevant.sort_by_key(|d| d.range.start.line);

        let mut touched = BTreeSet::new();
        let mut cursor = 0;
        while let Some(diagnostic) = relevant.get(cursor) {
            let root = tree
                .roots_mut()
                .iter_mut()
                .find(|root| root.range.contains_lines(&diagnostic.range));
            match root {
                Some(root) => {
                    walk(root, &relevant, &mut cursor, &mut touched);
                }
                None => cursor += 1,
            }
        }

        let mut ops = Vec::new();
        let candidates: BTreeSet<&Selector> = previous.keys().chain(touched.iter()).collect();
        for selector in candidates {
            let Some(node) = tree.node_at(selector) else {
                continue;
            };
            let (old_type, old_count) = previous.get(selector).copied().unwrap_or((None, 0));
            let (new_type, new_count) = node.diagnostics.report();
            if old_type != new_type {
                ops.push(PatchOp::Update {
                    selector: selector.clone(),
                    property: NodeProperty::DiagnosticType,
                    value: PropertyValue::Severity(new_type),
                });
            }
            if old_count != new_count {
                ops.push(PatchOp::Update {
                    selector: selector.clone(),
                    property: NodeProperty::DiagnosticCount,
                    value: PropertyValue::Count(new_count),
                });
            }
        }

        tracing::debug!(
            diagnostics = relevant.len(),
            nodes = touched.len(),
            ops = ops.len(),
            "applied diagnostics"
        );
        self.touched = touched;
        ops
    }
}

/// Consume every diagnostic (starting at `cursor`) contained in `node`, descending into the
/// child that contains it when there is one.
fn walk(
    node: &mut SymbolNode,
    diagnostics: &[&Diagnostic],
    cursor: &mut usize,
    touched: &mut BTreeSet<Selector>,
) -> Absorbed {
    let mut absorbed = Absorbed::default();
    while let Some(diagnostic) = diagnostics.get(*cursor) {
        if !node.range.contains_lines(&diagnostic.range) {
            break;
        }
        touched.insert(node.path.clone());

        let child = node
            .children
            .iter_mut()
            .find(|child| child.range.contains_lines(&diagnostic.range));
        match child {
            Some(child) => {
                let inner = walk(child, diagnostics, cursor, touched);
                node.diagnostics.error_in_descendant |= inner.error;
                node.diagnostics.warning_in_descendant |= inner.warning;
                absorbed.merge(inner);
            }
            None => {
                match diagnostic.severity {
                    Some(DiagnosticSeverity::Error) => {
                        node.diagnostics.errors += 1;
                        absorbed.error = true;
                    }
                    Some(DiagnosticSeverity::Warning) => {
                        node.diagnostics.warnings += 1;
                        absorbed.warning = true;
                    }
                    _ => {}
                }
                *cursor += 1;
            }
        }
    }
    absorbed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{DocumentSymbol, NodeKey, SymbolKind};
    use pretty_assertions::assert_eq;

    fn tree() -> RangeTree {
        // Class A (0..20) { Method m (2..8) { Variable v (3..4) }, Method n (10..15) }
        let raw = vec![
            DocumentSymbol::new(SymbolKind::Class, "A", TextRange::lines(0, 20)).with_children(
                vec![
                    DocumentSymbol::new(SymbolKind::Method, "m", TextRange::lines(2, 8))
                        .with_children(vec![DocumentSymbol::new(
                            SymbolKind::Variable,
                            "v",
                            TextRange::lines(3, 4),
                        )]),
                    DocumentSymbol::new(SymbolKind::Method, "n", TextRange::lines(10, 15)),
                ],
            ),
        ];
        RangeTree::normalize(raw, &BTreeSet::new())
    }

    fn selector(keys: &[(SymbolKind, &str)]) -> Selector {
        Selector::from_keys(keys.iter().map(|(k, n)| NodeKey::new(*k, *n)).collect())
    }

    fn error_at(line: usize) -> Diagnostic {
        Diagnostic::new(
            TextRange::from_coords(line, 0, line, 4),
            DiagnosticSeverity::Error,
            "boom",
        )
    }

    #[test]
    fn test_report_ordering() {
        let stats = DiagnosticStats {
            errors: 0,
            warnings: 3,
            error_in_descendant: true,
            warning_in_descendant: false,
        };
        assert_eq!(stats.report(), (Some(DiagnosticSeverity::Error), -1));

        let stats = DiagnosticStats {
            warnings: 2,
            warning_in_descendant: true,
            ..DiagnosticStats::default()
        };
        assert_eq!(stats.report(), (Some(DiagnosticSeverity::Warning), 2));
        assert_eq!(DiagnosticStats::default().report(), (None, 0));
    }

    #[test]
    fn test_child_gets_own_count_parent_gets_descendant_flag() {
        let mut tree = tree();
        let mut aggregator = DiagnosticAggregator::new();
        // line 11 is inside Method n, which has no children
        aggregator.apply(&mut tree, &[error_at(11)]);

        let class_a = selector(&[(SymbolKind::Class, "A")]);
        let method_n = selector(&[(SymbolKind::Class, "A"), (SymbolKind::Method, "n")]);
        let n = tree.node_at(&method_n).unwrap();
        assert_eq!(n.diagnostics.report(), (Some(DiagnosticSeverity::Error), 1));
        let a = tree.node_at(&class_a).unwrap();
        assert_eq!(a.diagnostics.errors, 0);
        assert_eq!(a.diagnostics.report(), (Some(DiagnosticSeverity::Error), -1));
    }

    #[test]
    fn test_own_error_beats_descendant_and_info_is_ignored() {
        let mut tree = tree();
        let mut aggregator = DiagnosticAggregator::new();
        let diagnostics = vec![
            error_at(9),
            Diagnostic::new(
                TextRange::from_coords(3, 0, 3, 1),
                DiagnosticSeverity::Warning,
                "w",
            ),
            Diagnostic::new(
                TextRange::from_coords(12, 0, 12, 1),
                DiagnosticSeverity::Hint,
                "h",
            ),
        ];
        aggregator.apply(&mut tree, &diagnostics);

        let a = tree.node_at(&selector(&[(SymbolKind::Class, "A")])).unwrap();
        assert_eq!(a.diagnostics.errors, 1);
        assert!(a.diagnostics.warning_in_descendant);
        assert_eq!(a.diagnostics.report(), (Some(DiagnosticSeverity::Error), 1));

        let v = tree
            .node_at(&selector(&[
                (SymbolKind::Class, "A"),
                (SymbolKind::Method, "m"),
                (SymbolKind::Variable, "v"),
            ]))
            .unwrap();
        assert_eq!(v.diagnostics.warnings, 1);

        let n = tree
            .node_at(&selector(&[(SymbolKind::Class, "A"), (SymbolKind::Method, "n")]))
            .unwrap();
        assert!(n.diagnostics.is_empty());
    }

    #[test]
    fn test_diagnostic_outside_every_node_is_skipped() {
        let mut tree = tree();
        let mut aggregator = DiagnosticAggregator::new();
        let ops = aggregator.apply(&mut tree, &[error_at(40)]);
        assert!(ops.is_empty());
        assert!(aggregator.touched().is_empty());
    }

    #[test]
    fn test_only_changed_badges_are_reported() {
        let mut tree = tree();
        let mut aggregator = DiagnosticAggregator::new();
        let method_n = selector(&[(SymbolKind::Class, "A"), (SymbolKind::Method, "n")]);
        let class_a = selector(&[(SymbolKind::Class, "A")]);

        let ops = aggregator.apply(&mut tree, &[error_at(11)]);
        assert_eq!(ops.len(), 4);

        // Same input again: nothing changed.
        let ops = aggregator.apply(&mut tree, &[error_at(11)]);
        assert!(ops.is_empty());

        // Two errors in n: only n's count changes.
        let ops = aggregator.apply(&mut tree, &[error_at(11), error_at(12)]);
        assert_eq!(
            ops,
            vec![PatchOp::Update {
                selector: method_n.clone(),
                property: NodeProperty::DiagnosticCount,
                value: PropertyValue::Count(2),
            }]
        );

        // Cleared: both badges reset.
        let ops = aggregator.apply(&mut tree, &[]);
        assert_eq!(
            ops,
            vec![
                PatchOp::Update {
                    selector: class_a.clone(),
                    property: NodeProperty::DiagnosticType,
                    value: PropertyValue::Severity(None),
                },
                PatchOp::Update {
                    selector: class_a,
                    property: NodeProperty::DiagnosticCount,
                    value: PropertyValue::Count(0),
                },
                PatchOp::Update {
                    selector: method_n.clone(),
                    property: NodeProperty::DiagnosticType,
                    value: PropertyValue::Severity(None),
                },
                PatchOp::Update {
                    selector: method_n,
                    property: NodeProperty::DiagnosticCount,
                    value: PropertyValue::Count(0),
                },
            ]
        );
    }
}
