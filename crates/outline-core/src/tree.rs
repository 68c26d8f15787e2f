//! Normalized outline tree and line-range queries.
//!
//! Symbol providers return hierarchies in arbitrary order, and when several providers
//! contribute to one document their trees arrive as unrelated siblings. [`RangeTree::normalize`]
//! turns such input into a forest where siblings are ordered by start position and every
//! symbol that is fully contained in an earlier sibling becomes that sibling's child.

use crate::region::{REGION_DETAIL_PREFIX, TAG_DETAIL_PREFIX};
use crate::symbols::{DocumentSymbol, NodeKey, Selector, SymbolKind, SymbolNode, TextRange};
use std::collections::{BTreeMap, BTreeSet};

/// Result of [`RangeTree::find_nodes_in`].
#[derive(Debug, Default)]
pub struct RangeQuery<'a> {
    /// Nodes whose start line lies in the queried lines, plus at most one fallback node per
    /// sibling list whose span covers the query when nothing else matched there.
    pub in_range: Vec<&'a SymbolNode>,
    /// Nodes whose line span overlaps the query, in post-order.
    pub involves: Vec<&'a SymbolNode>,
    /// The nearest node that is not in range, by line distance from its start line.
    pub closest: Option<&'a SymbolNode>,
}

/// A normalized outline forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeTree {
    roots: Vec<SymbolNode>,
}

impl RangeTree {
    /// Build a tree from raw provider output.
    ///
    /// Kinds in `hidden` are dropped together with their subtrees. Placeholder `Number`
    /// symbols carrying a region/tag detail prefix are remapped to [`SymbolKind::Region`] or
    /// [`SymbolKind::Tag`] first, so those kinds can be hidden too.
    ///
    /// Children supplied by the provider are trusted: a child that escapes its parent's range
    /// is kept where the provider put it.
    pub fn normalize(raw: Vec<DocumentSymbol>, hidden: &BTreeSet<SymbolKind>) -> Self {
        let nodes = raw
            .into_iter()
            .filter_map(|symbol| convert(symbol, hidden))
            .collect();
        let mut roots = nest(nodes);
        for root in &mut roots {
            root.assign_paths(&Selector::root());
        }
        Self { roots }
    }

    /// Wrap already-normalized nodes. Paths are recomputed.
    pub fn from_nodes(mut roots: Vec<SymbolNode>) -> Self {
        for root in &mut roots {
            root.assign_paths(&Selector::root());
        }
        Self { roots }
    }

    /// Top-level nodes.
    pub fn roots(&self) -> &[SymbolNode] {
        &self.roots
    }

    pub(crate) fn roots_mut(&mut self) -> &mut [SymbolNode] {
        &mut self.roots
    }

    /// Consume the tree, returning its top-level nodes.
    pub fn into_roots(self) -> Vec<SymbolNode> {
        self.roots
    }

    /// Returns true if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Iterate over all nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &SymbolNode> {
        let mut out = Vec::new();
        for root in &self.roots {
            root.flatten_preorder(&mut out);
        }
        out.into_iter()
    }

    /// Resolve a selector. Duplicate keys resolve to the first sibling with that key.
    pub fn node_at(&self, selector: &Selector) -> Option<&SymbolNode> {
        let (first, rest) = selector.keys().split_first()?;
        let mut node = find_child(&self.roots, first)?;
        for key in rest {
            node = find_child(&node.children, key)?;
        }
        Some(node)
    }

    /// Resolve a selector mutably.
    pub fn node_at_mut(&mut self, selector: &Selector) -> Option<&mut SymbolNode> {
        let (first, rest) = selector.keys().split_first()?;
        let mut node = self.roots.iter_mut().find(|n| key_matches(n, first))?;
        for key in rest {
            node = node.children.iter_mut().find(|n| key_matches(n, key))?;
        }
        Some(node)
    }

    /// Children of the container addressed by `selector` (the roots for the root selector).
    pub fn children_at(&self, selector: &Selector) -> Option<&[SymbolNode]> {
        if selector.is_root() {
            return Some(&self.roots);
        }
        self.node_at(selector).map(|node| node.children.as_slice())
    }

    /// Snapshot of every node's expansion flag, keyed by path.
    pub fn expansion_map(&self) -> BTreeMap<Selector, bool> {
        self.iter()
            .map(|node| (node.path.clone(), node.expand))
            .collect()
    }

    /// Copy expansion flags from a map produced by an older tree. Paths missing from this
    /// tree are ignored.
    pub fn lend_expansion<'a>(&mut self, expansion: impl IntoIterator<Item = (&'a Selector, &'a bool)>) {
        for (selector, expand) in expansion {
            if let Some(node) = self.node_at_mut(selector) {
                node.expand = *expand;
            }
        }
    }

    /// Clear the focus, viewport and expansion flags on every node.
    pub fn clear_display_state(&mut self) {
        fn clear(nodes: &mut [SymbolNode]) {
            for node in nodes {
                node.focus = false;
                node.in_view = false;
                node.expand = false;
                clear(&mut node.children);
            }
        }
        clear(&mut self.roots);
    }

    /// Find nodes related to the line span of `range` (columns are ignored).
    ///
    /// A node is in range when its start line falls inside the query. Within one sibling
    /// list, if neither a sibling nor any of its descendants matched that way, the first
    /// node whose span covers the whole query is taken as in range instead; this is what
    /// focuses a function when the cursor sits in its body. `closest` is only a fallback for
    /// callers that found nothing; ties keep the first node visited.
    pub fn find_nodes_in(&self, range: &TextRange) -> RangeQuery<'_> {
        let mut query = RangeQuery::default();
        let mut distance = usize::MAX;
        find_in(
            &self.roots,
            range.start.line,
            range.end.line,
            &mut query,
            &mut distance,
        );
        query
    }
}

fn find_in<'a>(
    nodes: &'a [SymbolNode],
    rs: usize,
    re: usize,
    query: &mut RangeQuery<'a>,
    distance: &mut usize,
) -> bool {
    let mut found = false;
    for node in nodes {
        let anchor = node.range.start.line;
        let end = node.range.end.line;
        let mut in_range = false;

        if rs <= anchor && anchor <= re {
            query.in_range.push(node);
            found = true;
            in_range = true;
        }
        if anchor <= re && rs <= end {
            found |= find_in(&node.children, rs, re, query, distance);
            query.involves.push(node);
        }
        if !found && anchor <= rs && re <= end {
            query.in_range.push(node);
            found = true;
            in_range = true;
        }
        if !in_range {
            let d = anchor.abs_diff(re).min(anchor.abs_diff(rs));
            if d < *distance {
                *distance = d;
                query.closest = Some(node);
            }
        }
    }
    found
}

fn find_child<'a>(nodes: &'a [SymbolNode], key: &NodeKey) -> Option<&'a SymbolNode> {
    nodes.iter().find(|n| key_matches(n, key))
}

fn key_matches(node: &SymbolNode, key: &NodeKey) -> bool {
    node.kind == key.kind && node.name == key.name
}

fn convert(symbol: DocumentSymbol, hidden: &BTreeSet<SymbolKind>) -> Option<SymbolNode> {
    let mut kind = symbol.kind;
    let mut detail = symbol.detail.unwrap_or_default();
    if kind == SymbolKind::Number {
        if let Some(rest) = detail.strip_prefix(REGION_DETAIL_PREFIX) {
            kind = SymbolKind::Region;
            detail = rest.to_string();
        } else if let Some(rest) = detail.strip_prefix(TAG_DETAIL_PREFIX) {
            kind = SymbolKind::Tag;
            detail = rest.to_string();
        }
    }
    if hidden.contains(&kind) {
        return None;
    }

    let mut node = SymbolNode::new(kind, symbol.name, symbol.range);
    node.detail = detail;
    node.selection_range = symbol.selection_range;
    node.children = symbol
        .children
        .into_iter()
        .filter_map(|child| convert(child, hidden))
        .collect();
    Some(node)
}

/// Sort a sibling list and move every node contained in an earlier sibling under it.
fn nest(mut nodes: Vec<SymbolNode>) -> Vec<SymbolNode> {
    nodes.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| b.range.end.cmp(&a.range.end))
    });

    let mut i = 0;
    while i < nodes.len() {
        let mut j = i + 1;
        while j < nodes.len() {
            if nodes[i].range.contains_range(&nodes[j].range) {
                let contained = nodes.remove(j);
                nodes[i].children.push(contained);
            } else {
                j += 1;
            }
        }
        i += 1;
    }

    for node in &mut nodes {
        let children = std::mem::take(&mut node.children);
        node.children = nest(children);
    }
    nodes
}
