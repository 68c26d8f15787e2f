//! Workspace-wide symbol index.
//!
//! Region and tag symbols are bookmarks a user wants to reach from anywhere in the workspace.
//! After every rebuild the session records a document's region/tag symbols in a
//! [`SymbolIndex`]; hosts back it with whatever persistent store they have.

use crate::symbols::{SymbolKind, SymbolNode};
use std::collections::BTreeMap;

/// A keyed store of per-document symbol lists.
pub trait SymbolIndex {
    /// Symbols recorded for `uri`.
    fn get(&self, uri: &str) -> Option<&[SymbolNode]>;

    /// Record symbols for `uri`. An empty list removes the entry.
    fn set(&mut self, uri: &str, symbols: Vec<SymbolNode>);

    /// Remove the entry for `uri`.
    fn remove(&mut self, uri: &str) -> Option<Vec<SymbolNode>>;
}

/// Keep only region and tag nodes, hoisting them out of other kinds.
pub fn bookmark_symbols(nodes: &[SymbolNode]) -> Vec<SymbolNode> {
    let mut out = Vec::new();
    for node in nodes {
        let children = bookmark_symbols(&node.children);
        if matches!(node.kind, SymbolKind::Region | SymbolKind::Tag) {
            let mut kept = node.clone();
            kept.children = children;
            out.push(kept);
        } else {
            out.extend(children);
        }
    }
    out
}

/// In-memory [`SymbolIndex`] bounded to `capacity` documents.
///
/// Entries are ordered by when they were last set; when full, the entry set longest ago is
/// evicted.
#[derive(Debug, Clone)]
pub struct MemorySymbolIndex {
    capacity: usize,
    entries: BTreeMap<String, (u64, Vec<SymbolNode>)>,
    clock: u64,
}

impl MemorySymbolIndex {
    /// Create an index holding at most `capacity` documents (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: BTreeMap::new(),
            clock: 0,
        }
    }

    /// Number of documents recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Document URIs, most recently set first.
    pub fn uris(&self) -> Vec<&str> {
        let mut uris: Vec<_> = self
            .entries
            .iter()
            .map(|(uri, (stamp, _))| (*stamp, uri.as_str()))
            .collect();
        uris.sort_by(|a, b| b.0.cmp(&a.0));
        uris.into_iter().map(|(_, uri)| uri).collect()
    }
}

impl Default for MemorySymbolIndex {
    fn default() -> Self {
        Self::new(256)
    }
}

impl SymbolIndex for MemorySymbolIndex {
    fn get(&self, uri: &str) -> Option<&[SymbolNode]> {
        self.entries.get(uri).map(|(_, symbols)| symbols.as_slice())
    }

    fn set(&mut self, uri: &str, symbols: Vec<SymbolNode>) {
        if symbols.is_empty() {
            self.entries.remove(uri);
            return;
        }
        self.clock += 1;
        self.entries.insert(uri.to_string(), (self.clock, symbols));
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (stamp, _))| *stamp)
                .map(|(uri, _)| uri.clone());
            match oldest {
                Some(oldest) => {
                    tracing::debug!(uri = %oldest, "evicting symbol index entry");
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn remove(&mut self, uri: &str) -> Option<Vec<SymbolNode>> {
        self.entries.remove(uri).map(|(_, symbols)| symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::TextRange;

    fn region(name: &str) -> SymbolNode {
        SymbolNode::new(SymbolKind::Region, name, TextRange::lines(0, 1))
    }

    #[test]
    fn test_bookmarks_are_hoisted() {
        let mut class = SymbolNode::new(SymbolKind::Class, "A", TextRange::lines(0, 10));
        let mut outer = region("outer");
        outer.children = vec![
            SymbolNode::new(SymbolKind::Method, "m", TextRange::lines(1, 2)),
            SymbolNode::new(SymbolKind::Tag, "todo", TextRange::lines(3, 3)),
        ];
        class.children = vec![outer];

        let kept = bookmark_symbols(&[class]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "outer");
        assert_eq!(kept[0].children.len(), 1);
        assert_eq!(kept[0].children[0].name, "todo");
    }

    #[test]
    fn test_capacity_evicts_oldest_set() {
        let mut index = MemorySymbolIndex::new(2);
        index.set("file:///a", vec![region("a")]);
        index.set("file:///b", vec![region("b")]);
        // Refresh a, so b is now the oldest.
        index.set("file:///a", vec![region("a2")]);
        index.set("file:///c", vec![region("c")]);

        assert_eq!(index.uris(), vec!["file:///c", "file:///a"]);
        assert!(index.get("file:///b").is_none());
        assert_eq!(index.get("file:///a").map(|s| s[0].name.as_str()), Some("a2"));
    }

    #[test]
    fn test_empty_set_removes() {
        let mut index = MemorySymbolIndex::default();
        index.set("file:///a", vec![region("a")]);
        index.set("file:///a", Vec::new());
        assert!(index.is_empty());
        assert!(index.remove("file:///a").is_none());
    }
}
