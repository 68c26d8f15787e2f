//! Headless presentation model.
//!
//! [`RenderTree`] applies [`OutlineMessage`]s the way a UI would: nodes are addressed by
//! `(kind, name)` inside their container, and ops that refer to missing nodes are ignored.
//! It backs tests and hosts without a UI of their own.

use crate::diagnostics::DiagnosticSeverity;
use crate::outline::{ClearReason, OutlineMessage};
use crate::patch::{NodeProperty, PatchOp, PropertyValue};
use crate::symbols::{NodeKey, Selector, SymbolNode, TextRange};

/// A rendered outline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderNode {
    /// Identity within the parent container.
    pub key: NodeKey,
    /// Detail text.
    pub detail: String,
    /// Full span.
    pub range: TextRange,
    /// Navigation span.
    pub selection_range: TextRange,
    /// Expansion flag as requested by the engine.
    pub expand: bool,
    /// Viewport flag.
    pub in_view: bool,
    /// Focus flag.
    pub focus: bool,
    /// Badge severity.
    pub diagnostic_type: Option<DiagnosticSeverity>,
    /// Badge count (`-1` for "in a descendant").
    pub diagnostic_count: i64,
    /// Child entries.
    pub children: Vec<RenderNode>,
}

impl From<&SymbolNode> for RenderNode {
    fn from(node: &SymbolNode) -> Self {
        let (diagnostic_type, diagnostic_count) = node.diagnostics.report();
        Self {
            key: node.key(),
            detail: node.detail.clone(),
            range: node.range,
            selection_range: node.selection_range,
            expand: node.expand,
            in_view: node.in_view,
            focus: node.focus,
            diagnostic_type,
            diagnostic_count,
            children: node.children.iter().map(RenderNode::from).collect(),
        }
    }
}

/// The presentation state built from a message stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTree {
    roots: Vec<RenderNode>,
    max_depth: Option<usize>,
    placeholder: Option<(ClearReason, String)>,
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RenderTree {
    /// Create an empty tree. `max_depth` limits how many levels may be expanded.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            roots: Vec::new(),
            max_depth,
            placeholder: None,
        }
    }

    /// Render a node list directly.
    pub fn from_nodes(nodes: &[SymbolNode]) -> Self {
        Self {
            roots: nodes.iter().map(RenderNode::from).collect(),
            ..Self::default()
        }
    }

    /// Top-level entries.
    pub fn roots(&self) -> &[RenderNode] {
        &self.roots
    }

    /// The placeholder shown after a clear, if any.
    pub fn placeholder(&self) -> Option<&(ClearReason, String)> {
        self.placeholder.as_ref()
    }

    /// Current depth limit.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Shift the depth limit by `delta`, never below one level. Unlimited trees start from
    /// their actual depth.
    pub fn change_depth(&mut self, delta: i32) {
        let current = self.max_depth.unwrap_or_else(|| self.depth());
        let next = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            current.saturating_add(delta as usize)
        };
        self.max_depth = Some(next.max(1));
    }

    /// Number of levels in the tree.
    pub fn depth(&self) -> usize {
        fn depth(nodes: &[RenderNode]) -> usize {
            nodes
                .iter()
                .map(|node| 1 + depth(&node.children))
                .max()
                .unwrap_or(0)
        }
        depth(&self.roots)
    }

    /// Paths of every entry in pre-order.
    pub fn keys(&self) -> Vec<Selector> {
        fn walk(nodes: &[RenderNode], parent: &Selector, out: &mut Vec<Selector>) {
            for node in nodes {
                let path = parent.child(node.key.clone());
                out.push(path.clone());
                walk(&node.children, &path, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.roots, &Selector::root(), &mut out);
        out
    }

    /// Resolve a node by path.
    pub fn get(&self, selector: &Selector) -> Option<&RenderNode> {
        let (first, rest) = selector.keys().split_first()?;
        let mut node = self.roots.iter().find(|n| &n.key == first)?;
        for key in rest {
            node = node.children.iter().find(|n| &n.key == key)?;
        }
        Some(node)
    }

    /// Whether the entry at `selector` is displayed expanded: its own flag, limited by the
    /// depth limit (top-level entries are at depth 0).
    pub fn is_expanded(&self, selector: &Selector) -> bool {
        let Some(node) = self.get(selector) else {
            return false;
        };
        let depth = selector.depth().saturating_sub(1);
        node.expand && self.max_depth.is_none_or(|max| depth < max)
    }

    /// Apply one message.
    pub fn handle(&mut self, message: &OutlineMessage) {
        match message {
            OutlineMessage::Update { patches } => self.apply_all(patches),
            OutlineMessage::Rebuild { nodes } => {
                self.placeholder = None;
                self.roots = nodes.iter().map(RenderNode::from).collect();
            }
            OutlineMessage::Clear {
                reason,
                description,
            } => {
                self.roots.clear();
                self.placeholder = Some((*reason, description.clone()));
            }
            OutlineMessage::Config { depth } => self.max_depth = *depth,
            OutlineMessage::ChangeDepth { delta } => self.change_depth(*delta),
            OutlineMessage::Scroll { .. } => {}
        }
    }

    /// Apply a batch of ops in order.
    pub fn apply_all(&mut self, ops: &[PatchOp]) {
        if !ops.is_empty() {
            self.placeholder = None;
        }
        for op in ops {
            self.apply(op);
        }
    }

    /// Apply one op. Ops addressing missing nodes do nothing.
    pub fn apply(&mut self, op: &PatchOp) {
        match op {
            PatchOp::Update {
                selector,
                property,
                value,
            } => {
                if let Some(node) = self.get_mut(selector) {
                    set_property(node, *property, value);
                }
            }
            PatchOp::Insert {
                selector,
                before,
                nodes,
            } => {
                let Some(container) = self.container_mut(selector) else {
                    return;
                };
                let at = position_before(container, before.as_ref());
                container.splice(at..at, nodes.iter().map(RenderNode::from));
            }
            PatchOp::Delete { selector, nodes } => {
                let Some(container) = self.container_mut(selector) else {
                    return;
                };
                for key in nodes {
                    if let Some(index) = container.iter().position(|n| &n.key == key) {
                        container.remove(index);
                    }
                }
            }
            PatchOp::Move {
                selector,
                nodes,
                before,
            } => {
                let Some(container) = self.container_mut(selector) else {
                    return;
                };
                let moved: Vec<RenderNode> = nodes
                    .iter()
                    .filter_map(|key| {
                        let index = container.iter().position(|n| &n.key == key)?;
                        Some(container.remove(index))
                    })
                    .collect();
                let at = position_before(container, before.as_ref());
                container.splice(at..at, moved);
            }
        }
    }

    fn get_mut(&mut self, selector: &Selector) -> Option<&mut RenderNode> {
        let (first, rest) = selector.keys().split_first()?;
        let mut node = self.roots.iter_mut().find(|n| &n.key == first)?;
        for key in rest {
            node = node.children.iter_mut().find(|n| &n.key == key)?;
        }
        Some(node)
    }

    fn container_mut(&mut self, selector: &Selector) -> Option<&mut Vec<RenderNode>> {
        if selector.is_root() {
            return Some(&mut self.roots);
        }
        self.get_mut(selector).map(|node| &mut node.children)
    }
}

fn position_before(container: &[RenderNode], before: Option<&NodeKey>) -> usize {
    before
        .and_then(|key| container.iter().position(|n| &n.key == key))
        .unwrap_or(container.len())
}

fn set_property(node: &mut RenderNode, property: NodeProperty, value: &PropertyValue) {
    match (property, value) {
        (NodeProperty::Detail, PropertyValue::Text(text)) => node.detail = text.clone(),
        (NodeProperty::Range, PropertyValue::Range(range)) => node.range = *range,
        (NodeProperty::SelectionRange, PropertyValue::Range(range)) => {
            node.selection_range = *range
        }
        (NodeProperty::Expand, PropertyValue::Bool(flag)) => node.expand = *flag,
        (NodeProperty::InView, PropertyValue::Bool(flag)) => node.in_view = *flag,
        (NodeProperty::Focus, PropertyValue::Bool(flag)) => node.focus = *flag,
        (NodeProperty::DiagnosticType, PropertyValue::Severity(severity)) => {
            node.diagnostic_type = *severity
        }
        (NodeProperty::DiagnosticCount, PropertyValue::Count(count)) => {
            node.diagnostic_count = *count
        }
        (property, value) => {
            tracing::warn!(%property, ?value, "ignoring update with mismatched value type");
        }
    }
}
