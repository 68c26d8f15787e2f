//! Symbol data model shared by the outline pipeline.
//!
//! This module provides UI-agnostic types for:
//! - positions and ranges in `(line, column)` coordinates
//! - raw symbol records as supplied by a symbol provider ([`DocumentSymbol`])
//! - normalized outline nodes carrying display state ([`SymbolNode`])
//! - the `(kind, name)` keys and key paths used to address nodes in patches

use crate::diagnostics::DiagnosticStats;
use serde::{Serialize, Serializer};
use std::fmt;

/// A zero-based `(line, column)` position.
///
/// Columns are counted in Unicode scalar values (`char`) unless the producer of the position
/// documents otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column within the line.
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open range (`start..end`) in `(line, column)` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TextRange {
    /// Range start position (inclusive).
    pub start: Position,
    /// Range end position (exclusive).
    pub end: Position,
}

impl TextRange {
    /// Create a new range. The endpoints are swapped if given in reverse order.
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Shorthand for `TextRange::new(Position::new(..), Position::new(..))`.
    pub fn from_coords(
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self::new(
            Position::new(start_line, start_column),
            Position::new(end_line, end_column),
        )
    }

    /// A range spanning whole lines `start_line..=end_line`, columns ignored.
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self::from_coords(start_line, 0, end_line, 0)
    }

    /// Returns true if `other` lies fully inside this range.
    pub fn contains_range(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if `pos` lies inside this range, both endpoints inclusive.
    pub fn contains_position(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Returns true if `other` lies within the lines spanned by this range (columns ignored).
    pub fn contains_lines(&self, other: &TextRange) -> bool {
        self.start.line <= other.start.line && other.end.line <= self.end.line
    }

    /// The smallest range covering both `self` and `other`.
    pub fn union(&self, other: &TextRange) -> TextRange {
        TextRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A coarse symbol kind tag.
///
/// The first 26 variants mirror the LSP `SymbolKind` enumeration. [`SymbolKind::Region`] and
/// [`SymbolKind::Tag`] are synthetic kinds produced from comment annotations; providers
/// cannot emit them directly, so region symbols travel as [`SymbolKind::Number`] with a
/// sentinel-prefixed detail string (see [`crate::region`]) and are remapped during
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolKind {
    /// A file-level symbol.
    File,
    /// A module symbol.
    Module,
    /// A namespace symbol.
    Namespace,
    /// A package symbol.
    Package,
    /// A class symbol.
    Class,
    /// A method symbol.
    Method,
    /// A property symbol.
    Property,
    /// A field symbol.
    Field,
    /// A constructor symbol.
    Constructor,
    /// An enum symbol.
    Enum,
    /// An interface symbol.
    Interface,
    /// A function symbol.
    Function,
    /// A variable symbol.
    Variable,
    /// A constant symbol.
    Constant,
    /// A string literal / string-like symbol.
    String,
    /// A numeric symbol.
    Number,
    /// A boolean symbol.
    Boolean,
    /// An array symbol.
    Array,
    /// An object symbol.
    Object,
    /// A key symbol.
    Key,
    /// A null symbol.
    Null,
    /// An enum member symbol.
    EnumMember,
    /// A struct symbol.
    Struct,
    /// An event symbol.
    Event,
    /// An operator symbol.
    Operator,
    /// A type parameter symbol.
    TypeParameter,
    /// A folding region delimited by open/close comment markers.
    Region,
    /// A standalone tag comment.
    Tag,
    /// An integration-defined kind value.
    Custom(u32),
}

const NAMED_KINDS: [SymbolKind; 28] = [
    SymbolKind::File,
    SymbolKind::Module,
    SymbolKind::Namespace,
    SymbolKind::Package,
    SymbolKind::Class,
    SymbolKind::Method,
    SymbolKind::Property,
    SymbolKind::Field,
    SymbolKind::Constructor,
    SymbolKind::Enum,
    SymbolKind::Interface,
    SymbolKind::Function,
    SymbolKind::Variable,
    SymbolKind::Constant,
    SymbolKind::String,
    SymbolKind::Number,
    SymbolKind::Boolean,
    SymbolKind::Array,
    SymbolKind::Object,
    SymbolKind::Key,
    SymbolKind::Null,
    SymbolKind::EnumMember,
    SymbolKind::Struct,
    SymbolKind::Event,
    SymbolKind::Operator,
    SymbolKind::TypeParameter,
    SymbolKind::Region,
    SymbolKind::Tag,
];

impl SymbolKind {
    /// Convert an LSP `SymbolKind` numeric value into a [`SymbolKind`].
    pub fn from_lsp_kind(kind: u32) -> Self {
        match kind {
            1..=26 => NAMED_KINDS[(kind - 1) as usize],
            other => Self::Custom(other),
        }
    }

    /// The display name of the kind (`"Class"`, `"EnumMember"`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Module => "Module",
            Self::Namespace => "Namespace",
            Self::Package => "Package",
            Self::Class => "Class",
            Self::Method => "Method",
            Self::Property => "Property",
            Self::Field => "Field",
            Self::Constructor => "Constructor",
            Self::Enum => "Enum",
            Self::Interface => "Interface",
            Self::Function => "Function",
            Self::Variable => "Variable",
            Self::Constant => "Constant",
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Array => "Array",
            Self::Object => "Object",
            Self::Key => "Key",
            Self::Null => "Null",
            Self::EnumMember => "EnumMember",
            Self::Struct => "Struct",
            Self::Event => "Event",
            Self::Operator => "Operator",
            Self::TypeParameter => "TypeParameter",
            Self::Region => "Region",
            Self::Tag => "Tag",
            Self::Custom(_) => "Custom",
        }
    }

    /// Look up a named kind, ignoring ASCII case. Custom kinds have no name and never match.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_KINDS
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(value) => write!(f, "Custom{}", value),
            named => f.write_str(named.name()),
        }
    }
}

impl Serialize for SymbolKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A raw symbol record as supplied by a symbol provider (hierarchical, arbitrary order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSymbol {
    /// Symbol name (e.g. function name).
    pub name: String,
    /// Optional detail string (e.g. type signature).
    pub detail: Option<String>,
    /// Symbol kind as reported by the provider.
    pub kind: SymbolKind,
    /// Full symbol span.
    pub range: TextRange,
    /// Span revealed when navigating to the symbol; lies within `range`.
    pub selection_range: TextRange,
    /// Child symbols.
    pub children: Vec<DocumentSymbol>,
}

impl DocumentSymbol {
    /// Create a leaf symbol whose selection range equals its range.
    pub fn new(kind: SymbolKind, name: impl Into<String>, range: TextRange) -> Self {
        Self {
            name: name.into(),
            detail: None,
            kind,
            range,
            selection_range: range,
            children: Vec::new(),
        }
    }

    /// Attach a detail string.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach child symbols.
    pub fn with_children(mut self, children: Vec<DocumentSymbol>) -> Self {
        self.children = children;
        self
    }
}

/// The `(kind, name)` identity of a node among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    /// Node kind.
    pub kind: SymbolKind,
    /// Node name.
    pub name: String,
}

impl NodeKey {
    /// Create a new key.
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.name)
    }
}

impl Serialize for NodeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A stable address of a node: the keys of its ancestors from the root, followed by its own.
///
/// The empty selector addresses the root container. Selectors are recomputed on every
/// rebuild and never refer to memory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Selector(Vec<NodeKey>);

impl Selector {
    /// The selector of the root container.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a selector from a key path.
    pub fn from_keys(keys: Vec<NodeKey>) -> Self {
        Self(keys)
    }

    /// The selector of the child `key` of the node addressed by `self`.
    pub fn child(&self, key: NodeKey) -> Self {
        let mut keys = self.0.clone();
        keys.push(key);
        Self(keys)
    }

    /// The selector of the parent container, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.0.split_last()?;
        Some(Self(parent.to_vec()))
    }

    /// The key path.
    pub fn keys(&self) -> &[NodeKey] {
        &self.0
    }

    /// The last key, i.e. the addressed node's own key.
    pub fn last(&self) -> Option<&NodeKey> {
        self.0.last()
    }

    /// Number of keys (the depth of the addressed node; 0 for the root).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root selector.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("#root");
        }
        for (idx, key) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

/// One normalized outline entry, carrying display state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolNode {
    /// Node kind (after synthetic-kind remapping).
    pub kind: SymbolKind,
    /// Node name.
    pub name: String,
    /// Free-form detail text (sentinel prefixes stripped).
    pub detail: String,
    /// Full node span.
    pub range: TextRange,
    /// Span revealed when navigating to the node.
    pub selection_range: TextRange,
    /// Whether the node is expanded in the presentation.
    pub expand: bool,
    /// Whether the node intersects the editor viewport.
    pub in_view: bool,
    /// Whether the node intersects a cursor selection.
    pub focus: bool,
    /// Aggregated diagnostics for the node.
    pub diagnostics: DiagnosticStats,
    /// Child nodes, sorted by start line.
    pub children: Vec<SymbolNode>,
    /// Address of this node.
    pub path: Selector,
}

impl SymbolNode {
    /// Create a childless node with cleared display state.
    pub fn new(kind: SymbolKind, name: impl Into<String>, range: TextRange) -> Self {
        let name = name.into();
        let path = Selector::root().child(NodeKey::new(kind, name.clone()));
        Self {
            kind,
            name,
            detail: String::new(),
            range,
            selection_range: range,
            expand: false,
            in_view: false,
            focus: false,
            diagnostics: DiagnosticStats::default(),
            children: Vec::new(),
            path,
        }
    }

    /// The `(kind, name)` key of this node.
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.kind, self.name.clone())
    }

    /// Returns true if both nodes share the same `(kind, name)` key.
    pub fn same_key(&self, other: &SymbolNode) -> bool {
        self.kind == other.kind && self.name == other.name
    }

    /// Collect this node and all descendants in pre-order.
    pub fn flatten_preorder<'a>(&'a self, out: &mut Vec<&'a SymbolNode>) {
        out.push(self);
        for child in &self.children {
            child.flatten_preorder(out);
        }
    }

    /// Recompute `path` for this node and its subtree, given the parent's selector.
    pub(crate) fn assign_paths(&mut self, parent: &Selector) {
        self.path = parent.child(self.key());
        let path = self.path.clone();
        for child in &mut self.children {
            child.assign_paths(&path);
        }
    }
}
