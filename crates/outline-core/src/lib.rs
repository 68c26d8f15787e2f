#![warn(missing_docs)]
//! Outline Core - Headless Incremental Outline Engine
//!
//! # Overview
//!
//! `outline-core` keeps a navigable symbol outline of the active document in sync with editor
//! events. It does not render anything: it produces ordered patch operations that a
//! presentation layer applies to its own tree, and only falls back to a full rebuild when
//! there is no previous tree to diff against.
//!
//! # Core Features
//!
//! - **Normalization**: arbitrary-order provider symbols become a sorted, properly nested forest
//! - **Keyed Diffing**: two-ended sibling reconciliation with move detection
//! - **Range Queries**: cursor/viewport lookups with nearest-node fallback
//! - **Region Annotations**: `#region` / `#endregion` / `#tag` comments as outline symbols
//! - **Diagnostics Badges**: per-node counts with "problem below" markers on ancestors
//! - **Stale-Work Rejection**: generation tickets discard out-of-order symbol fetches
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  OutlineSession (events -> messages)        │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  SelectionIndex / DiagnosticAggregator      │  ← Working-set updates
//! ├─────────────────────────────────────────────┤
//! │  TreeDiffer (patch ops)                     │  ← Rebuild reconciliation
//! ├─────────────────────────────────────────────┤
//! │  RangeTree (normalize, find_nodes_in)       │  ← Outline model
//! ├─────────────────────────────────────────────┤
//! │  RegionParser / RegionAssembler             │  ← Comment annotations
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use outline_core::{
//!     DocumentId, DocumentSymbol, DocumentUpdate, OutlineConfig, OutlineMessage,
//!     OutlineSession, RenderTree, SymbolKind, TextRange,
//! };
//!
//! let mut session = OutlineSession::new(OutlineConfig::default()).unwrap();
//! let mut view = RenderTree::default();
//!
//! let document = DocumentId::new("file:///src/main.rs");
//! let DocumentUpdate::Rebuild(ticket) = session.update_document(Some(&document)) else {
//!     unreachable!();
//! };
//!
//! let text = "// #region entry\nfn main() {}\n// #endregion\n";
//! let symbols = vec![DocumentSymbol::new(
//!     SymbolKind::Function,
//!     "main",
//!     TextRange::from_coords(1, 0, 1, 12),
//! )];
//! for message in session.complete_rebuild(&ticket, symbols, Some(&text)) {
//!     view.handle(&message);
//! }
//!
//! // The region wraps the function.
//! assert_eq!(view.roots().len(), 1);
//! assert_eq!(view.roots()[0].key.kind, SymbolKind::Region);
//! assert_eq!(view.roots()[0].children[0].key.name, "main");
//!
//! for message in session.on_selection_change(&[TextRange::lines(1, 1)]) {
//!     view.handle(&message);
//! }
//! assert!(view.roots()[0].children[0].focus);
//! ```
//!
//! # Module Description
//!
//! - [`tree`] - normalized outline and range queries
//! - [`diff`] - keyed tree reconciliation
//! - [`region`] - region/tag comment parsing and derived features
//! - [`outline`] - the session driver
//! - [`render`] - headless patch applier

pub mod config;
pub mod diagnostics;
pub mod diff;
pub mod error;
pub mod line_index;
pub mod outline;
pub mod patch;
pub mod provider;
pub mod region;
pub mod render;
pub mod selection;
pub mod symbols;
pub mod tree;
pub mod workspace;

pub use config::{FollowMode, OutlineConfig, RegionKeywords};
pub use diagnostics::{Diagnostic, DiagnosticAggregator, DiagnosticSeverity, DiagnosticStats};
pub use diff::{TreeDiff, TreeDiffer};
pub use error::OutlineError;
pub use line_index::{DocumentText, LineIndex};
pub use outline::{
    ClearReason, DocumentId, DocumentUpdate, MessageCallback, OutlineMessage, OutlineSession,
    RebuildTicket, ScrollTarget,
};
pub use patch::{NodeProperty, PatchOp, PropertyValue};
pub use provider::{FetchOutcome, RetryPolicy, SymbolProvider, fetch_symbols};
pub use region::{
    FoldingRange, Highlight, HighlightKind, MarkerKind, RegionAssembler, RegionEntry,
    RegionParser, RegionProblem, RegionProblemKind, RegionSet, RegionSpan, RegionToken,
    TextEdit, scan_document,
};
pub use render::{RenderNode, RenderTree};
pub use selection::{PinStatus, SelectionIndex};
pub use symbols::{DocumentSymbol, NodeKey, Position, Selector, SymbolKind, SymbolNode, TextRange};
pub use tree::{RangeQuery, RangeTree};
pub use workspace::{MemorySymbolIndex, SymbolIndex, bookmark_symbols};
