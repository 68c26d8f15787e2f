//! The outline session: one live outline kept in sync with editor events.
//!
//! # Flow
//!
//! 1. [`OutlineSession::update_document`] is called on every edit or editor switch and hands
//!    out a [`RebuildTicket`].
//! 2. The host fetches symbols for the ticket (for example with [`crate::fetch_symbols`]),
//!    possibly on another thread and possibly slowly.
//! 3. [`OutlineSession::complete_rebuild`] installs the result if the ticket is still current
//!    and emits either a full [`OutlineMessage::Rebuild`] or a diff.
//! 4. Selection, viewport and diagnostics events produce small update batches in between.
//!
//! Every emitted message is also delivered to callbacks registered with
//! [`OutlineSession::subscribe`].

use crate::config::{FollowMode, OutlineConfig, RegionKeywords};
use crate::diagnostics::{Diagnostic, DiagnosticAggregator};
use crate::diff::TreeDiffer;
use crate::error::OutlineError;
use crate::line_index::DocumentText;
use crate::patch::PatchOp;
use crate::provider::{FetchOutcome, RetryPolicy, SymbolProvider, fetch_symbols};
use crate::region::{RegionSet, scan_document};
use crate::selection::{PinStatus, SelectionIndex};
use crate::symbols::{DocumentSymbol, SymbolKind, SymbolNode, TextRange};
use crate::tree::RangeTree;
use crate::workspace::{SymbolIndex, bookmark_symbols};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const UNSUPPORTED_SCHEMES: [&str; 3] = ["output", "vscode-scm", "walkThroughSnippet"];

/// Identity of a document, by URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId {
    /// Document URI, e.g. `file:///src/main.rs`.
    pub uri: String,
}

impl DocumentId {
    /// Create a document id.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// The URI scheme (`file`, `untitled`, ...), or `""` if the URI has none.
    pub fn scheme(&self) -> &str {
        self.uri.split_once(':').map_or("", |(scheme, _)| scheme)
    }

    /// The last path segment of the URI.
    pub fn file_name(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }

    /// Whether outlines are produced for this document at all.
    pub fn is_supported(&self) -> bool {
        let scheme = self.scheme();
        !scheme.is_empty()
            && !UNSUPPORTED_SCHEMES
                .iter()
                .any(|ignored| scheme.starts_with(ignored))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// A request to rebuild the outline of one document.
///
/// Tickets are ordered by generation; only the most recent one is current. Checking
/// [`RebuildTicket::is_current`] is cheap and thread-safe.
#[derive(Debug, Clone)]
pub struct RebuildTicket {
    document: DocumentId,
    generation: u64,
    current: Arc<AtomicU64>,
}

impl RebuildTicket {
    /// The document to rebuild.
    pub fn document(&self) -> &DocumentId {
        &self.document
    }

    /// The generation this ticket was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once a newer rebuild was requested or the session was cleared.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.generation
    }
}

/// Why the outline shows a placeholder instead of symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClearReason {
    /// No editor is active.
    NoActiveEditor,
    /// The active document has no symbols.
    NoSymbols,
    /// The active document type is not supported.
    Unsupported,
}

/// Which element the presentation should scroll into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollTarget {
    /// The focused node.
    Focus,
    /// The first node in view.
    InView,
}

/// A message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutlineMessage {
    /// Apply these patches in order.
    Update {
        /// Patch batch.
        patches: Vec<PatchOp>,
    },
    /// Replace everything with these nodes.
    Rebuild {
        /// The full tree.
        nodes: Vec<SymbolNode>,
    },
    /// Show a placeholder.
    Clear {
        /// Machine-readable reason.
        reason: ClearReason,
        /// Human-readable description.
        description: String,
    },
    /// Scroll the given element into view.
    Scroll {
        /// What to follow.
        follow: ScrollTarget,
    },
    /// Presentation settings for a freshly attached view.
    Config {
        /// Initial expansion depth; `None` means unlimited.
        depth: Option<usize>,
    },
    /// Change the displayed expansion depth by `delta` levels.
    ChangeDepth {
        /// Depth change; negative to collapse.
        delta: i32,
    },
}

/// Result of [`OutlineSession::update_document`].
#[derive(Debug)]
pub enum DocumentUpdate {
    /// The outline was cleared; nothing to fetch.
    Cleared(OutlineMessage),
    /// Fetch symbols for this ticket and pass them to [`OutlineSession::complete_rebuild`].
    Rebuild(RebuildTicket),
}

/// Callback invoked for every message the session emits.
pub type MessageCallback = Box<dyn FnMut(&OutlineMessage) + Send>;

/// A live outline for the active document.
pub struct OutlineSession {
    config: OutlineConfig,
    hidden: BTreeSet<SymbolKind>,
    keywords: RegionKeywords,
    retry: RetryPolicy,
    generation: Arc<AtomicU64>,
    document: Option<DocumentId>,
    tree: Option<RangeTree>,
    regions: RegionSet,
    selection: SelectionIndex,
    diagnostics: DiagnosticAggregator,
    last_diagnostics: Option<(DocumentId, Vec<Diagnostic>)>,
    symbol_index: Option<Box<dyn SymbolIndex + Send>>,
    callbacks: Vec<MessageCallback>,
}

impl fmt::Debug for OutlineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineSession")
            .field("document", &self.document)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("nodes", &self.tree.as_ref().map_or(0, RangeTree::len))
            .field("pin", &self.selection.pin())
            .finish_non_exhaustive()
    }
}

impl OutlineSession {
    /// Create a session. Fails if the configuration is invalid.
    pub fn new(config: OutlineConfig) -> Result<Self, OutlineError> {
        config.validate()?;
        Ok(Self {
            hidden: config.hidden_kinds(),
            keywords: config.region_keywords(),
            config,
            retry: RetryPolicy::default(),
            generation: Arc::new(AtomicU64::new(0)),
            document: None,
            tree: None,
            regions: RegionSet::default(),
            selection: SelectionIndex::new(),
            diagnostics: DiagnosticAggregator::new(),
            last_diagnostics: None,
            symbol_index: None,
            callbacks: Vec::new(),
        })
    }

    /// Record region and tag symbols of every rebuilt document in `index`.
    pub fn with_symbol_index(mut self, index: impl SymbolIndex + Send + 'static) -> Self {
        self.symbol_index = Some(Box::new(index));
        self
    }

    /// Override the retry policy used by [`OutlineSession::rebuild_with`].
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Register a callback for every emitted message.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&OutlineMessage) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Active configuration.
    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// The installed tree, if any.
    pub fn tree(&self) -> Option<&RangeTree> {
        self.tree.as_ref()
    }

    /// The document the session currently tracks.
    pub fn document(&self) -> Option<&DocumentId> {
        self.document.as_ref()
    }

    /// Regions and tags found in the last rebuilt document.
    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    /// The workspace symbol index, if one is attached.
    pub fn symbol_index(&self) -> Option<&(dyn SymbolIndex + Send)> {
        self.symbol_index.as_deref()
    }

    /// Current pin status.
    pub fn pin(&self) -> PinStatus {
        self.selection.pin()
    }

    /// Change the pin status.
    pub fn set_pin(&mut self, pin: PinStatus) {
        tracing::debug!(?pin, "pin status changed");
        self.selection.set_pin(pin);
    }

    /// Start a rebuild for `document`, or clear the outline if there is nothing to show.
    ///
    /// Any ticket handed out earlier stops being current.
    pub fn update_document(&mut self, document: Option<&DocumentId>) -> DocumentUpdate {
        let Some(document) = document else {
            return DocumentUpdate::Cleared(self.clear(ClearReason::NoActiveEditor));
        };
        if !document.is_supported() {
            return DocumentUpdate::Cleared(self.clear(ClearReason::Unsupported));
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.document = Some(document.clone());
        tracing::debug!(uri = %document.uri, generation, "rebuild requested");
        DocumentUpdate::Rebuild(RebuildTicket {
            document: document.clone(),
            generation,
            current: Arc::clone(&self.generation),
        })
    }

    /// Install the symbols fetched for `ticket`.
    ///
    /// `text` is scanned for region and tag annotations when regions are enabled. Stale
    /// tickets are ignored and produce no messages.
    pub fn complete_rebuild(
        &mut self,
        ticket: &RebuildTicket,
        symbols: Vec<DocumentSymbol>,
        text: Option<&dyn DocumentText>,
    ) -> Vec<OutlineMessage> {
        if !ticket.is_current() {
            tracing::debug!(
                uri = %ticket.document.uri,
                generation = ticket.generation,
                "discarding stale rebuild"
            );
            return Vec::new();
        }

        let mut raw = symbols;
        self.regions = match text {
            Some(text) if self.config.region_enabled => scan_document(text, &self.keywords),
            _ => RegionSet::default(),
        };
        raw.extend(self.regions.symbols());

        let mut tree = RangeTree::normalize(raw, &self.hidden);
        if tree.is_empty() {
            return vec![self.clear(ClearReason::NoSymbols)];
        }

        if let Some(index) = self.symbol_index.as_mut() {
            index.set(&ticket.document.uri, bookmark_symbols(tree.roots()));
        }

        self.selection.reset();
        self.diagnostics.reset();
        let diagnostics = match &self.last_diagnostics {
            Some((document, diagnostics)) if *document == ticket.document => diagnostics.as_slice(),
            _ => &[],
        };

        let message = match self.tree.take() {
            Some(old) => {
                let diff = TreeDiffer::diff(&old, &tree);
                tree.lend_expansion(&diff.expansion);
                let mut patches = diff.ops;
                patches.extend(self.diagnostics.apply(&mut tree, diagnostics));
                OutlineMessage::Update { patches }
            }
            None => {
                self.diagnostics.apply(&mut tree, diagnostics);
                OutlineMessage::Rebuild {
                    nodes: tree.roots().to_vec(),
                }
            }
        };

        tracing::debug!(
            uri = %ticket.document.uri,
            generation = ticket.generation,
            nodes = tree.len(),
            "rebuild installed"
        );
        self.tree = Some(tree);
        self.emit(message)
    }

    /// Fetch symbols with the session's retry policy and install them.
    ///
    /// A superseded fetch produces no messages. An exhausted fetch installs whatever regions
    /// `text` contains, which clears the outline if there are none.
    pub fn rebuild_with<P: SymbolProvider + ?Sized>(
        &mut self,
        provider: &mut P,
        ticket: &RebuildTicket,
        text: Option<&dyn DocumentText>,
        sleep: impl FnMut(Duration),
    ) -> Result<Vec<OutlineMessage>, OutlineError> {
        let outcome = fetch_symbols(provider, ticket, &self.retry, self.config.debug, sleep)?;
        Ok(match outcome {
            FetchOutcome::Symbols(symbols) => self.complete_rebuild(ticket, symbols, text),
            FetchOutcome::Empty => self.complete_rebuild(ticket, Vec::new(), text),
            FetchOutcome::Superseded => Vec::new(),
        })
    }

    /// Cursor selections changed.
    pub fn on_selection_change(&mut self, selections: &[TextRange]) -> Vec<OutlineMessage> {
        let Some(tree) = self.tree.as_mut() else {
            return Vec::new();
        };
        let patches = self.selection.focus(tree, selections);
        self.emit_updates(patches, FollowMode::Cursor, ScrollTarget::Focus)
    }

    /// Visible range changed.
    pub fn on_viewport_change(&mut self, range: &TextRange) -> Vec<OutlineMessage> {
        let Some(tree) = self.tree.as_mut() else {
            return Vec::new();
        };
        let patches = self.selection.viewport(tree, range);
        self.emit_updates(patches, FollowMode::Viewport, ScrollTarget::InView)
    }

    /// Diagnostics for `document` changed.
    ///
    /// The list is remembered and re-applied after the next rebuild of the same document.
    pub fn on_diagnostics_change(
        &mut self,
        document: &DocumentId,
        diagnostics: Vec<Diagnostic>,
    ) -> Vec<OutlineMessage> {
        let active = self.document.as_ref() == Some(document);
        self.last_diagnostics = Some((document.clone(), diagnostics));
        if !active {
            return Vec::new();
        }
        let (Some(tree), Some((_, diagnostics))) =
            (self.tree.as_mut(), self.last_diagnostics.as_ref())
        else {
            return Vec::new();
        };
        let patches = self.diagnostics.apply(tree, diagnostics);
        if patches.is_empty() {
            return Vec::new();
        }
        self.emit(OutlineMessage::Update { patches })
    }

    /// A presentation view was (re)created. Sends it the configured default depth.
    ///
    /// Call this before starting the first rebuild for the view.
    pub fn attach_view(&mut self) -> Vec<OutlineMessage> {
        let depth = self.config.max_depth();
        tracing::debug!(?depth, "view attached");
        self.emit(OutlineMessage::Config { depth })
    }

    /// Ask the presentation to show `delta` more (or fewer) levels.
    pub fn change_depth(&mut self, delta: i32) -> Vec<OutlineMessage> {
        self.emit(OutlineMessage::ChangeDepth { delta })
    }

    /// Drop the tree and show a placeholder. Pending rebuild tickets become stale.
    pub fn clear(&mut self, reason: ClearReason) -> OutlineMessage {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.tree = None;
        self.regions = RegionSet::default();
        self.selection.reset();
        self.diagnostics.reset();

        let description = match (reason, self.document.as_ref()) {
            (ClearReason::NoSymbols, Some(document)) => {
                format!("No symbols found in document '{}'.", document.file_name())
            }
            (ClearReason::NoSymbols, None) => "No symbols found.".to_string(),
            (ClearReason::NoActiveEditor, _) => {
                "The active editor cannot provide outline information.".to_string()
            }
            (ClearReason::Unsupported, _) => {
                "The active document is not supported by the outline.".to_string()
            }
        };
        if reason != ClearReason::NoSymbols {
            self.document = None;
        }
        tracing::debug!(?reason, "outline cleared");

        let message = OutlineMessage::Clear {
            reason,
            description,
        };
        self.notify(&message);
        message
    }

    fn emit_updates(
        &mut self,
        patches: Vec<PatchOp>,
        follow: FollowMode,
        target: ScrollTarget,
    ) -> Vec<OutlineMessage> {
        if patches.is_empty() {
            return Vec::new();
        }
        let mut messages = self.emit(OutlineMessage::Update { patches });
        if self.config.follow == follow {
            messages.extend(self.emit(OutlineMessage::Scroll { follow: target }));
        }
        messages
    }

    fn emit(&mut self, message: OutlineMessage) -> Vec<OutlineMessage> {
        if let OutlineMessage::Update { patches } = &message {
            tracing::debug!(patches = patches.len(), "emitting update");
        }
        self.notify(&message);
        vec![message]
    }

    fn notify(&mut self, message: &OutlineMessage) {
        for callback in &mut self.callbacks {
            callback(message);
        }
    }
}
