use outline_core::{
    ClearReason, Diagnostic, DiagnosticSeverity, DocumentId, DocumentSymbol, DocumentUpdate,
    FollowMode, LineIndex, MemorySymbolIndex, OutlineConfig, OutlineError, OutlineMessage,
    OutlineSession, PinStatus, RebuildTicket, RenderTree, RetryPolicy, ScrollTarget,
    SymbolIndex, SymbolKind, SymbolProvider, TextRange,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn ticket(session: &mut OutlineSession, document: &DocumentId) -> RebuildTicket {
    match session.update_document(Some(document)) {
        DocumentUpdate::Rebuild(ticket) => ticket,
        DocumentUpdate::Cleared(message) => panic!("unexpected clear {message:?}"),
    }
}

fn feed(view: &mut RenderTree, messages: &[OutlineMessage]) {
    for message in messages {
        view.handle(message);
    }
}

fn assert_in_sync(view: &RenderTree, session: &OutlineSession) {
    let expected = RenderTree::from_nodes(session.tree().map(|tree| tree.roots()).unwrap_or_default());
    assert_eq!(view.roots(), expected.roots());
}

/// A class with a random subset of methods, plus a random set of free functions.
fn random_symbols(rng: &mut StdRng) -> Vec<DocumentSymbol> {
    let mut out = Vec::new();
    let mut line = 0;
    let methods: Vec<DocumentSymbol> = ["new", "get", "set", "len", "clear"]
        .iter()
        .filter(|_| rng.gen_bool(0.6))
        .map(|name| {
            line += 2;
            DocumentSymbol::new(SymbolKind::Method, *name, TextRange::lines(line, line + 1))
        })
        .collect();
    line += 3;
    out.push(
        DocumentSymbol::new(SymbolKind::Class, "Store", TextRange::lines(0, line))
            .with_detail(if rng.gen_bool(0.5) { "pub" } else { "" })
            .with_children(methods),
    );
    for name in ["main", "helper", "parse", "render"] {
        if rng.gen_bool(0.5) {
            line += 4;
            out.push(DocumentSymbol::new(
                SymbolKind::Function,
                name,
                TextRange::lines(line, line + 2),
            ));
        }
    }
    out
}

#[test]
fn test_random_event_stream_keeps_view_in_sync() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut session = OutlineSession::new(OutlineConfig::default()).unwrap();
    let mut view = RenderTree::default();
    let document = DocumentId::new("file:///src/store.rs");

    for _ in 0..400 {
        let messages = match rng.gen_range(0..5) {
            0 => {
                let t = ticket(&mut session, &document);
                session.complete_rebuild(&t, random_symbols(&mut rng), None)
            }
            1 => {
                let line = rng.gen_range(0..40);
                session.on_selection_change(&[TextRange::lines(line, line)])
            }
            2 => {
                let start = rng.gen_range(0..40);
                session.on_viewport_change(&TextRange::lines(start, start + 10))
            }
            3 => {
                let diagnostics = (0..rng.gen_range(0..4))
                    .map(|_| {
                        let line = rng.gen_range(0..40);
                        let severity = if rng.gen_bool(0.5) {
                            DiagnosticSeverity::Error
                        } else {
                            DiagnosticSeverity::Warning
                        };
                        Diagnostic::new(TextRange::lines(line, line), severity, "problem")
                    })
                    .collect();
                session.on_diagnostics_change(&document, diagnostics)
            }
            _ => {
                let pin = match rng.gen_range(0..3) {
                    0 => PinStatus::Unpinned,
                    1 => PinStatus::Pinned,
                    _ => PinStatus::Frozen,
                };
                session.set_pin(pin);
                Vec::new()
            }
        };
        feed(&mut view, &messages);
        if session.tree().is_some() {
            assert_in_sync(&view, &session);
        }
    }
}

#[test]
fn test_edit_then_rebuild_emits_minimal_update() {
    let mut session = OutlineSession::new(OutlineConfig::default()).unwrap();
    let mut view = RenderTree::default();
    let document = DocumentId::new("file:///src/app.ts");

    let mut text = LineIndex::from_text("class App {\n  run() {}\n}\n");
    let symbols = |first_line: usize| {
        vec![
            DocumentSymbol::new(
                SymbolKind::Class,
                "App",
                TextRange::lines(first_line, first_line + 2),
            )
            .with_children(vec![DocumentSymbol::new(
                SymbolKind::Method,
                "run",
                TextRange::lines(first_line + 1, first_line + 1),
            )]),
        ]
    };

    let t = ticket(&mut session, &document);
    feed(
        &mut view,
        &session.complete_rebuild(&t, symbols(0), Some(&text)),
    );
    assert_in_sync(&view, &session);

    text.replace(0, 0, "// #region app\n");
    text.replace(text.char_count(), text.char_count(), "// #endregion\n");
    let t = ticket(&mut session, &document);
    let messages = session.complete_rebuild(&t, symbols(1), Some(&text));
    let [OutlineMessage::Update { patches }] = messages.as_slice() else {
        panic!("expected a single update, got {messages:?}");
    };
    // The region is new at the top level and App moves into it.
    assert!(patches.iter().any(|op| op.is_structural()));
    feed(&mut view, &messages);
    assert_in_sync(&view, &session);
    assert_eq!(view.roots()[0].key.kind, SymbolKind::Region);
}

#[test]
fn test_follow_mode_controls_scroll() {
    let config = OutlineConfig {
        follow: FollowMode::Cursor,
        ..OutlineConfig::default()
    };
    let mut session = OutlineSession::new(config).unwrap();
    let document = DocumentId::new("file:///a.py");
    let t = ticket(&mut session, &document);
    session.complete_rebuild(
        &t,
        vec![DocumentSymbol::new(SymbolKind::Function, "f", TextRange::lines(0, 5))],
        None,
    );

    let messages = session.on_selection_change(&[TextRange::lines(2, 2)]);
    assert_eq!(
        messages.last(),
        Some(&OutlineMessage::Scroll {
            follow: ScrollTarget::Focus
        })
    );
    let messages = session.on_viewport_change(&TextRange::lines(0, 3));
    assert!(!messages.is_empty());
    assert!(!messages
        .iter()
        .any(|message| matches!(message, OutlineMessage::Scroll { .. })));
}

#[test]
fn test_frozen_outline_ignores_editor_events() {
    let mut session = OutlineSession::new(OutlineConfig::default()).unwrap();
    let document = DocumentId::new("file:///a.py");
    let t = ticket(&mut session, &document);
    session.complete_rebuild(
        &t,
        vec![DocumentSymbol::new(SymbolKind::Function, "f", TextRange::lines(0, 5))],
        None,
    );

    session.set_pin(PinStatus::Frozen);
    assert!(session.on_selection_change(&[TextRange::lines(2, 2)]).is_empty());
    assert!(session.on_viewport_change(&TextRange::lines(0, 3)).is_empty());
}

#[test]
fn test_unsupported_and_missing_documents_clear() {
    let mut session = OutlineSession::new(OutlineConfig::default()).unwrap();
    let mut view = RenderTree::default();
    match session.update_document(Some(&DocumentId::new("output:tasks"))) {
        DocumentUpdate::Cleared(message) => view.handle(&message),
        DocumentUpdate::Rebuild(_) => panic!("output channels have no outline"),
    }
    assert_eq!(view.placeholder().map(|(reason, _)| *reason), Some(ClearReason::Unsupported));
    assert!(session.document().is_none());
}

struct SlowServer {
    calls: usize,
    ready_after: usize,
}

impl SymbolProvider for SlowServer {
    type Error = std::convert::Infallible;

    fn document_symbols(
        &mut self,
        _document: &DocumentId,
    ) -> Result<Vec<DocumentSymbol>, Self::Error> {
        self.calls += 1;
        if self.calls < self.ready_after {
            return Ok(Vec::new());
        }
        Ok(vec![DocumentSymbol::new(
            SymbolKind::Function,
            "main",
            TextRange::lines(0, 3),
        )])
    }
}

#[test]
fn test_rebuild_with_retries_until_ready() {
    let mut session = OutlineSession::new(OutlineConfig::default())
        .unwrap()
        .with_symbol_index(MemorySymbolIndex::default());
    let document = DocumentId::new("file:///main.go");
    let t = ticket(&mut session, &document);

    let mut server = SlowServer {
        calls: 0,
        ready_after: 3,
    };
    let mut waited = Duration::ZERO;
    let messages = session
        .rebuild_with(&mut server, &t, None, |delay| waited += delay)
        .unwrap();
    assert_eq!(server.calls, 3);
    assert_eq!(waited, Duration::from_millis(300 + 600));
    assert!(matches!(messages.as_slice(), [OutlineMessage::Rebuild { .. }]));
    // No regions or tags, so nothing is bookmarked.
    assert_eq!(session.symbol_index().unwrap().get(&document.uri), None);
}

#[test]
fn test_rebuild_with_gives_up() {
    let config = OutlineConfig {
        debug: true,
        ..OutlineConfig::default()
    };
    let mut session = OutlineSession::new(config).unwrap().with_retry_policy(RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(1),
    });
    let document = DocumentId::new("file:///main.go");
    let t = ticket(&mut session, &document);

    let mut server = SlowServer {
        calls: 0,
        ready_after: usize::MAX,
    };
    let err = session
        .rebuild_with(&mut server, &t, None, |_| {})
        .unwrap_err();
    assert!(matches!(err, OutlineError::SymbolsUnavailable { attempts: 2, .. }));
}

#[test]
fn test_attached_view_starts_at_configured_depth() {
    let config = OutlineConfig::from_json_str(r#"{ "defaultMaxDepth": 2 }"#).unwrap();
    let mut session = OutlineSession::new(config).unwrap();
    let mut view = RenderTree::new(None);
    feed(&mut view, &session.attach_view());

    let document = DocumentId::new("file:///src/store.rs");
    let t = ticket(&mut session, &document);
    let symbols = vec![
        DocumentSymbol::new(SymbolKind::Module, "outer", TextRange::lines(0, 20)).with_children(
            vec![
                DocumentSymbol::new(SymbolKind::Class, "Store", TextRange::lines(1, 10))
                    .with_children(vec![DocumentSymbol::new(
                        SymbolKind::Method,
                        "get",
                        TextRange::lines(2, 3),
                    )]),
            ],
        ),
    ];
    feed(&mut view, &session.complete_rebuild(&t, symbols, None));

    assert_eq!(view.max_depth(), Some(2));
    assert_eq!(view.depth(), 3);
    assert_in_sync(&view, &session);

    feed(&mut view, &session.change_depth(1));
    assert_eq!(view.max_depth(), Some(3));
}
