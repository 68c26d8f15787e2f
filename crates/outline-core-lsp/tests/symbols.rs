use outline_core::{
    DiagnosticSeverity, DocumentId, DocumentUpdate, OutlineConfig, OutlineMessage,
    OutlineSession, SymbolKind, TextRange,
};
use outline_core_lsp::{
    JsonSymbolProvider, lsp_diagnostics_to_diagnostics, lsp_document_symbols_to_symbols,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn range(start: u64, end: u64) -> Value {
    json!({ "start": { "line": start, "character": 0 }, "end": { "line": end, "character": 1 } })
}

#[test]
fn test_hierarchical_document_symbols() {
    let result = json!([
        {
            "name": "Parser",
            "detail": "struct",
            "kind": 23,
            "range": range(0, 20),
            "selectionRange": range(0, 0),
            "children": [
                { "name": "new", "kind": 6, "range": range(2, 5), "selectionRange": range(2, 2) }
            ]
        }
    ]);

    let symbols = lsp_document_symbols_to_symbols(&result);
    assert_eq!(symbols.len(), 1);
    let parser = &symbols[0];
    assert_eq!(parser.kind, SymbolKind::Struct);
    assert_eq!(parser.detail.as_deref(), Some("struct"));
    assert_eq!(parser.range, TextRange::from_coords(0, 0, 20, 1));
    assert_eq!(parser.selection_range, TextRange::from_coords(0, 0, 0, 1));
    assert_eq!(parser.children.len(), 1);
    assert_eq!(parser.children[0].kind, SymbolKind::Method);
}

#[test]
fn test_symbol_information_shape() {
    let result = json!([
        {
            "name": "add",
            "kind": 12,
            "containerName": "math",
            "location": { "uri": "file:///math.rs", "range": range(10, 12) }
        },
        { "name": "broken" }
    ]);

    let symbols = lsp_document_symbols_to_symbols(&result);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].kind, SymbolKind::Function);
    assert_eq!(symbols[0].detail.as_deref(), Some("math"));
    assert_eq!(symbols[0].selection_range, symbols[0].range);
}

#[test]
fn test_null_result_is_empty() {
    assert!(lsp_document_symbols_to_symbols(&Value::Null).is_empty());
}

#[test]
fn test_publish_diagnostics_params() {
    let params = json!({
        "uri": "file:///main.rs",
        "version": 3,
        "diagnostics": [
            { "range": range(4, 4), "severity": 1, "code": "E0308", "source": "rustc", "message": "mismatched types" },
            { "range": range(7, 7), "severity": 2, "code": 12, "message": "unused" },
            { "range": range(9, 9), "message": "no severity" },
            { "message": "no range" }
        ]
    });

    let (document, diagnostics) = lsp_diagnostics_to_diagnostics(&params).unwrap();
    assert_eq!(document, DocumentId::new("file:///main.rs"));
    assert_eq!(diagnostics.len(), 3);
    assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::Error));
    assert_eq!(diagnostics[0].code.as_deref(), Some("E0308"));
    assert_eq!(diagnostics[0].source.as_deref(), Some("rustc"));
    assert_eq!(diagnostics[1].severity, Some(DiagnosticSeverity::Warning));
    assert_eq!(diagnostics[1].code.as_deref(), Some("12"));
    assert_eq!(diagnostics[2].severity, None);

    assert!(lsp_diagnostics_to_diagnostics(&json!({ "diagnostics": [] })).is_none());
}

#[test]
fn test_json_provider_drives_session() {
    let mut session = OutlineSession::new(OutlineConfig::default()).unwrap();
    let document = DocumentId::new("file:///main.rs");
    let DocumentUpdate::Rebuild(ticket) = session.update_document(Some(&document)) else {
        panic!("expected a rebuild ticket");
    };

    let mut responses = vec![
        json!([{ "name": "main", "kind": 12, "range": range(0, 3), "selectionRange": range(0, 0) }]),
        Value::Null,
    ];
    let mut provider = JsonSymbolProvider::new(|_: &DocumentId| {
        responses.pop().ok_or("server gone")
    });

    let messages = session.rebuild_with(&mut provider, &ticket, None, |_| {}).unwrap();
    let [OutlineMessage::Rebuild { nodes }] = messages.as_slice() else {
        panic!("expected a rebuild, got {messages:?}");
    };
    assert_eq!(nodes[0].name, "main");

    let (uri, diagnostics) = lsp_diagnostics_to_diagnostics(&json!({
        "uri": "file:///main.rs",
        "diagnostics": [{ "range": range(1, 1), "severity": 1, "message": "boom" }]
    }))
    .unwrap();
    let messages = session.on_diagnostics_change(&uri, diagnostics);
    assert_eq!(messages.len(), 1);
    assert_eq!(session.tree().unwrap().roots()[0].diagnostics.errors, 1);
}
