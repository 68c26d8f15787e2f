//! Helpers for converting LSP payloads into `outline-core` models.
//!
//! This module intentionally avoids pulling in `lsp-types`. It parses the subset needed to bridge:
//! - `textDocument/documentSymbol` → `Vec<outline_core::DocumentSymbol>`
//! - `textDocument/publishDiagnostics` → `(DocumentId, Vec<outline_core::Diagnostic>)`
//!
//! Positions are taken verbatim: `character` becomes the column. The outline only orders and
//! contains by line, so UTF-16 columns do not need converting for outline purposes.

use outline_core::{
    Diagnostic, DiagnosticSeverity, DocumentId, DocumentSymbol, Position, SymbolKind, TextRange,
};
use serde_json::Value;

pub(crate) fn parse_lsp_position(value: &Value) -> Option<Position> {
    Some(Position::new(
        value.get("line")?.as_u64()? as usize,
        value.get("character")?.as_u64()? as usize,
    ))
}

pub(crate) fn parse_lsp_range(value: &Value) -> Option<TextRange> {
    Some(TextRange::new(
        parse_lsp_position(value.get("start")?)?,
        parse_lsp_position(value.get("end")?)?,
    ))
}

fn parse_document_symbol(value: &Value) -> Option<DocumentSymbol> {
    let name = value.get("name")?.as_str()?.to_string();
    let detail = value
        .get("detail")
        .and_then(Value::as_str)
        .map(|s| s.to_string());
    let kind = value.get("kind")?.as_u64()? as u32;
    let range = parse_lsp_range(value.get("range")?)?;
    let selection_range = parse_lsp_range(value.get("selectionRange")?)?;

    let children = value
        .get("children")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parse_document_symbol).collect())
        .unwrap_or_default();

    Some(DocumentSymbol {
        name,
        detail,
        kind: SymbolKind::from_lsp_kind(kind),
        range,
        selection_range,
        children,
    })
}

fn parse_symbol_information(value: &Value) -> Option<DocumentSymbol> {
    let name = value.get("name")?.as_str()?.to_string();
    let kind = value.get("kind")?.as_u64()? as u32;
    let range = parse_lsp_range(value.get("location")?.get("range")?)?;

    Some(DocumentSymbol {
        name,
        detail: value
            .get("containerName")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        kind: SymbolKind::from_lsp_kind(kind),
        range,
        selection_range: range,
        children: Vec::new(),
    })
}

/// Convert an LSP `textDocument/documentSymbol` result payload into raw outline symbols.
///
/// Supported shapes:
/// - `DocumentSymbol[]` (hierarchical)
/// - `SymbolInformation[]` (flat; the container name becomes the detail)
///
/// `null` and malformed items are skipped. Order is preserved; normalization sorts later.
pub fn lsp_document_symbols_to_symbols(result: &Value) -> Vec<DocumentSymbol> {
    let Some(arr) = result.as_array() else {
        return Vec::new();
    };

    let mut symbols = Vec::<DocumentSymbol>::with_capacity(arr.len());
    for item in arr {
        if let Some(sym) = parse_document_symbol(item) {
            symbols.push(sym);
            continue;
        }
        if let Some(sym) = parse_symbol_information(item) {
            symbols.push(sym);
            continue;
        }
        tracing::debug!(item = %item, "skipping malformed document symbol");
    }
    symbols
}

fn diagnostic_code(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_diagnostic(value: &Value) -> Option<Diagnostic> {
    Some(Diagnostic {
        range: parse_lsp_range(value.get("range")?)?,
        severity: value
            .get("severity")
            .and_then(Value::as_u64)
            .and_then(DiagnosticSeverity::from_lsp),
        code: diagnostic_code(value.get("code")),
        source: value
            .get("source")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
        message: value.get("message")?.as_str()?.to_string(),
    })
}

/// Convert `textDocument/publishDiagnostics` params into the document and its diagnostics.
///
/// Returns `None` if the params have no `uri`. Malformed diagnostics are skipped.
pub fn lsp_diagnostics_to_diagnostics(params: &Value) -> Option<(DocumentId, Vec<Diagnostic>)> {
    let uri = params.get("uri")?.as_str()?;
    let diagnostics = params
        .get("diagnostics")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(parse_diagnostic).collect())
        .unwrap_or_default();
    Some((DocumentId::new(uri), diagnostics))
}
