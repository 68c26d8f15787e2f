//! A [`SymbolProvider`] backed by raw `documentSymbol` responses.

use crate::lsp_symbols::lsp_document_symbols_to_symbols;
use outline_core::{DocumentId, DocumentSymbol, SymbolProvider};
use serde_json::Value;
use std::fmt::Display;

/// Adapts a request function returning raw `textDocument/documentSymbol` results.
///
/// `request` is typically a thin wrapper that sends the request to a language server and
/// waits for the response. A `null` result counts as "no symbols yet".
pub struct JsonSymbolProvider<F> {
    request: F,
}

impl<F, E> JsonSymbolProvider<F>
where
    F: FnMut(&DocumentId) -> Result<Value, E>,
    E: Display,
{
    /// Wrap a request function.
    pub fn new(request: F) -> Self {
        Self { request }
    }
}

impl<F, E> SymbolProvider for JsonSymbolProvider<F>
where
    F: FnMut(&DocumentId) -> Result<Value, E>,
    E: Display,
{
    type Error = E;

    fn document_symbols(&mut self, document: &DocumentId) -> Result<Vec<DocumentSymbol>, E> {
        let result = (self.request)(document)?;
        let symbols = lsp_document_symbols_to_symbols(&result);
        tracing::trace!(uri = %document.uri, count = symbols.len(), "received document symbols");
        Ok(symbols)
    }
}
