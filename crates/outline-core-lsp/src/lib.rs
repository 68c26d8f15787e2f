#![warn(missing_docs)]
//! `outline-core-lsp` - LSP integration for `outline-core`.
//!
//! This crate converts language server JSON payloads (`documentSymbol` results and
//! `publishDiagnostics` params) into `outline-core` inputs, wraps a request function as a
//! [`outline_core::SymbolProvider`], and renders region features back into LSP result shapes.

pub mod lsp_regions;
pub mod lsp_symbols;
pub mod provider;

pub use lsp_regions::{
    region_folding_ranges, region_prepare_rename, region_rename, text_edits_to_lsp,
    text_range_to_lsp,
};
pub use lsp_symbols::{lsp_diagnostics_to_diagnostics, lsp_document_symbols_to_symbols};
pub use provider::JsonSymbolProvider;
