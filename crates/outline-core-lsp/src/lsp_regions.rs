//! LSP-shaped payloads for region and tag features.
//!
//! These build the JSON results a language-server front end returns for
//! `textDocument/foldingRange`, `textDocument/prepareRename` and `textDocument/rename`.

use outline_core::{Position, RegionSet, TextEdit, TextRange};
use serde_json::{Value, json};

/// Convert a range into an LSP `Range` object.
pub fn text_range_to_lsp(range: &TextRange) -> Value {
    json!({
        "start": { "line": range.start.line, "character": range.start.column },
        "end": { "line": range.end.line, "character": range.end.column },
    })
}

/// Folding ranges for every paired region, with kind `region`.
pub fn region_folding_ranges(regions: &RegionSet) -> Value {
    Value::Array(
        regions
            .folding_ranges()
            .into_iter()
            .map(|fold| {
                json!({
                    "startLine": fold.start_line,
                    "endLine": fold.end_line,
                    "kind": "region",
                })
            })
            .collect(),
    )
}

/// `prepareRename` result: the identifier range under `position`, or `null`.
pub fn region_prepare_rename(regions: &RegionSet, position: Position) -> Value {
    regions
        .prepare_rename(position)
        .map_or(Value::Null, |range| text_range_to_lsp(&range))
}

/// Convert text edits into an LSP `TextEdit[]`.
pub fn text_edits_to_lsp(edits: &[TextEdit]) -> Value {
    Value::Array(
        edits
            .iter()
            .map(|edit| json!({ "range": text_range_to_lsp(&edit.range), "newText": edit.new_text }))
            .collect(),
    )
}

/// `rename` result for `uri`: a `WorkspaceEdit`, or `null` when nothing is renamed.
pub fn region_rename(regions: &RegionSet, uri: &str, position: Position, new_name: &str) -> Value {
    let edits = regions.rename_edits(position, new_name);
    if edits.is_empty() {
        return Value::Null;
    }
    json!({ "changes": { uri: text_edits_to_lsp(&edits) } })
}
