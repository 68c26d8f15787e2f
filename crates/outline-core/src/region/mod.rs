//! Comment-based region and tag annotations.
//!
//! Users mark regions with `#region name description` / `#endregion [name]` comments and
//! single points with `#tag name description`. Scanning a document yields a [`RegionSet`]
//! from which outline symbols, folding ranges, rename edits and highlight ranges derive.
//!
//! Region symbols enter the outline through the same path as provider symbols: they are
//! emitted as [`SymbolKind::Number`] with a detail prefixed by [`REGION_DETAIL_PREFIX`] or
//! [`TAG_DETAIL_PREFIX`], and [`crate::RangeTree::normalize`] remaps them.

pub mod assembler;
pub mod parser;

pub use assembler::{RegionAssembler, RegionProblem, RegionProblemKind, RegionSpan};
pub use parser::{MarkerKind, RegionEntry, RegionParser, RegionToken};

use crate::config::RegionKeywords;
use crate::line_index::DocumentText;
use crate::symbols::{DocumentSymbol, Position, SymbolKind, TextRange};

/// Detail prefix marking a placeholder symbol as a region.
pub const REGION_DETAIL_PREFIX: &str = "__outline_region__";
/// Detail prefix marking a placeholder symbol as a tag.
pub const TAG_DETAIL_PREFIX: &str = "__outline_tag__";

/// A foldable line span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldingRange {
    /// First line of the fold.
    pub start_line: usize,
    /// Last line of the fold.
    pub end_line: usize,
}

/// A replacement of `range` by `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Range to replace.
    pub range: TextRange,
    /// Replacement text.
    pub new_text: String,
}

/// Which part of an annotation a highlight covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    /// The leading keyword.
    Keyword,
    /// The identifier.
    Name,
    /// The description.
    Description,
}

/// A decoration range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    /// What is highlighted.
    pub kind: HighlightKind,
    /// Where.
    pub range: TextRange,
}

/// Result of scanning one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSet {
    /// Paired regions, in the order their closers appeared.
    pub spans: Vec<RegionSpan>,
    /// Standalone tags, in document order.
    pub tags: Vec<RegionEntry>,
    /// Annotations dropped during pairing.
    pub problems: Vec<RegionProblem>,
}

impl RegionSet {
    /// Returns true if no regions or tags were found.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.tags.is_empty()
    }

    /// Placeholder symbols for the outline, regions first.
    pub fn symbols(&self) -> Vec<DocumentSymbol> {
        let regions = self.spans.iter().filter_map(|span| {
            let identifier = span.open.identifier.as_ref()?;
            Some(placeholder(
                REGION_DETAIL_PREFIX,
                &identifier.text,
                span.open.description.as_ref(),
                span.range(),
                identifier.range,
            ))
        });
        let tags = self.tags.iter().filter_map(|tag| {
            let identifier = tag.identifier.as_ref()?;
            Some(placeholder(
                TAG_DETAIL_PREFIX,
                &identifier.text,
                tag.description.as_ref(),
                tag.range,
                identifier.range,
            ))
        });
        regions.chain(tags).collect()
    }

    /// One fold per region, from the opener's line to the closer's line.
    pub fn folding_ranges(&self) -> Vec<FoldingRange> {
        self.spans
            .iter()
            .map(|span| FoldingRange {
                start_line: span.open.range.start.line,
                end_line: span.close.range.end.line,
            })
            .collect()
    }

    /// The identifier range under `position`, if it names a tag or either end of a region.
    pub fn prepare_rename(&self, position: Position) -> Option<TextRange> {
        self.rename_ranges(position)?.first().copied()
    }

    /// Edits renaming the tag or region under `position` to `new_name`.
    ///
    /// Renaming either end of a region renames both ends; an unnamed closer is left alone.
    pub fn rename_edits(&self, position: Position, new_name: &str) -> Vec<TextEdit> {
        self.rename_ranges(position)
            .unwrap_or_default()
            .into_iter()
            .map(|range| TextEdit {
                range,
                new_text: new_name.to_string(),
            })
            .collect()
    }

    // The first range is the one under the cursor.
    fn rename_ranges(&self, position: Position) -> Option<Vec<TextRange>> {
        for tag in &self.tags {
            if let Some(identifier) = &tag.identifier {
                if identifier.range.contains_position(position) {
                    return Some(vec![identifier.range]);
                }
            }
        }
        for span in &self.spans {
            let open = span.open.identifier.as_ref().map(|t| t.range);
            let close = span.close.identifier.as_ref().map(|t| t.range);
            match (open, close) {
                (Some(open), close) if open.contains_position(position) => {
                    return Some([Some(open), close].into_iter().flatten().collect());
                }
                (open, Some(close)) if close.contains_position(position) => {
                    return Some([Some(close), open].into_iter().flatten().collect());
                }
                _ => {}
            }
        }
        None
    }

    /// Decoration ranges for every paired region and tag.
    pub fn highlights(&self) -> Vec<Highlight> {
        let mut out = Vec::new();
        let entries = self
            .spans
            .iter()
            .flat_map(|span| [&span.open, &span.close])
            .chain(self.tags.iter());
        for entry in entries {
            out.push(Highlight {
                kind: HighlightKind::Keyword,
                range: entry.leading.range,
            });
            if let Some(identifier) = &entry.identifier {
                out.push(Highlight {
                    kind: HighlightKind::Name,
                    range: identifier.range,
                });
            }
            if let Some(description) = &entry.description {
                out.push(Highlight {
                    kind: HighlightKind::Description,
                    range: description.range,
                });
            }
        }
        out
    }
}

fn placeholder(
    prefix: &str,
    name: &str,
    description: Option<&RegionToken>,
    range: TextRange,
    selection_range: TextRange,
) -> DocumentSymbol {
    let description = description.map(|token| token.text.as_str()).unwrap_or_default();
    DocumentSymbol {
        name: name.to_string(),
        detail: Some(format!("{prefix}{description}")),
        kind: SymbolKind::Number,
        range,
        selection_range,
        children: Vec::new(),
    }
}

/// Run the parser and assembler over every non-blank line of `text`.
pub fn scan_document<T: DocumentText + ?Sized>(text: &T, keywords: &RegionKeywords) -> RegionSet {
    let mut parser = RegionParser::new(keywords);
    let mut assembler = RegionAssembler::new();
    text.for_each_line(&mut |line_number, line| {
        if line.trim().is_empty() {
            return;
        }
        parser.parse(line, line_number);
        if let Some(entry) = parser.emit() {
            assembler.push(entry);
        }
    });
    let set = assembler.finish();
    tracing::trace!(
        spans = set.spans.len(),
        tags = set.tags.len(),
        problems = set.problems.len(),
        "scanned regions"
    );
    set
}
