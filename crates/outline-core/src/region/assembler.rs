//! Pairing of region openers and closers.

use super::parser::{MarkerKind, RegionEntry};
use super::RegionSet;
use crate::symbols::TextRange;

/// An opener paired with its closer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSpan {
    /// The opening annotation.
    pub open: RegionEntry,
    /// The closing annotation.
    pub close: RegionEntry,
}

impl RegionSpan {
    /// The region name, taken from the opener.
    pub fn name(&self) -> &str {
        self.open.name().unwrap_or_default()
    }

    /// Span from the opener's keyword to the end of the closer.
    pub fn range(&self) -> TextRange {
        self.open.range.union(&self.close.range)
    }
}

/// Why an annotation did not take part in a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionProblemKind {
    /// A closer with no opener to pair with.
    UnmatchedClose,
    /// An opener still unpaired at the end of the document.
    UnclosedOpen,
}

/// An annotation that was dropped during pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionProblem {
    /// What went wrong.
    pub kind: RegionProblemKind,
    /// The dropped annotation.
    pub entry: RegionEntry,
}

impl RegionProblem {
    /// A one-line description suitable for a problems panel.
    pub fn message(&self) -> String {
        let name = self.entry.name().unwrap_or("<unnamed>");
        match self.kind {
            RegionProblemKind::UnmatchedClose => {
                format!("`{}` closes no open region named `{}`", self.entry.leading.text, name)
            }
            RegionProblemKind::UnclosedOpen => format!("region `{}` is never closed", name),
        }
    }
}

/// Pairs a document's annotations, in document order, into spans and tags.
#[derive(Debug, Default)]
pub struct RegionAssembler {
    pending: Vec<RegionEntry>,
    spans: Vec<RegionSpan>,
    tags: Vec<RegionEntry>,
    problems: Vec<RegionProblem>,
}

impl RegionAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next annotation.
    ///
    /// A named closer pairs with the most recent pending opener of the same name; an unnamed
    /// closer pairs with the most recent pending opener of any name.
    pub fn push(&mut self, entry: RegionEntry) {
        match entry.marker {
            MarkerKind::Tag => self.tags.push(entry),
            MarkerKind::Open => self.pending.push(entry),
            MarkerKind::Close => {
                let index = match entry.name() {
                    Some(name) => self
                        .pending
                        .iter()
                        .rposition(|open| open.name() == Some(name)),
                    None => self.pending.len().checked_sub(1),
                };
                match index {
                    Some(index) => {
                        let open = self.pending.remove(index);
                        self.spans.push(RegionSpan { open, close: entry });
                    }
                    None => {
                        tracing::trace!(line = entry.range.start.line, "unmatched region close");
                        self.problems.push(RegionProblem {
                            kind: RegionProblemKind::UnmatchedClose,
                            entry,
                        });
                    }
                }
            }
        }
    }

    /// Number of openers waiting for a closer.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Finish the document. Openers still pending become problems.
    pub fn finish(mut self) -> RegionSet {
        for entry in self.pending.drain(..) {
            tracing::trace!(line = entry.range.start.line, "unclosed region open");
            self.problems.push(RegionProblem {
                kind: RegionProblemKind::UnclosedOpen,
                entry,
            });
        }
        RegionSet {
            spans: self.spans,
            tags: self.tags,
            problems: self.problems,
        }
    }
}
