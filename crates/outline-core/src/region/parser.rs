//! Line-level lexer for region and tag annotations.
//!
//! An annotation line has three parts:
//! - a leading keyword (`#region`, `#endregion`, `#tag` by default), which may be glued to
//!   preceding text such as a comment marker (`//#region`)
//! - an identifier, up to the next whitespace
//! - a description, everything after the identifier up to the end of the line
//!
//! A backslash inside any of the three parts copies the following character verbatim, so
//! `na\ me` is a single identifier `na me`.

use crate::config::RegionKeywords;
use crate::symbols::{Position, TextRange};

/// The role of an annotation, decided by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Opens a region.
    Open,
    /// Closes a region.
    Close,
    /// A standalone tag.
    Tag,
}

/// One token of an annotation with its source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionToken {
    /// Token text after escape processing.
    pub text: String,
    /// Source range; the end column is exclusive.
    pub range: TextRange,
}

/// A parsed annotation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    /// What the leading keyword marks.
    pub marker: MarkerKind,
    /// The leading keyword token.
    pub leading: RegionToken,
    /// The identifier token. Always present for [`MarkerKind::Open`] and [`MarkerKind::Tag`].
    pub identifier: Option<RegionToken>,
    /// The description token, if any text follows the identifier.
    pub description: Option<RegionToken>,
    /// Span from the start of the keyword to the end of the last token.
    pub range: TextRange,
}

impl RegionEntry {
    /// Identifier text, if present.
    pub fn name(&self) -> Option<&str> {
        self.identifier.as_ref().map(|token| token.text.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    Leading,
    Identifier,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Leading,
    AfterLeading,
    Identifier,
    AfterIdentifier,
    Description,
    Escape(Resume),
    Done,
}

fn is_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0c' | '\x0b')
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r')
}

/// Character-at-a-time state machine recognizing one annotation per line.
///
/// Feed a line (or several chunks of it) with [`RegionParser::parse`], then call
/// [`RegionParser::emit`] to finish the line and take the result. Lines that do not form a
/// complete annotation produce `None`.
#[derive(Debug, Clone)]
pub struct RegionParser {
    keywords: Vec<(String, MarkerKind)>,
    state: State,
    buffer: String,
    // Column of each char in `buffer`.
    columns: Vec<usize>,
    column: usize,
    line: usize,
    token_start: Option<usize>,
    marker: Option<MarkerKind>,
    leading: Option<RegionToken>,
    identifier: Option<RegionToken>,
    description: Option<RegionToken>,
    invalid: bool,
}

impl RegionParser {
    /// Create a parser recognizing the given keywords.
    pub fn new(keywords: &RegionKeywords) -> Self {
        let mut parser = Self {
            keywords: Vec::new(),
            state: State::Leading,
            buffer: String::new(),
            columns: Vec::new(),
            column: 0,
            line: 0,
            token_start: None,
            marker: None,
            leading: None,
            identifier: None,
            description: None,
            invalid: false,
        };
        parser.set_keywords(keywords);
        parser
    }

    /// Replace the recognized keywords and reset the parser. Empty keywords are ignored.
    pub fn set_keywords(&mut self, keywords: &RegionKeywords) {
        self.keywords = [
            (&keywords.start, MarkerKind::Open),
            (&keywords.end, MarkerKind::Close),
            (&keywords.tag, MarkerKind::Tag),
        ]
        .into_iter()
        .filter(|(keyword, _)| !keyword.is_empty())
        .map(|(keyword, marker)| (keyword.clone(), marker))
        .collect();
        self.reset();
    }

    /// Feed characters of line `line`. Token ranges are reported on that line.
    pub fn parse(&mut self, input: &str, line: usize) {
        self.line = line;
        for ch in input.chars() {
            let column = self.column;
            self.column += 1;
            if self.state == State::Done {
                continue;
            }
            self.state = self.step(self.state, ch, column);
        }
    }

    /// Finish the current line and return its annotation, if it formed a valid one.
    pub fn emit(&mut self) -> Option<RegionEntry> {
        let line = self.line;
        self.parse("\n", line);

        let marker = self.marker.take();
        let leading = self.leading.take();
        let identifier = self.identifier.take();
        let description = self.description.take();
        let invalid = self.invalid;
        self.reset();

        let (marker, leading) = (marker?, leading?);
        if invalid {
            return None;
        }
        let end = description
            .as_ref()
            .or(identifier.as_ref())
            .map_or(leading.range.end, |token| token.range.end);
        let range = TextRange::new(leading.range.start, end);
        Some(RegionEntry {
            marker,
            leading,
            identifier,
            description,
            range,
        })
    }

    /// Discard any partial input.
    pub fn reset(&mut self) {
        self.state = State::Leading;
        self.buffer.clear();
        self.columns.clear();
        self.column = 0;
        self.token_start = None;
        self.marker = None;
        self.leading = None;
        self.identifier = None;
        self.description = None;
        self.invalid = false;
    }

    fn step(&mut self, state: State, ch: char, column: usize) -> State {
        match state {
            State::Leading => self.leading_char(ch, column),
            State::AfterLeading => self.after_leading(ch, column),
            State::Identifier => self.identifier_char(ch, column),
            State::AfterIdentifier => self.after_identifier(ch, column),
            State::Description => self.description_char(ch, column),
            State::Escape(resume) => {
                if is_newline(ch) {
                    // A trailing backslash escapes nothing.
                    let resume_state = match resume {
                        Resume::Leading => State::Leading,
                        Resume::Identifier => State::Identifier,
                        Resume::Description => State::Description,
                    };
                    return self.step(resume_state, ch, column);
                }
                self.push(ch, column);
                match resume {
                    Resume::Leading => State::Leading,
                    Resume::Identifier => State::Identifier,
                    Resume::Description => State::Description,
                }
            }
            State::Done => State::Done,
        }
    }

    fn leading_char(&mut self, ch: char, column: usize) -> State {
        if ch == '\\' {
            return State::Escape(Resume::Leading);
        }
        if !is_space(ch) {
            self.push(ch, column);
            return State::Leading;
        }

        let matched = self
            .keywords
            .iter()
            .filter(|(keyword, _)| self.buffer.ends_with(keyword.as_str()))
            .max_by_key(|(keyword, _)| keyword.chars().count())
            .map(|(keyword, marker)| (keyword.clone(), *marker));

        let Some((keyword, marker)) = matched else {
            self.clear_buffer();
            return State::Leading;
        };

        let length = keyword.chars().count();
        let start = self.columns[self.columns.len() - length];
        self.marker = Some(marker);
        self.leading = Some(self.token(keyword, start, column));
        self.clear_buffer();
        self.after_leading(ch, column)
    }

    fn after_leading(&mut self, ch: char, column: usize) -> State {
        if is_newline(ch) {
            // Only a closer may omit its identifier.
            if self.marker != Some(MarkerKind::Close) {
                self.invalid = true;
            }
            return State::Done;
        }
        if is_space(ch) {
            return State::AfterLeading;
        }
        self.identifier_char(ch, column)
    }

    fn identifier_char(&mut self, ch: char, column: usize) -> State {
        if ch == '\\' {
            self.token_start.get_or_insert(column);
            return State::Escape(Resume::Identifier);
        }
        if is_space(ch) {
            let text = std::mem::take(&mut self.buffer);
            let start = self.token_start.unwrap_or(column);
            self.identifier = Some(self.token(text, start, column));
            self.clear_buffer();
            return self.after_identifier(ch, column);
        }
        self.token_start.get_or_insert(column);
        self.push(ch, column);
        State::Identifier
    }

    fn after_identifier(&mut self, ch: char, column: usize) -> State {
        if is_newline(ch) {
            return State::Done;
        }
        if is_space(ch) {
            return State::AfterIdentifier;
        }
        self.description_char(ch, column)
    }

    fn description_char(&mut self, ch: char, column: usize) -> State {
        if is_newline(ch) {
            if !self.buffer.is_empty() {
                let text = std::mem::take(&mut self.buffer);
                let start = self.token_start.unwrap_or(column);
                self.description = Some(self.token(text, start, column));
            }
            self.clear_buffer();
            return State::Done;
        }
        self.token_start.get_or_insert(column);
        if ch == '\\' {
            return State::Escape(Resume::Description);
        }
        self.push(ch, column);
        State::Description
    }

    fn push(&mut self, ch: char, column: usize) {
        self.buffer.push(ch);
        self.columns.push(column);
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.columns.clear();
        self.token_start = None;
    }

    fn token(&self, text: String, start: usize, end: usize) -> RegionToken {
        RegionToken {
            text,
            range: TextRange::new(
                Position::new(self.line, start),
                Position::new(self.line, end),
            ),
        }
    }
}
