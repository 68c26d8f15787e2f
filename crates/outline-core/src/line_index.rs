//! Line-indexed document text.
//!
//! The region scanner reads documents line by line. [`DocumentText`] abstracts over the text
//! source so hosts can hand in either a plain string or a rope-backed [`LineIndex`].

use ropey::Rope;

/// A document that can be queried one logical line at a time.
pub trait DocumentText {
    /// Number of logical lines.
    fn line_count(&self) -> usize;

    /// Text of a line without its trailing line terminator, or `None` if out of range.
    fn line(&self, line_number: usize) -> Option<String>;

    /// Visit every line in order, without its terminator.
    ///
    /// Implementors with a cheaper sequential walk than repeated [`DocumentText::line`]
    /// calls should override this.
    fn for_each_line(&self, visit: &mut dyn FnMut(usize, &str)) {
        for line_number in 0..self.line_count() {
            if let Some(line) = self.line(line_number) {
                visit(line_number, &line);
            }
        }
    }
}

/// Logical line index backed by a rope.
///
/// Rope provides O(log N) line access, so repeated scans over large documents stay cheap.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Create an empty line index.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Build a line index from text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Replace the character range `start..end` with `text`.
    ///
    /// Offsets are clamped to the document length.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) {
        let len = self.rope.len_chars();
        let start = start.min(len);
        let end = end.clamp(start, len);
        if start < end {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Get the full document text.
    pub fn get_text(&self) -> String {
        self.rope.to_string()
    }
}

impl DocumentText for LineIndex {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line(&self, line_number: usize) -> Option<String> {
        if line_number >= self.rope.len_lines() {
            return None;
        }

        let mut text = self.rope.line(line_number).to_string();
        // Rope's line() includes the terminator
        if text.ends_with('\n') {
            text.pop();
        }
        if text.ends_with('\r') {
            text.pop();
        }
        Some(text)
    }

    fn for_each_line(&self, visit: &mut dyn FnMut(usize, &str)) {
        for (line_number, slice) in self.rope.lines().enumerate() {
            let owned = slice.to_string();
            let line = owned.strip_suffix('\n').unwrap_or(&owned);
            visit(line_number, line.strip_suffix('\r').unwrap_or(line));
        }
    }
}

impl DocumentText for str {
    fn line_count(&self) -> usize {
        // Matches ropey: a trailing newline starts one more (empty) line.
        self.split('\n').count()
    }

    fn line(&self, line_number: usize) -> Option<String> {
        self.split('\n')
            .nth(line_number)
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
    }

    fn for_each_line(&self, visit: &mut dyn FnMut(usize, &str)) {
        for (line_number, line) in self.split('\n').enumerate() {
            visit(line_number, line.strip_suffix('\r').unwrap_or(line));
        }
    }
}

impl DocumentText for &str {
    fn line_count(&self) -> usize {
        (**self).line_count()
    }

    fn line(&self, line_number: usize) -> Option<String> {
        (**self).line(line_number)
    }

    fn for_each_line(&self, visit: &mut dyn FnMut(usize, &str)) {
        (**self).for_each_line(visit)
    }
}

impl DocumentText for String {
    fn line_count(&self) -> usize {
        self.as_str().line_count()
    }

    fn line(&self, line_number: usize) -> Option<String> {
        self.as_str().line(line_number)
    }

    fn for_each_line(&self, visit: &mut dyn FnMut(usize, &str)) {
        self.as_str().for_each_line(visit)
    }
}
