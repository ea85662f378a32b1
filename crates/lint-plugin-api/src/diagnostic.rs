//! Positioned diagnostics.
//!
//! Positions carry the 1-based line and 0-based character column reported
//! by `proc-macro2` span locations, plus the byte offset into the source
//! text. Offsets are what diagnostics are ordered by.

use proc_macro2::Span;
use serde::{Deserialize, Serialize};

/// A point in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset from the start of the file.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 0-based column, counted in characters.
    pub column: usize,
}

/// A reported rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the analyzer that produced it.
    pub analyzer: String,
    pub start: Position,
    pub end: Position,
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic covering `span`, resolving positions through `lines`.
    pub fn at_span(
        analyzer: impl Into<String>,
        span: Span,
        lines: &LineIndex,
        message: impl Into<String>,
    ) -> Self {
        let start = span.start();
        let end = span.end();
        Diagnostic {
            analyzer: analyzer.into(),
            start: lines.position(start.line, start.column),
            end: lines.position(end.line, end.column),
            message: message.into(),
        }
    }

    /// Ordering key: ascending start, then end.
    pub fn sort_key(&self) -> (usize, usize) {
        (self.start.offset, self.end.offset)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {} ({})",
            self.start.line,
            self.start.column + 1,
            self.message,
            self.analyzer
        )
    }
}

/// Maps (line, column) pairs back to byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    lines: Vec<String>,
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut lines = Vec::new();
        let mut starts = Vec::new();
        let mut offset = 0;
        for line in source.split('\n') {
            starts.push(offset);
            offset += line.len() + 1;
            lines.push(line.to_string());
        }
        LineIndex { lines, starts }
    }

    /// Resolve a 1-based line and character column. Out-of-range input is
    /// clamped to the nearest valid position.
    pub fn position(&self, line: usize, column: usize) -> Position {
        let idx = line.saturating_sub(1).min(self.lines.len().saturating_sub(1));
        let text = self.lines.get(idx).map(String::as_str).unwrap_or("");
        let within: usize = text.chars().take(column).map(char::len_utf8).sum();
        Position {
            offset: self.starts.get(idx).copied().unwrap_or(0) + within,
            line: idx + 1,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_ascii() {
        let index = LineIndex::new("fn a() {}\nfn b(X: u8) {}\n");
        let pos = index.position(2, 5);
        assert_eq!(pos.offset, 15);
        assert_eq!(pos.line, 2);
    }

    #[test]
    fn test_line_index_counts_chars_not_bytes() {
        // "é" is two bytes but one column
        let index = LineIndex::new("fn é(Ab: u8) {}");
        let pos = index.position(1, 5);
        assert_eq!(pos.offset, 6);
        assert_eq!(&"fn é(Ab: u8) {}"[pos.offset..pos.offset + 2], "Ab");
    }

    #[test]
    fn test_line_index_clamps() {
        let index = LineIndex::new("x");
        let pos = index.position(9, 0);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic {
            analyzer: "paramcase".to_string(),
            start: Position {
                offset: 5,
                line: 1,
                column: 5,
            },
            end: Position {
                offset: 8,
                line: 1,
                column: 8,
            },
            message: "Bad should start with lowercase".to_string(),
        };
        assert_eq!(
            diag.to_string(),
            "1:6: Bad should start with lowercase (paramcase)"
        );
    }
}
