use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SourceError;

/// A line and an optional 1-based column.
///
/// A position without a column is "line-only": it matches anything reported on
/// that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 1-based character column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Position {
    pub fn new(line: usize, column: Option<usize>) -> Self {
        Self { line, column }
    }

    /// A position constrained to a line only.
    pub fn line_only(line: usize) -> Self {
        Self { line, column: None }
    }

    /// A position with both line and column.
    pub fn at(line: usize, column: usize) -> Self {
        Self { line, column: Some(column) }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}", self.line, column),
            None => write!(f, "{}", self.line),
        }
    }
}

/// A primary span: a start position and an optional end position.
///
/// The end, when present, is never before the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub start: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Position>,
}

impl Location {
    /// Create a location, rejecting an end that precedes the start.
    pub fn new(start: Position, end: Option<Position>) -> Result<Self, SourceError> {
        if let Some(end) = end {
            let inverted = end.line < start.line
                || (end.line == start.line
                    && matches!((start.column, end.column), (Some(sc), Some(ec)) if ec < sc));
            if inverted {
                return Err(SourceError::InvertedSpan {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// A line-only location.
    pub fn line(line: usize) -> Self {
        Self { start: Position::line_only(line), end: None }
    }

    pub fn start_line(&self) -> usize {
        self.start.line
    }

    /// The last line the location covers.
    pub fn end_line(&self) -> usize {
        self.end.map_or(self.start.line, |end| end.line)
    }

    pub fn start_column(&self) -> Option<usize> {
        self.start.column
    }

    pub fn end_column(&self) -> Option<usize> {
        self.end.and_then(|end| end.column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

/// A fully specified span in original-text coordinates.
///
/// Lines and columns are 1-based; the end column is exclusive, so a range whose
/// start equals its end is an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextRange {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl TextRange {
    pub fn new(
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Result<Self, SourceError> {
        let range = Self { start_line, start_column, end_line, end_column };
        if (end_line, end_column) < (start_line, start_column) {
            return Err(SourceError::InvertedSpan {
                start: format!("{}:{}", start_line, start_column),
                end: format!("{}:{}", end_line, end_column),
            });
        }
        Ok(range)
    }

    /// A range that starts and ends on the same line.
    pub fn on_line(line: usize, start_column: usize, end_column: usize) -> Result<Self, SourceError> {
        Self::new(line, start_column, line, end_column)
    }

    pub fn is_empty(&self) -> bool {
        self.start_line == self.end_line && self.start_column == self.end_column
    }

    pub fn start(&self) -> Position {
        Position::at(self.start_line, self.start_column)
    }

    pub fn end(&self) -> Position {
        Position::at(self.end_line, self.end_column)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}
