use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TextRange;

/// A single text replacement expressed in original-text coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditOperation {
    /// Span of the original text to remove
    pub range: TextRange,
    /// Text inserted in place of the span
    pub replacement: String,
}

impl EditOperation {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self { range, replacement: replacement.into() }
    }

    /// Insert text at a position without removing anything.
    pub fn insert(line: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            range: TextRange { start_line: line, start_column: column, end_line: line, end_column: column },
            replacement: text.into(),
        }
    }

    /// An edit that neither removes nor inserts anything.
    pub fn is_noop(&self) -> bool {
        self.range.is_empty() && self.replacement.is_empty()
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {{{{{}}}}}", self.range, self.replacement.escape_default())
    }
}
