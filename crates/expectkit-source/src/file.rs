use std::{fs, path::Path};

use miette::SourceSpan;

use crate::{SourceError, TextRange};

/// The immutable text of one fixture file together with its line index.
///
/// The file is read once; every position lookup afterwards is pure offset
/// arithmetic over the line index.
///
/// # Example
///
/// ```rust
/// use expectkit_source::SourceText;
///
/// let text = SourceText::new("Sample.java", "int a;\nint b;\n");
/// assert_eq!(text.line_count(), 2);
/// assert_eq!(text.line_text(2), Some("int b;"));
/// assert_eq!(text.offset_of(2, 5).unwrap(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// Path of the file, as reported in verdicts
    path: String,

    /// Raw contents
    contents: String,

    /// Byte offset of the first character of each line
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        let contents = contents.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            contents
                .match_indices('\n')
                .map(|(idx, _)| idx + 1)
                .filter(|&start| start < contents.len()),
        );
        Self { path: path.into(), contents, line_starts }
    }

    /// Read a file from disk.
    pub fn read(path: &Path) -> Result<Self, SourceError> {
        let contents = fs::read_to_string(path).map_err(|source| SourceError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Read {} ({} bytes)", path.display(), contents.len());
        Ok(Self::new(path.to_string_lossy().into_owned(), contents))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn contains_line(&self, line: usize) -> bool {
        line >= 1 && line <= self.line_count()
    }

    /// Byte range of a line, excluding its terminator.
    fn line_bounds(&self, line: usize) -> Option<(usize, usize)> {
        if !self.contains_line(line) {
            return None;
        }
        let start = self.line_starts[line - 1];
        let mut end = self
            .line_starts
            .get(line)
            .copied()
            .unwrap_or(self.contents.len());
        let bytes = self.contents.as_bytes();
        if end > start && bytes[end - 1] == b'\n' {
            end -= 1;
        }
        if end > start && bytes[end - 1] == b'\r' {
            end -= 1;
        }
        Some((start, end))
    }

    /// Text of a 1-based line without its line terminator.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.line_bounds(line).map(|(start, end)| &self.contents[start..end])
    }

    /// Iterate over `(line number, line text, byte offset of the line)`.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str, usize)> + '_ {
        (1..=self.line_count()).filter_map(move |line| {
            self.line_bounds(line)
                .map(|(start, end)| (line, &self.contents[start..end], start))
        })
    }

    /// Byte offset of a 1-based `(line, column)`.
    ///
    /// The column one past the last character of the line addresses the end of
    /// the line (before its terminator). When the text ends with a newline,
    /// `(line_count + 1, 1)` addresses the very end of the text.
    pub fn offset_of(&self, line: usize, column: usize) -> Result<usize, SourceError> {
        if line == self.line_count() + 1 && self.contents.ends_with('\n') {
            return if column == 1 {
                Ok(self.contents.len())
            } else {
                Err(SourceError::ColumnOutOfBounds { line, column, line_length: 0 })
            };
        }
        let (start, end) = self.line_bounds(line).ok_or(SourceError::LineOutOfBounds {
            line,
            line_count: self.line_count(),
        })?;
        let text = &self.contents[start..end];
        let line_length = text.chars().count();
        if column == 0 || column > line_length + 1 {
            return Err(SourceError::ColumnOutOfBounds { line, column, line_length });
        }
        let within = text
            .char_indices()
            .nth(column - 1)
            .map_or(text.len(), |(idx, _)| idx);
        Ok(start + within)
    }

    /// Byte offsets `(start, end)` of a range.
    pub fn range_offsets(&self, range: &TextRange) -> Result<(usize, usize), SourceError> {
        let start = self.offset_of(range.start_line, range.start_column)?;
        let end = self.offset_of(range.end_line, range.end_column)?;
        Ok((start, end))
    }

    /// Span covering a whole line, for diagnostic labels.
    pub fn line_span(&self, line: usize) -> Option<SourceSpan> {
        self.line_bounds(line)
            .map(|(start, end)| SourceSpan::from((start, end - start)))
    }

    /// Span of a `(line, column)` position, falling back to the whole line.
    pub fn position_span(&self, line: usize, column: Option<usize>) -> Option<SourceSpan> {
        match column.map(|column| self.offset_of(line, column)) {
            Some(Ok(offset)) => Some(SourceSpan::from((offset, 0))),
            _ => self.line_span(line),
        }
    }
}

/// 1-based `(line, column)` of a byte offset into arbitrary text.
pub fn position_in(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (idx, c) in text.char_indices() {
        if idx >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_lines_without_trailing_empty_line() {
        assert_eq!(SourceText::new("a", "x\ny\n").line_count(), 2);
        assert_eq!(SourceText::new("a", "x\ny").line_count(), 2);
        assert_eq!(SourceText::new("a", "").line_count(), 1);
    }

    #[test]
    fn strips_crlf_terminators() {
        let text = SourceText::new("a", "first\r\nsecond\r\n");
        assert_eq!(text.line_text(1), Some("first"));
        assert_eq!(text.line_text(2), Some("second"));
        assert_eq!(text.offset_of(2, 7).unwrap(), 13);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = SourceText::new("a", "héllo\nwörld\n");
        assert_eq!(text.offset_of(1, 3).unwrap(), 3);
        assert_eq!(text.offset_of(2, 3).unwrap(), 7 + 3);
        assert_eq!(text.offset_of(2, 6).unwrap(), text.contents().len() - 1);
    }

    #[test]
    fn rejects_positions_outside_the_text() {
        let text = SourceText::new("a", "abc\n");
        assert!(matches!(text.offset_of(3, 1), Err(SourceError::LineOutOfBounds { line: 3, .. })));
        assert!(matches!(text.offset_of(2, 2), Err(SourceError::ColumnOutOfBounds { line: 2, column: 2, .. })));
        assert!(matches!(text.offset_of(1, 5), Err(SourceError::ColumnOutOfBounds { column: 5, .. })));
        assert!(matches!(text.offset_of(1, 0), Err(SourceError::ColumnOutOfBounds { column: 0, .. })));
        assert_eq!(text.offset_of(1, 4).unwrap(), 3);
    }

    #[test]
    fn addresses_the_end_after_a_trailing_newline() {
        let text = SourceText::new("a", "abc\n");
        assert_eq!(text.offset_of(2, 1).unwrap(), 4);
        let unterminated = SourceText::new("a", "abc");
        assert!(matches!(unterminated.offset_of(2, 1), Err(SourceError::LineOutOfBounds { line: 2, .. })));
    }

    #[test]
    fn maps_offsets_back_to_positions() {
        assert_eq!(position_in("ab\ncd", 0), (1, 1));
        assert_eq!(position_in("ab\ncd", 4), (2, 2));
        assert_eq!(position_in("ab\ncd", 99), (2, 3));
    }
}
