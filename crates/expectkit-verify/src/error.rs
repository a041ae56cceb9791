use expectkit_source::TextRange;
use miette::Diagnostic;
use thiserror::Error;

/// Analyzer output that cannot be placed in the file it claims to describe.
///
/// Fatal for the file: it is not reconciled.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("issue #{index} is reported on line {line}, but the file has {line_count} lines")]
    #[diagnostic(
        code(expectkit_verify::line_out_of_bounds),
        help("Check that the analyzer report belongs to this version of the file")
    )]
    LineOutOfBounds { index: usize, line: usize, line_count: usize },

    #[error("issue #{index} is reported at column {column} of line {line}, which has {line_length} characters")]
    #[diagnostic(code(expectkit_verify::column_out_of_bounds))]
    ColumnOutOfBounds { index: usize, line: usize, column: usize, line_length: usize },

    #[error("issue #{index} has an invalid span: {reason}")]
    #[diagnostic(code(expectkit_verify::invalid_span))]
    InvalidSpan { index: usize, reason: String },

    #[error("issue #{index} reports a secondary location or flow step without a line")]
    #[diagnostic(code(expectkit_verify::missing_line))]
    MissingLine { index: usize },

    #[error("issue #{index} is raised on the file but {reason}")]
    #[diagnostic(
        code(expectkit_verify::invalid_file_issue),
        help("An issue without a line only carries a message")
    )]
    InvalidFileIssue { index: usize, reason: String },

    #[error("issue #{index} offers a quickfix with an invalid edit: {reason}")]
    #[diagnostic(code(expectkit_verify::invalid_edit))]
    InvalidEdit { index: usize, reason: String },
}

/// Problems applying the edits of one quickfix.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum QuickfixError {
    #[error("edits {first} and {second} of quickfix `{id}` overlap")]
    #[diagnostic(
        code(expectkit_verify::conflicting_edits),
        help("Edits of one quickfix are applied to the original text: they must not overlap, and only one of them may insert at a given point")
    )]
    ConflictingEdits { id: String, first: TextRange, second: TextRange },

    #[error("edit {range} of quickfix `{id}` is outside the file: {reason}")]
    #[diagnostic(code(expectkit_verify::edit_out_of_bounds))]
    EditOutOfBounds { id: String, range: TextRange, reason: String },

    #[error(
        "quickfix `{id}` produces unexpected text at {line}:{column}: expected `{expected}`, got `{actual}`"
    )]
    #[diagnostic(code(expectkit_verify::quickfix_text_mismatch))]
    TextMismatch { id: String, line: usize, column: usize, expected: String, actual: String },
}
