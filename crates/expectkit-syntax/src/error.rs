use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// A directive that matched an anchor but could not be understood.
///
/// The line is skipped; scanning continues with the next one.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("{file}:{line}: malformed annotation: {reason}")]
#[diagnostic(
    code(expectkit_syntax::malformed_annotation),
    help("Directives look like `// Noncompliant@+1 [[sc=5;ec=9]] {{{{message}}}}`")
)]
pub struct MalformedAnnotation {
    pub file: String,
    pub line: usize,
    pub reason: String,
    #[label("this directive")]
    pub span: SourceSpan,
}

/// Problems found while turning directives into expected issues and quickfixes.
///
/// Every defect is reported; none of them stops the build.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum BuildError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Malformed(#[from] MalformedAnnotation),

    #[error("quickfix `{id}` referenced on line {line} is never declared")]
    #[diagnostic(
        code(expectkit_syntax::unresolved_quickfix),
        help("Declare it with `// fix@{id} {{{{description}}}}` and at least one `// edit@{id}`")
    )]
    UnresolvedQuickfixReference { id: String, line: usize },

    #[error("quickfix `{id}` has no description")]
    #[diagnostic(
        code(expectkit_syntax::missing_description),
        help("Add `// fix@{id} {{{{description}}}}`")
    )]
    MissingDescription { id: String, line: usize },

    #[error("quickfix `{id}` has no edits")]
    #[diagnostic(
        code(expectkit_syntax::missing_edits),
        help("Add at least one `// edit@{id} [[sc=..;ec=..]] {{{{replacement}}}}`")
    )]
    MissingEdits { id: String, line: usize },

    #[error("quickfix `{id}` is declared but no issue references it")]
    #[diagnostic(code(expectkit_syntax::orphan_quickfix))]
    OrphanQuickfix { id: String, line: usize },

    #[error("`!` cannot be used as a quickfix id")]
    #[diagnostic(
        code(expectkit_syntax::reserved_quickfix_id),
        help("`quickfixes=!` means no quickfix is expected; pick another id")
    )]
    ReservedQuickfixId { line: usize },

    #[error("edit of quickfix `{id}` does not set the {which} column")]
    #[diagnostic(code(expectkit_syntax::missing_edit_column))]
    MissingEditColumn { id: String, line: usize, which: &'static str },

    #[error("edit of quickfix `{id}` neither removes nor inserts any text")]
    #[diagnostic(code(expectkit_syntax::empty_edit))]
    EmptyEdit { id: String, line: usize },

    #[error("line reference `{reference}` on line {line} resolves before the first line of the file")]
    #[diagnostic(code(expectkit_syntax::line_out_of_range))]
    LineOutOfRange { line: usize, reference: String },

    #[error("invalid span on line {line}: {reason}")]
    #[diagnostic(code(expectkit_syntax::invalid_span))]
    InvalidSpan { line: usize, reason: String },

    #[error("quickfix `{id}` is described more than once")]
    #[diagnostic(code(expectkit_syntax::duplicate_description))]
    DuplicateDescription { id: String, line: usize },

    #[error("flow `{id}` referenced on line {line} is never declared")]
    #[diagnostic(
        code(expectkit_syntax::unresolved_flow),
        help("Declare its steps with `// flow@{id} {{{{message}}}}` on the lines it goes through")
    )]
    UnresolvedFlowReference { id: String, line: usize },

    #[error("flow `{id}` is declared but no issue references it")]
    #[diagnostic(
        code(expectkit_syntax::orphan_flow),
        help("List it in the `flows=` attribute of the issue that reports it")
    )]
    OrphanFlow { id: String, line: usize },

    #[error("flow `{id}` {reason}")]
    #[diagnostic(
        code(expectkit_syntax::invalid_flow_order),
        help("Give every step of a flow a distinct `order=N`, or none at all")
    )]
    InvalidFlowOrder { id: String, line: usize, reason: String },

    #[error("quickfix annotations found on line {line} but quickfix verification is disabled")]
    #[diagnostic(
        code(expectkit_syntax::quickfixes_not_enabled),
        help("Set `with_quickfixes = true` in expectkit.toml")
    )]
    QuickfixesNotEnabled { line: usize },
}

impl BuildError {
    /// Line the defect is reported on.
    pub fn line(&self) -> usize {
        match self {
            BuildError::Malformed(m) => m.line,
            BuildError::UnresolvedQuickfixReference { line, .. }
            | BuildError::MissingDescription { line, .. }
            | BuildError::MissingEdits { line, .. }
            | BuildError::OrphanQuickfix { line, .. }
            | BuildError::ReservedQuickfixId { line }
            | BuildError::MissingEditColumn { line, .. }
            | BuildError::EmptyEdit { line, .. }
            | BuildError::LineOutOfRange { line, .. }
            | BuildError::InvalidSpan { line, .. }
            | BuildError::DuplicateDescription { line, .. }
            | BuildError::UnresolvedFlowReference { line, .. }
            | BuildError::OrphanFlow { line, .. }
            | BuildError::InvalidFlowOrder { line, .. }
            | BuildError::QuickfixesNotEnabled { line } => *line,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, BuildError::Malformed(_))
    }

    pub fn is_flow_defect(&self) -> bool {
        matches!(
            self,
            BuildError::UnresolvedFlowReference { .. }
                | BuildError::OrphanFlow { .. }
                | BuildError::InvalidFlowOrder { .. }
        )
    }
}
