use std::fmt;

use expectkit_source::{ExpectError, Report, SourceText};
use miette::{Diagnostic, LabeledSpan, Severity, SourceSpan};
use serde::Serialize;
use thiserror::Error;

/// What went wrong. Declaration order is the tie-break order within a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    MalformedAnnotation,
    UnresolvedQuickfixReference,
    InvalidQuickfix,
    InvalidFlow,
    Normalization,
    UnexpectedAnnotation,
    MissingIssue,
    UnexpectedIssue,
    LocationMismatch,
    MessageMismatch,
    SecondaryMismatch,
    FlowMismatch,
    EffortMismatch,
    UnexpectedQuickfix,
    QuickfixMismatch,
    ConflictingEdit,
    EditOutOfBounds,
    QuickfixTextMismatch,
    NoIssueRaised,
}

impl DiscrepancyKind {
    pub fn code(self) -> &'static str {
        match self {
            DiscrepancyKind::MalformedAnnotation => "malformed_annotation",
            DiscrepancyKind::UnresolvedQuickfixReference => "unresolved_quickfix_reference",
            DiscrepancyKind::InvalidQuickfix => "invalid_quickfix",
            DiscrepancyKind::InvalidFlow => "invalid_flow",
            DiscrepancyKind::Normalization => "normalization",
            DiscrepancyKind::UnexpectedAnnotation => "unexpected_annotation",
            DiscrepancyKind::MissingIssue => "missing_issue",
            DiscrepancyKind::UnexpectedIssue => "unexpected_issue",
            DiscrepancyKind::LocationMismatch => "location_mismatch",
            DiscrepancyKind::MessageMismatch => "message_mismatch",
            DiscrepancyKind::SecondaryMismatch => "secondary_mismatch",
            DiscrepancyKind::FlowMismatch => "flow_mismatch",
            DiscrepancyKind::EffortMismatch => "effort_mismatch",
            DiscrepancyKind::UnexpectedQuickfix => "unexpected_quickfix",
            DiscrepancyKind::QuickfixMismatch => "quickfix_mismatch",
            DiscrepancyKind::ConflictingEdit => "conflicting_edit",
            DiscrepancyKind::EditOutOfBounds => "edit_out_of_bounds",
            DiscrepancyKind::QuickfixTextMismatch => "quickfix_text_mismatch",
            DiscrepancyKind::NoIssueRaised => "no_issue_raised",
        }
    }
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One difference between what a file expects and what the analyzer raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    /// `None` for file-level discrepancies
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub detail: String,
}

impl Discrepancy {
    pub fn new(kind: DiscrepancyKind, line: Option<usize>, column: Option<usize>, detail: impl Into<String>) -> Self {
        Self { kind, line, column, detail: detail.into() }
    }

    /// A miette diagnostic labelled on the offending line of `source`.
    pub fn diagnostic(&self, source: &SourceText) -> Report {
        let span = self.line.and_then(|line| source.position_span(line, self.column));
        DiscrepancyDiagnostic {
            kind: self.kind,
            path: source.path().to_string(),
            detail: self.detail.clone(),
            span,
        }
        .report(source)
    }
}

#[derive(Debug, Error)]
#[error("{path}: {detail}")]
struct DiscrepancyDiagnostic {
    kind: DiscrepancyKind,
    path: String,
    detail: String,
    span: Option<SourceSpan>,
}

impl Diagnostic for DiscrepancyDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("expectkit::{}", self.kind.code())))
    }

    fn severity(&self) -> Option<Severity> {
        Some(Severity::Error)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.kind.code().replace('_', " ")),
            span,
        ))))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnreferencedQuickfix,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::UnreferencedQuickfix => f.write_str("unreferenced_quickfix"),
        }
    }
}

/// A finding that does not fail the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub line: usize,
    pub detail: String,
}

/// The outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileVerdict {
    pub path: String,
    pub expected: usize,
    pub actual: usize,
    pub discrepancies: Vec<Discrepancy>,
    pub warnings: Vec<Warning>,
}

impl FileVerdict {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: 0,
            actual: 0,
            discrepancies: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Order discrepancies by position, then kind; emission order breaks the
    /// remaining ties because the sort is stable.
    pub fn sort(&mut self) {
        self.discrepancies.sort_by_key(|d| (d.line, d.column, d.kind));
        self.warnings.sort_by_key(|w| w.line);
    }
}

impl fmt::Display for FileVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.discrepancies {
            match (d.line, d.column) {
                (Some(line), Some(column)) => write!(f, "{}:{}:{}: ", self.path, line, column)?,
                (Some(line), None) => write!(f, "{}:{}: ", self.path, line)?,
                (None, _) => write!(f, "{}: ", self.path)?,
            }
            writeln!(f, "[{}] {}", d.kind, d.detail)?;
        }
        for w in &self.warnings {
            writeln!(f, "warning: {}:{}: [{}] {}", self.path, w.line, w.kind, w.detail)?;
        }
        Ok(())
    }
}

/// The outcome of a run over several files, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub files: Vec<FileVerdict>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.files.iter().all(FileVerdict::passed)
    }

    pub fn discrepancy_count(&self) -> usize {
        self.files.iter().map(|file| file.discrepancies.len()).sum()
    }

    pub fn failed_files(&self) -> usize {
        self.files.iter().filter(|file| !file.passed()).count()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            write!(f, "{}", file)?;
        }
        if self.passed() {
            writeln!(f, "ok: {} file(s) verified", self.files.len())
        } else {
            writeln!(
                f,
                "FAILED: {} discrepancy(ies) in {} of {} file(s)",
                self.discrepancy_count(),
                self.failed_files(),
                self.files.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_position_then_kind_then_emission() {
        let mut verdict = FileVerdict::new("A.java");
        verdict.discrepancies = vec![
            Discrepancy::new(DiscrepancyKind::MessageMismatch, Some(4), Some(2), "second"),
            Discrepancy::new(DiscrepancyKind::MissingIssue, Some(4), None, "b"),
            Discrepancy::new(DiscrepancyKind::MessageMismatch, Some(4), Some(2), "third"),
            Discrepancy::new(DiscrepancyKind::LocationMismatch, Some(4), Some(2), "first"),
            Discrepancy::new(DiscrepancyKind::NoIssueRaised, None, None, "a"),
        ];
        verdict.sort();
        let details: Vec<&str> = verdict.discrepancies.iter().map(|d| d.detail.as_str()).collect();
        assert_eq!(details, vec!["a", "b", "first", "second", "third"]);
    }

    #[test]
    fn renders_plain_report() {
        let mut failing = FileVerdict::new("A.java");
        failing.discrepancies.push(Discrepancy::new(DiscrepancyKind::MissingIssue, Some(3), Some(5), "expected issue"));
        failing.warnings.push(Warning {
            kind: WarningKind::UnreferencedQuickfix,
            line: 7,
            detail: "offered quickfix \"Remove\" is not referenced".to_string(),
        });
        let verdict = Verdict { files: vec![failing, FileVerdict::new("B.java")] };
        assert!(!verdict.passed());
        assert_eq!(
            verdict.to_string(),
            "A.java:3:5: [missing_issue] expected issue\n\
             warning: A.java:7: [unreferenced_quickfix] offered quickfix \"Remove\" is not referenced\n\
             FAILED: 1 discrepancy(ies) in 1 of 2 file(s)\n"
        );
    }

    #[test]
    fn diagnostics_point_at_the_line() {
        let source = SourceText::new("A.java", "int a;\nint b;\n");
        let report = Discrepancy::new(DiscrepancyKind::UnexpectedIssue, Some(2), None, "unexpected").diagnostic(&source);
        assert_eq!(report.to_string(), "A.java: unexpected");
        assert_eq!(report.code().map(|c| c.to_string()).as_deref(), Some("expectkit::unexpected_issue"));
        let label = report.labels().and_then(|mut labels| labels.next()).unwrap();
        assert_eq!(label.offset(), 7);
        assert_eq!(label.len(), 6);
    }
}
