//! Verification of analyzer output against fixture expectations.
//!
//! This crate is responsible for:
//! - Converting analyzer output into [`ActualIssue`]s checked against the file
//! - Reconciling expected and actual issues line by line, with their flows
//! - Checking the single issue a file may expect on itself
//! - Applying expected quickfix edits and comparing with golden texts
//! - Aggregating per-file [`FileVerdict`]s into a [`Verdict`], in parallel

mod error;
mod normalize;
mod quickfix;
mod reconcile;
mod verdict;
mod verifier;

pub use error::{NormalizationError, QuickfixError};
pub use normalize::{
    normalize_issue, normalize_issues, ActualFlowStep, ActualIssue, ActualIssues, ActualQuickfix,
    AnalyzedFile, AnalyzerEdit, AnalyzerFlowStep, AnalyzerIssue, AnalyzerLocation, AnalyzerQuickfix,
    AnalyzerReport, FileLevelIssue,
};
pub use quickfix::{apply_edits, compare_with_golden, verify_quickfix};
pub use reconcile::reconcile;
pub use verdict::{Discrepancy, DiscrepancyKind, FileVerdict, Verdict, Warning, WarningKind};
pub use verifier::{FileInput, Verifier};
