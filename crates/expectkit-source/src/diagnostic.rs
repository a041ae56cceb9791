//! Source-aware reports for rich terminal rendering
//!
//! Errors in this workspace are plain `thiserror` enums deriving
//! `miette::Diagnostic`. They carry spans but not the text those spans point
//! into; [`Report`] pairs a diagnostic with the file it was raised against so
//! miette can render the labelled source lines.

use crate::SourceText;
use std::{error::Error, fmt::{self, Display}, sync::Arc};
use miette::{Diagnostic, Severity};
use thiserror::Error;

/// A diagnostic bundled with the source text it refers to.
///
/// # Fields
///
/// * `source_code` - The source code text to display with the error
/// * `report` - The error report containing diagnostic details
#[derive(Debug, Clone, Error)]
pub struct Report {
    /// The source code text for context in error displays
    pub source_code: String,

    /// The error report
    pub report: Arc<dyn ExpectError>,
}

/// Display implementation that delegates to the underlying error report
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.report.fmt(f)
    }
}

/// Delegates to the wrapped diagnostic, except for the source code which
/// comes from the report itself.
impl miette::Diagnostic for Report {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.report.code()
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        self.report.diagnostic_source()
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.report.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        self.report.labels()
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        self.report.related()
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_code)
    }

    fn url<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.report.url()
    }

    fn severity(&self) -> Option<Severity> {
        self.report.severity()
    }
}

/// A diagnostic that can be attached to the source text it was raised against.
pub trait ExpectError: Diagnostic + Send + Sync + Display + Error + 'static {
    /// Bundle this error with the text of `source`.
    fn report(self, source: &SourceText) -> Report;
}

impl<T: Diagnostic + Send + Sync + Display + Error + 'static> ExpectError for T {
    fn report(self, source: &SourceText) -> Report {
        Report {
            source_code: source.contents().to_string(),
            report: Arc::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceError;

    #[test]
    fn report_carries_source_and_delegates_code() {
        let source = SourceText::new("A.java", "class A {}\n");
        let report = SourceError::LineOutOfBounds { line: 4, line_count: 1 }.report(&source);
        assert_eq!(report.source_code, "class A {}\n");
        assert_eq!(report.to_string(), "Line 4 is outside the file (1 lines)");
        assert_eq!(report.code().map(|c| c.to_string()).as_deref(), Some("SOURCE-002"));
        assert!(miette::Diagnostic::source_code(&report).is_some());
    }
}
