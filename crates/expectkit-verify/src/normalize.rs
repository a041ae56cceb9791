//! Analyzer output and its conversion into [`ActualIssue`]s.

use expectkit_source::{EditOperation, Location, Position, SourceError, SourceText, TextRange};
use serde::{Deserialize, Serialize};

use crate::error::NormalizationError;

/// A span as reported by an analyzer: 1-based lines and columns.
///
/// An issue without a line is raised on the file as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
}

impl AnalyzerLocation {
    pub fn line(line: usize) -> Self {
        Self { line: Some(line), ..Default::default() }
    }

    /// No position at all: the file itself.
    pub fn file() -> Self {
        Self::default()
    }

    pub fn span(line: usize, column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
            end_line: Some(end_line),
            end_column: Some(end_column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerEdit {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    #[serde(default)]
    pub replacement: String,
}

impl AnalyzerEdit {
    pub fn on_line(line: usize, start_column: usize, end_column: usize, replacement: &str) -> Self {
        Self {
            start_line: line,
            start_column,
            end_line: line,
            end_column,
            replacement: replacement.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerQuickfix {
    pub description: String,
    #[serde(default)]
    pub edits: Vec<AnalyzerEdit>,
}

/// One location of a flow, with what happens there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerFlowStep {
    #[serde(flatten)]
    pub location: AnalyzerLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalyzerFlowStep {
    pub fn new(location: AnalyzerLocation, message: &str) -> Self {
        Self { location, message: Some(message.to_string()) }
    }
}

/// One diagnostic as emitted by the analyzer under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerIssue {
    #[serde(flatten)]
    pub location: AnalyzerLocation,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondaries: Vec<AnalyzerLocation>,
    /// Each flow lists its steps from the last one back to the origin
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flows: Vec<Vec<AnalyzerFlowStep>>,
    /// Effort to fix the issue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quickfixes: Vec<AnalyzerQuickfix>,
}

impl AnalyzerIssue {
    pub fn new(location: AnalyzerLocation, message: &str) -> Self {
        Self {
            location,
            message: message.to_string(),
            rule: None,
            secondaries: Vec::new(),
            flows: Vec::new(),
            cost: None,
            quickfixes: Vec::new(),
        }
    }

    pub fn on_file(message: &str) -> Self {
        Self::new(AnalyzerLocation::file(), message)
    }

    pub fn with_flow(mut self, steps: Vec<AnalyzerFlowStep>) -> Self {
        self.flows.push(steps);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_secondary(mut self, location: AnalyzerLocation) -> Self {
        self.secondaries.push(location);
        self
    }

    pub fn with_quickfix(mut self, description: &str, edits: Vec<AnalyzerEdit>) -> Self {
        self.quickfixes.push(AnalyzerQuickfix { description: description.to_string(), edits });
        self
    }
}

/// The issues an analyzer raised on one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedFile {
    pub path: String,
    #[serde(default)]
    pub issues: Vec<AnalyzerIssue>,
}

/// A whole analyzer run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerReport {
    pub files: Vec<AnalyzedFile>,
}

impl AnalyzerReport {
    /// Issues reported for `path`; files the analyzer did not mention have none.
    pub fn issues_for(&self, path: &str) -> Vec<AnalyzerIssue> {
        self.files
            .iter()
            .filter(|file| file.path == path)
            .flat_map(|file| file.issues.iter().cloned())
            .collect()
    }
}

/// An offered quickfix in original-text coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualQuickfix {
    pub description: String,
    pub edits: Vec<EditOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualFlowStep {
    pub location: Location,
    pub message: Option<String>,
}

/// An analyzer issue checked against the file it was raised on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualIssue {
    /// Position in the analyzer's output
    pub index: usize,
    pub location: Location,
    pub message: String,
    pub secondaries: Vec<Location>,
    pub flows: Vec<Vec<ActualFlowStep>>,
    pub cost: Option<f64>,
    pub quickfixes: Vec<ActualQuickfix>,
}

impl ActualIssue {
    pub fn line(&self) -> usize {
        self.location.start_line()
    }
}

/// An issue raised on the file rather than on one of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLevelIssue {
    pub index: usize,
    pub message: String,
}

/// Everything an analyzer raised on one file, once normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActualIssues {
    pub issues: Vec<ActualIssue>,
    pub file_issues: Vec<FileLevelIssue>,
}

impl ActualIssues {
    pub fn len(&self) -> usize {
        self.issues.len() + self.file_issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_position(
    source: &SourceText,
    index: usize,
    line: usize,
    column: Option<usize>,
) -> Result<Position, NormalizationError> {
    if !source.contains_line(line) {
        return Err(NormalizationError::LineOutOfBounds {
            index,
            line,
            line_count: source.line_count(),
        });
    }
    if let Some(column) = column {
        if let Err(SourceError::ColumnOutOfBounds { line_length, .. }) = source.offset_of(line, column) {
            return Err(NormalizationError::ColumnOutOfBounds { index, line, column, line_length });
        }
    }
    Ok(Position::new(line, column))
}

fn normalize_location(
    source: &SourceText,
    index: usize,
    location: &AnalyzerLocation,
) -> Result<Location, NormalizationError> {
    let line = location.line.ok_or(NormalizationError::MissingLine { index })?;
    let start = check_position(source, index, line, location.column)?;
    let end = match (location.end_line, location.end_column) {
        (None, None) => None,
        (end_line, end_column) => Some(check_position(source, index, end_line.unwrap_or(line), end_column)?),
    };
    Location::new(start, end).map_err(|e| NormalizationError::InvalidSpan { index, reason: e.to_string() })
}

/// Convert one analyzer issue, checking every position against the file.
///
/// Edit spans are only checked for shape here; whether they fit the file is
/// up to the quickfix verifier.
pub fn normalize_issue(
    source: &SourceText,
    index: usize,
    issue: &AnalyzerIssue,
) -> Result<ActualIssue, NormalizationError> {
    let location = normalize_location(source, index, &issue.location)?;
    let secondaries = issue
        .secondaries
        .iter()
        .map(|secondary| normalize_location(source, index, secondary))
        .collect::<Result<Vec<_>, _>>()?;
    let flows = issue
        .flows
        .iter()
        .map(|flow| {
            flow.iter()
                .map(|step| -> Result<ActualFlowStep, NormalizationError> {
                    Ok(ActualFlowStep {
                        location: normalize_location(source, index, &step.location)?,
                        message: step.message.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    let quickfixes = issue
        .quickfixes
        .iter()
        .map(|quickfix| -> Result<ActualQuickfix, NormalizationError> {
            let edits = quickfix
                .edits
                .iter()
                .map(|edit| {
                    TextRange::new(edit.start_line, edit.start_column, edit.end_line, edit.end_column)
                        .map(|range| EditOperation::new(range, edit.replacement.clone()))
                        .map_err(|e| NormalizationError::InvalidEdit { index, reason: e.to_string() })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ActualQuickfix { description: quickfix.description.clone(), edits })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ActualIssue {
        index,
        location,
        message: issue.message.clone(),
        secondaries,
        flows,
        cost: issue.cost,
        quickfixes,
    })
}

/// Check an issue without a line: it may only carry a message.
fn normalize_file_issue(index: usize, issue: &AnalyzerIssue) -> Result<FileLevelIssue, NormalizationError> {
    let invalid = |reason: &str| NormalizationError::InvalidFileIssue { index, reason: reason.to_string() };
    let location = &issue.location;
    if location.column.is_some() || location.end_line.is_some() || location.end_column.is_some() {
        return Err(invalid("has a column or an end position"));
    }
    if !issue.secondaries.is_empty() {
        return Err(invalid("has secondary locations"));
    }
    if !issue.flows.is_empty() {
        return Err(invalid("has flows"));
    }
    if !issue.quickfixes.is_empty() {
        return Err(invalid("offers quickfixes"));
    }
    Ok(FileLevelIssue { index, message: issue.message.clone() })
}

/// Convert all issues of a file; the first failure rejects the file.
pub fn normalize_issues(source: &SourceText, issues: &[AnalyzerIssue]) -> Result<ActualIssues, NormalizationError> {
    let mut actual = ActualIssues::default();
    for (index, issue) in issues.iter().enumerate() {
        if issue.location.line.is_none() {
            actual.file_issues.push(normalize_file_issue(index, issue)?);
        } else {
            actual.issues.push(normalize_issue(source, index, issue)?);
        }
    }
    Ok(actual)
}
