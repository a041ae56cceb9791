use expectkit_source::{EditOperation, Location, TextRange};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{error::BuildError, message::MessagePattern, token::LineRef};

/// An auxiliary location an expected issue must report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryLocation {
    pub location: Location,
    /// Position in an ordered `secondary` list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// A quickfix with its edits resolved against the issue that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedQuickfix {
    pub id: String,
    pub description: String,
    pub edits: Vec<EditOperation>,
}

/// One step of an expected flow, declared by a `flow@` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    /// Starts on the line the directive is written on
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessagePattern>,
    /// Explicit `order=N`, counted from the origin of the flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
}

/// A named sequence of locations some issue must report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedFlow {
    pub id: String,
    /// Line of the first step declared
    pub line: usize,
    /// Steps in reporting order once [`sort_steps`](Self::sort_steps) ran
    pub steps: Vec<FlowStep>,
}

impl ExpectedFlow {
    pub fn new(id: impl Into<String>, line: usize) -> Self {
        Self { id: id.into(), line, steps: Vec::new() }
    }

    pub fn lines(&self) -> Vec<usize> {
        self.steps.iter().map(|step| step.location.start_line()).collect()
    }

    /// Put the steps in the order analyzers report them: from the last step
    /// back to the origin.
    ///
    /// Steps are ordered by their explicit `order=N` when every step has one,
    /// and by position otherwise.
    pub fn sort_steps(&mut self) -> Result<(), String> {
        let explicit = self.steps.iter().filter(|step| step.order.is_some()).count();
        if explicit == 0 {
            self.steps.sort_by_key(|step| {
                std::cmp::Reverse((step.location.start_line(), step.location.start_column().unwrap_or(0)))
            });
            return Ok(());
        }
        if explicit != self.steps.len() {
            return Err("mixes steps with and without `order=N`".to_string());
        }
        self.steps.sort_by_key(|step| std::cmp::Reverse(step.order));
        match self.steps.windows(2).find(|pair| pair[0].order == pair[1].order) {
            Some(pair) => Err(format!(
                "has two steps with order={} (lines {} and {})",
                pair[0].order.unwrap_or_default(),
                pair[1].location.start_line(),
                pair[0].location.start_line()
            )),
            None => Ok(()),
        }
    }
}

/// One expected diagnostic with every line reference resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedIssue {
    /// Line the `Noncompliant` directive is written on
    pub anchor_line: usize,
    /// Position among the expected issues of the file
    pub declaration_index: usize,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessagePattern>,
    /// `None` when secondaries are not checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondaries: Option<Vec<SecondaryLocation>>,
    pub ordered_secondaries: bool,
    /// Ids from `quickfixes=`, in the order written
    pub quickfix_ids: Vec<String>,
    /// The referenced quickfixes that could be resolved
    pub quickfixes: Vec<ExpectedQuickfix>,
    /// `quickfixes=!`
    pub no_quickfix_expected: bool,
    /// Ids from `flows=`; `None` when flows are not checked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_ids: Option<Vec<String>>,
    /// `effortToFix=`, compared with the cost the analyzer reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_to_fix: Option<f64>,
}

impl ExpectedIssue {
    pub fn line(&self) -> usize {
        self.location.start_line()
    }

    pub fn checks_quickfixes(&self) -> bool {
        self.no_quickfix_expected || !self.quickfix_ids.is_empty()
    }
}

/// An `edit@id` directive before its lines are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDirective {
    /// Line the directive is written on
    pub line: usize,
    pub start_line: Option<LineRef>,
    pub end_line: Option<LineRef>,
    pub start_column: usize,
    pub end_column: usize,
    /// Replacement with `\n` escapes decoded
    pub replacement: String,
}

impl EditDirective {
    /// Resolve against the primary line of the issue offering the quickfix.
    ///
    /// Without `sl` the edit starts on that line; without `el` it ends on its
    /// start line.
    pub fn resolve(&self, id: &str, issue_line: usize) -> Result<EditOperation, BuildError> {
        let resolve = |reference: LineRef| {
            reference.resolve(issue_line).ok_or_else(|| BuildError::LineOutOfRange {
                line: self.line,
                reference: reference.to_string(),
            })
        };
        let start_line = self.start_line.map(resolve).transpose()?.unwrap_or(issue_line);
        let end_line = self.end_line.map(resolve).transpose()?.unwrap_or(start_line);
        let range = TextRange::new(start_line, self.start_column, end_line, self.end_column)
            .map_err(|e| BuildError::InvalidSpan { line: self.line, reason: e.to_string() })?;

        let edit = EditOperation::new(range, self.replacement.clone());
        if edit.is_noop() {
            return Err(BuildError::EmptyEdit { id: id.to_string(), line: self.line });
        }
        Ok(edit)
    }
}

/// A quickfix assembled from `fix@id` and `edit@id` directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quickfix {
    pub id: String,
    /// First line mentioning the id
    pub line: usize,
    pub description: Option<String>,
    pub edits: Vec<EditDirective>,
}

impl Quickfix {
    pub fn new(id: impl Into<String>, line: usize) -> Self {
        Self { id: id.into(), line, description: None, edits: Vec::new() }
    }

    pub fn is_complete(&self) -> bool {
        self.description.is_some() && !self.edits.is_empty()
    }

    /// Resolve every edit for an issue whose primary line is `issue_line`.
    pub fn resolve(&self, issue_line: usize) -> Result<ExpectedQuickfix, BuildError> {
        let description = self.description.clone().ok_or_else(|| BuildError::MissingDescription {
            id: self.id.clone(),
            line: self.line,
        })?;
        let edits = self
            .edits
            .iter()
            .map(|edit| edit.resolve(&self.id, issue_line))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExpectedQuickfix { id: self.id.clone(), description, edits })
    }
}

/// Everything the annotations of one file expect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectations {
    /// Expected issues in declaration order
    pub issues: Vec<ExpectedIssue>,
    /// Quickfixes by id, in order of first appearance
    pub quickfixes: IndexMap<String, Quickfix>,
    /// Flows by id, in order of first appearance
    pub flows: IndexMap<String, ExpectedFlow>,
    /// Message of the single issue expected on the file as a whole
    pub file_issue: Option<MessagePattern>,
    /// Problems with the annotations themselves
    pub defects: Vec<BuildError>,
}

impl Expectations {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.file_issue.is_none()
    }

    /// Expected issues, counting the file-level one.
    pub fn expected_count(&self) -> usize {
        self.issues.len() + usize::from(self.file_issue.is_some())
    }

    /// Expect exactly one issue raised on the file rather than on a line.
    pub fn expect_file_issue(&mut self, message: &str, fragment_marker: &str) {
        self.file_issue = Some(MessagePattern::parse(message, fragment_marker));
    }
}
