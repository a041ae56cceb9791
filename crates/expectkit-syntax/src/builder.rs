use std::collections::BTreeSet;

use expectkit_source::{Location, Position, SourceText, VerifierConfig};
use indexmap::IndexMap;

use crate::{
    error::{BuildError, MalformedAnnotation},
    message::MessagePattern,
    model::{EditDirective, ExpectedFlow, ExpectedIssue, Expectations, FlowStep, Quickfix, SecondaryLocation},
    scanner::AnnotationScanner,
    token::{Annotation, AttributeBlock, DirectiveKind, LineRef, QuickfixList},
};

/// Scan a file and build its expectations.
pub fn build_expectations(source: &SourceText, config: &VerifierConfig) -> Expectations {
    let mut builder = ExpectationBuilder::new(config);
    for token in AnnotationScanner::with_config(source, config) {
        builder.push(token);
    }
    let expectations = builder.finish();
    log::debug!(
        "{}: {} expected issue(s), {} quickfix(es), {} flow(s), {} defect(s)",
        source.path(),
        expectations.issues.len(),
        expectations.quickfixes.len(),
        expectations.flows.len(),
        expectations.defects.len()
    );
    expectations
}

/// Assembles scanner tokens into [`Expectations`].
///
/// Quickfix and flow directives may appear before or after the issue that
/// references them, so both are only linked to issues in [`finish`](Self::finish).
pub struct ExpectationBuilder<'a> {
    config: &'a VerifierConfig,
    issues: Vec<ExpectedIssue>,
    quickfixes: IndexMap<String, Quickfix>,
    flows: IndexMap<String, ExpectedFlow>,
    defects: Vec<BuildError>,
}

impl<'a> ExpectationBuilder<'a> {
    pub fn new(config: &'a VerifierConfig) -> Self {
        Self {
            config,
            issues: Vec::new(),
            quickfixes: IndexMap::new(),
            flows: IndexMap::new(),
            defects: Vec::new(),
        }
    }

    fn defect(&mut self, defect: BuildError) {
        log::warn!("{}", defect);
        self.defects.push(defect);
    }

    pub fn push(&mut self, token: Result<Annotation, MalformedAnnotation>) {
        let annotation = match token {
            Ok(annotation) => annotation,
            Err(malformed) => {
                self.defects.push(BuildError::Malformed(malformed));
                return;
            }
        };
        let line = annotation.line;
        match annotation.kind {
            DirectiveKind::Noncompliant { shift } => {
                if let Err(defect) = self.push_issue(line, shift, annotation.attributes, annotation.text) {
                    self.defect(defect);
                }
            }
            DirectiveKind::Fix { id } => {
                if self.quickfix_allowed(&id, line) {
                    let quickfix = self
                        .quickfixes
                        .entry(id.clone())
                        .or_insert_with(|| Quickfix::new(id.clone(), line));
                    if quickfix.description.is_some() {
                        self.defect(BuildError::DuplicateDescription { id, line });
                    } else {
                        quickfix.description = annotation.text;
                    }
                }
            }
            DirectiveKind::Edit { id } => {
                if self.quickfix_allowed(&id, line) {
                    self.push_edit(id, line, annotation.attributes, annotation.text.unwrap_or_default());
                }
            }
            DirectiveKind::Flow { ids } => {
                if let Err(defect) = self.push_flow_step(line, ids, annotation.attributes, annotation.text) {
                    self.defect(defect);
                }
            }
        }
    }

    fn quickfix_allowed(&mut self, id: &str, line: usize) -> bool {
        if id == "!" {
            self.defect(BuildError::ReservedQuickfixId { line });
            return false;
        }
        if !self.config.with_quickfixes {
            self.defect(BuildError::QuickfixesNotEnabled { line });
            return false;
        }
        true
    }

    fn push_issue(
        &mut self,
        anchor: usize,
        shift: Option<LineRef>,
        attributes: AttributeBlock,
        text: Option<String>,
    ) -> Result<(), BuildError> {
        let resolve = |reference: LineRef| {
            reference
                .resolve(anchor)
                .ok_or_else(|| BuildError::LineOutOfRange { line: anchor, reference: reference.to_string() })
        };

        let line = shift.or(attributes.start_line).map(resolve).transpose()?.unwrap_or(anchor);
        let start = Position::new(line, attributes.start_column);
        let end = if attributes.end_line.is_some() || attributes.end_column.is_some() {
            let end_line = attributes.end_line.map(resolve).transpose()?.unwrap_or(line);
            Some(Position::new(end_line, attributes.end_column))
        } else {
            None
        };
        let location = Location::new(start, end)
            .map_err(|e| BuildError::InvalidSpan { line: anchor, reason: e.to_string() })?;

        let secondaries = attributes
            .secondary
            .map(|refs| {
                refs.into_iter()
                    .enumerate()
                    .map(|(index, secondary)| -> Result<SecondaryLocation, BuildError> {
                        Ok(SecondaryLocation {
                            location: Location {
                                start: Position::new(resolve(secondary.line)?, secondary.column),
                                end: None,
                            },
                            index: attributes.ordered.then_some(index),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        let (quickfix_ids, no_quickfix_expected) = match attributes.quickfixes {
            Some(_) if !self.config.with_quickfixes => {
                self.defect(BuildError::QuickfixesNotEnabled { line: anchor });
                (Vec::new(), false)
            }
            Some(QuickfixList::NoneExpected) => (Vec::new(), true),
            Some(QuickfixList::Ids(ids)) => (ids, false),
            None => (Vec::new(), false),
        };

        self.issues.push(ExpectedIssue {
            anchor_line: anchor,
            declaration_index: self.issues.len(),
            location,
            message: text.map(|text| MessagePattern::parse(&text, &self.config.fragment_marker)),
            secondaries,
            ordered_secondaries: attributes.ordered,
            quickfix_ids,
            quickfixes: Vec::new(),
            no_quickfix_expected,
            flow_ids: attributes.flows,
            effort_to_fix: attributes.effort_to_fix,
        });
        Ok(())
    }

    /// Record one step shared by every flow in `ids`.
    fn push_flow_step(
        &mut self,
        line: usize,
        ids: Vec<String>,
        attributes: AttributeBlock,
        text: Option<String>,
    ) -> Result<(), BuildError> {
        let end = if attributes.end_line.is_some() || attributes.end_column.is_some() {
            let end_line = match attributes.end_line {
                Some(reference) => reference
                    .resolve(line)
                    .ok_or_else(|| BuildError::LineOutOfRange { line, reference: reference.to_string() })?,
                None => line,
            };
            Some(Position::new(end_line, attributes.end_column))
        } else {
            None
        };
        let location = Location::new(Position::new(line, attributes.start_column), end)
            .map_err(|e| BuildError::InvalidSpan { line, reason: e.to_string() })?;
        let step = FlowStep {
            location,
            message: text.map(|text| MessagePattern::parse(&text, &self.config.fragment_marker)),
            order: attributes.step_order,
        };
        for id in ids {
            self.flows
                .entry(id.clone())
                .or_insert_with(|| ExpectedFlow::new(id, line))
                .steps
                .push(step.clone());
        }
        Ok(())
    }

    fn push_edit(&mut self, id: String, line: usize, attributes: AttributeBlock, replacement: String) {
        let (start_column, end_column) = match (attributes.start_column, attributes.end_column) {
            (Some(sc), Some(ec)) => (sc, ec),
            (None, _) => return self.defect(BuildError::MissingEditColumn { id, line, which: "start" }),
            (_, None) => return self.defect(BuildError::MissingEditColumn { id, line, which: "end" }),
        };
        let edit = EditDirective {
            line,
            start_line: attributes.start_line,
            end_line: attributes.end_line,
            start_column,
            end_column,
            replacement: replacement.replace("\\n", "\n"),
        };
        self.quickfixes
            .entry(id.clone())
            .or_insert_with(|| Quickfix::new(id, line))
            .edits
            .push(edit);
    }

    /// Link quickfixes to issues and report incomplete or unused quickfixes.
    pub fn finish(mut self) -> Expectations {
        let mut defects = Vec::new();
        for quickfix in self.quickfixes.values() {
            if quickfix.description.is_none() {
                defects.push(BuildError::MissingDescription { id: quickfix.id.clone(), line: quickfix.line });
            }
            if quickfix.edits.is_empty() {
                defects.push(BuildError::MissingEdits { id: quickfix.id.clone(), line: quickfix.line });
            }
        }

        let mut referenced = BTreeSet::new();
        for issue in &mut self.issues {
            for id in &issue.quickfix_ids {
                referenced.insert(id.clone());
                match self.quickfixes.get(id) {
                    None => defects.push(BuildError::UnresolvedQuickfixReference {
                        id: id.clone(),
                        line: issue.anchor_line,
                    }),
                    Some(quickfix) if quickfix.is_complete() => match quickfix.resolve(issue.line()) {
                        Ok(resolved) => {
                            log::debug!("Linked quickfix `{}` to the issue on line {}", id, issue.line());
                            issue.quickfixes.push(resolved);
                        }
                        Err(defect) => defects.push(defect),
                    },
                    Some(_) => {}
                }
            }
        }

        for quickfix in self.quickfixes.values() {
            if !referenced.contains(&quickfix.id) {
                defects.push(BuildError::OrphanQuickfix { id: quickfix.id.clone(), line: quickfix.line });
            }
        }

        for flow in self.flows.values_mut() {
            if let Err(reason) = flow.sort_steps() {
                defects.push(BuildError::InvalidFlowOrder { id: flow.id.clone(), line: flow.line, reason });
            }
        }
        let mut referenced_flows = BTreeSet::new();
        for issue in &self.issues {
            for id in issue.flow_ids.iter().flatten() {
                referenced_flows.insert(id.clone());
                if !self.flows.contains_key(id) {
                    defects.push(BuildError::UnresolvedFlowReference { id: id.clone(), line: issue.anchor_line });
                }
            }
        }
        for flow in self.flows.values() {
            if !referenced_flows.contains(&flow.id) {
                defects.push(BuildError::OrphanFlow { id: flow.id.clone(), line: flow.line });
            }
        }

        for defect in defects {
            self.defect(defect);
        }
        Expectations {
            issues: self.issues,
            quickfixes: self.quickfixes,
            flows: self.flows,
            file_issue: None,
            defects: self.defects,
        }
    }
}
