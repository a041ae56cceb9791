//! Matching expected issues against actual ones.
//!
//! Issues are grouped by primary line. On each line, expected issues that set
//! a start column first claim an actual issue at that column; the rest are
//! paired in declaration order with the remaining actual issues sorted by
//! `(column, emission order)`. Issues raised on the file itself are matched
//! on their own. Only ordered maps and vectors are iterated, so the verdict
//! is a pure function of the two inputs.

use std::collections::{BTreeMap, BTreeSet};

use expectkit_source::{Location, SourceText, VerifierConfig};
use expectkit_syntax::{
    BuildError, ExpectedFlow, ExpectedIssue, ExpectedQuickfix, Expectations, MessagePattern, SecondaryLocation,
};
use indexmap::IndexMap;

use crate::{
    error::QuickfixError,
    normalize::{ActualFlowStep, ActualIssue, ActualIssues, ActualQuickfix, FileLevelIssue},
    quickfix::verify_quickfix,
    verdict::{Discrepancy, DiscrepancyKind, FileVerdict, Warning, WarningKind},
};

/// Reconcile one file.
///
/// `goldens` maps quickfix ids to the text the file must have once that
/// quickfix is applied.
pub fn reconcile(
    source: &SourceText,
    config: &VerifierConfig,
    expectations: &Expectations,
    actual: &ActualIssues,
    goldens: &BTreeMap<String, String>,
) -> FileVerdict {
    let mut reconciliation = Reconciliation {
        config,
        flows: &expectations.flows,
        verdict: FileVerdict::new(source.path()),
    };
    reconciliation.verdict.expected = expectations.expected_count();
    reconciliation.verdict.actual = actual.len();

    for defect in &expectations.defects {
        reconciliation.defect(defect);
    }

    if config.expect_no_issues {
        for issue in &expectations.issues {
            reconciliation.push(
                DiscrepancyKind::UnexpectedAnnotation,
                issue.line(),
                issue.location.start_column(),
                "issue expected although the file must not raise any".to_string(),
            );
        }
        if expectations.file_issue.is_some() {
            reconciliation.push_file(
                DiscrepancyKind::UnexpectedAnnotation,
                "file issue expected although the file must not raise any".to_string(),
            );
        }
        for issue in &actual.issues {
            reconciliation.unexpected(issue);
        }
        reconciliation.match_file_issues(None, &actual.file_issues);
    } else if expectations.is_empty() && actual.is_empty() {
        if config.require_issues {
            reconciliation.verdict.discrepancies.push(Discrepancy::new(
                DiscrepancyKind::NoIssueRaised,
                None,
                None,
                "no issue raised; at least one issue is expected",
            ));
        }
    } else {
        reconciliation.match_issues(&expectations.issues, &actual.issues);
        reconciliation.match_file_issues(expectations.file_issue.as_ref(), &actual.file_issues);
    }

    if config.with_quickfixes {
        reconciliation.verify_quickfixes(source, &expectations.issues, goldens);
    }

    reconciliation.verdict.sort();
    reconciliation.verdict
}

struct Reconciliation<'a> {
    config: &'a VerifierConfig,
    flows: &'a IndexMap<String, ExpectedFlow>,
    verdict: FileVerdict,
}

fn render_list<'l>(locations: impl Iterator<Item = &'l Location>) -> String {
    let items: Vec<String> = locations.map(|location| location.to_string()).collect();
    format!("[{}]", items.join(", "))
}

fn secondary_matches(expected: &Location, actual: &Location) -> bool {
    expected.start_line() == actual.start_line()
        && expected
            .start_column()
            .map_or(true, |column| actual.start_column() == Some(column))
}

/// Whether the parts of `expected` that were written down differ from `actual`.
///
/// The start line is assumed to match already.
fn location_differs(expected: &Location, actual: &Location) -> bool {
    let start_differs = expected
        .start_column()
        .map_or(false, |column| actual.start_column() != Some(column));
    let end_differs = expected.end.map_or(false, |end| {
        end.line != actual.end_line() || end.column.map_or(false, |column| actual.end_column() != Some(column))
    });
    start_differs || end_differs
}

fn flow_lines(flow: &[ActualFlowStep]) -> Vec<usize> {
    flow.iter().map(|step| step.location.start_line()).collect()
}

fn flow_messages_match(expected: &ExpectedFlow, actual: &[ActualFlowStep]) -> bool {
    expected.steps.iter().zip(actual).all(|(step, actual)| match (&step.message, &actual.message) {
        (None, _) => true,
        (Some(pattern), Some(message)) => pattern.matches(message),
        (Some(_), None) => false,
    })
}

impl Reconciliation<'_> {
    fn push(&mut self, kind: DiscrepancyKind, line: usize, column: Option<usize>, detail: String) {
        self.verdict
            .discrepancies
            .push(Discrepancy::new(kind, Some(line), column, detail));
    }

    fn push_file(&mut self, kind: DiscrepancyKind, detail: String) {
        self.verdict.discrepancies.push(Discrepancy::new(kind, None, None, detail));
    }

    fn defect(&mut self, defect: &BuildError) {
        let (kind, detail) = match defect {
            BuildError::Malformed(malformed) => (
                DiscrepancyKind::MalformedAnnotation,
                format!("malformed annotation: {}", malformed.reason),
            ),
            BuildError::LineOutOfRange { .. } | BuildError::InvalidSpan { .. } => {
                (DiscrepancyKind::MalformedAnnotation, defect.to_string())
            }
            BuildError::UnresolvedQuickfixReference { .. } => {
                (DiscrepancyKind::UnresolvedQuickfixReference, defect.to_string())
            }
            _ if defect.is_flow_defect() => (DiscrepancyKind::InvalidFlow, defect.to_string()),
            _ => (DiscrepancyKind::InvalidQuickfix, defect.to_string()),
        };
        self.push(kind, defect.line(), None, detail);
    }

    fn missing(&mut self, issue: &ExpectedIssue) {
        let message = issue
            .message
            .as_ref()
            .map_or_else(String::new, |message| format!(" with message {}", message));
        self.push(
            DiscrepancyKind::MissingIssue,
            issue.line(),
            issue.location.start_column(),
            format!("expected an issue at {}{}, none was raised", issue.location, message),
        );
    }

    fn unexpected(&mut self, issue: &ActualIssue) {
        self.push(
            DiscrepancyKind::UnexpectedIssue,
            issue.line(),
            issue.location.start_column(),
            format!("unexpected issue at {}: \"{}\"", issue.location, issue.message),
        );
    }

    /// At most one issue is expected on the file; any other one is unexpected.
    fn match_file_issues(&mut self, expected: Option<&MessagePattern>, actual: &[FileLevelIssue]) {
        let mut actual = actual.iter();
        if let Some(message) = expected {
            match actual.next() {
                None => self.push_file(
                    DiscrepancyKind::MissingIssue,
                    format!("expected an issue on the file with message {}, none was raised", message),
                ),
                Some(issue) if !message.matches(&issue.message) => self.push_file(
                    DiscrepancyKind::MessageMismatch,
                    format!("expected file issue message {}, actual \"{}\"", message, issue.message),
                ),
                Some(_) => {}
            }
        }
        for issue in actual {
            self.push_file(
                DiscrepancyKind::UnexpectedIssue,
                format!("unexpected issue on the file: \"{}\"", issue.message),
            );
        }
    }

    fn match_issues(&mut self, expected: &[ExpectedIssue], actual: &[ActualIssue]) {
        let mut by_line: BTreeMap<usize, (Vec<&ExpectedIssue>, Vec<&ActualIssue>)> = BTreeMap::new();
        for issue in expected {
            by_line.entry(issue.line()).or_default().0.push(issue);
        }
        for issue in actual {
            by_line.entry(issue.line()).or_default().1.push(issue);
        }
        for (line, (expected, actual)) in by_line {
            self.match_line(line, &expected, &actual);
        }
    }

    fn match_line(&mut self, line: usize, expected: &[&ExpectedIssue], actual: &[&ActualIssue]) {
        let mut claimed = vec![false; actual.len()];
        let mut pairs: Vec<(&ExpectedIssue, Option<usize>)> = expected.iter().map(|issue| (*issue, None)).collect();

        for (issue, partner) in pairs.iter_mut() {
            if let Some(column) = issue.location.start_column() {
                let found = (0..actual.len())
                    .find(|&i| !claimed[i] && actual[i].location.start_column() == Some(column));
                if let Some(i) = found {
                    claimed[i] = true;
                    *partner = Some(i);
                }
            }
        }

        let mut rest: Vec<usize> = (0..actual.len()).filter(|&i| !claimed[i]).collect();
        rest.sort_by_key(|&i| (actual[i].location.start_column(), actual[i].index));
        let mut rest = rest.into_iter();
        for (_, partner) in pairs.iter_mut().filter(|(_, partner)| partner.is_none()) {
            *partner = rest.next();
        }

        for (issue, partner) in pairs {
            match partner {
                Some(i) => {
                    log::debug!(
                        "Line {}: expected issue #{} matched actual issue #{}",
                        line,
                        issue.declaration_index,
                        actual[i].index
                    );
                    self.compare(issue, actual[i]);
                }
                None => self.missing(issue),
            }
        }
        for i in rest {
            self.unexpected(actual[i]);
        }
    }

    fn compare(&mut self, expected: &ExpectedIssue, actual: &ActualIssue) {
        let line = expected.line();
        let column = expected.location.start_column();

        if location_differs(&expected.location, &actual.location) {
            self.push(
                DiscrepancyKind::LocationMismatch,
                line,
                column,
                format!("expected location {}, actual {}", expected.location, actual.location),
            );
        }

        if let Some(message) = &expected.message {
            if !message.matches(&actual.message) {
                self.push(
                    DiscrepancyKind::MessageMismatch,
                    line,
                    column,
                    format!("expected message {}, actual \"{}\"", message, actual.message),
                );
            }
        }

        if let Some(secondaries) = &expected.secondaries {
            self.compare_secondaries(expected, secondaries, &actual.secondaries);
        }

        if let Some(ids) = &expected.flow_ids {
            self.compare_flows(expected, ids, &actual.flows);
        }

        if let Some(effort) = expected.effort_to_fix {
            if actual.cost != Some(effort) {
                let cost = actual.cost.map_or_else(|| "none".to_string(), |cost| cost.to_string());
                self.push(
                    DiscrepancyKind::EffortMismatch,
                    line,
                    column,
                    format!("expected effort to fix {}, actual {}", effort, cost),
                );
            }
        }

        if self.config.with_quickfixes {
            self.compare_quickfixes(expected, actual);
        }
    }

    fn compare_secondaries(&mut self, issue: &ExpectedIssue, expected: &[SecondaryLocation], actual: &[Location]) {
        let matched = if issue.ordered_secondaries {
            let mut ordered: Vec<&SecondaryLocation> = expected.iter().collect();
            ordered.sort_by_key(|secondary| secondary.index);
            ordered.len() == actual.len()
                && ordered
                    .iter()
                    .zip(actual)
                    .all(|(e, a)| secondary_matches(&e.location, a))
        } else {
            // Column-constrained entries pick their partner before line-only ones.
            let mut used = vec![false; actual.len()];
            let constrained = expected.iter().filter(|s| s.location.start_column().is_some());
            let line_only = expected.iter().filter(|s| s.location.start_column().is_none());
            let all_found = constrained.chain(line_only).all(|secondary| {
                let found = (0..actual.len()).find(|&i| !used[i] && secondary_matches(&secondary.location, &actual[i]));
                if let Some(i) = found {
                    used[i] = true;
                }
                found.is_some()
            });
            all_found && used.iter().all(|&u| u)
        };

        if !matched {
            let order = if issue.ordered_secondaries { " in this order" } else { "" };
            self.push(
                DiscrepancyKind::SecondaryMismatch,
                issue.line(),
                issue.location.start_column(),
                format!(
                    "expected secondary locations {}{}, actual {}",
                    render_list(expected.iter().map(|s| &s.location)),
                    order,
                    render_list(actual.iter())
                ),
            );
        }
    }

    /// Pair every actual flow with a listed flow going through the same lines,
    /// preferring one whose messages match, then compare the pairs step by step.
    fn compare_flows(&mut self, issue: &ExpectedIssue, ids: &[String], actual: &[Vec<ActualFlowStep>]) {
        let flows = self.flows;
        // Unknown ids are already reported as defects.
        let expected: Vec<&ExpectedFlow> = ids.iter().filter_map(|id| flows.get(id)).collect();
        let mut used = vec![false; expected.len()];
        let mut unexpected = Vec::new();

        for flow in actual {
            let lines = flow_lines(flow);
            let candidates: Vec<usize> = (0..expected.len())
                .filter(|&i| !used[i] && expected[i].lines() == lines)
                .collect();
            let pick = candidates
                .iter()
                .copied()
                .find(|&i| flow_messages_match(expected[i], flow))
                .or_else(|| candidates.first().copied());
            match pick {
                Some(i) => {
                    used[i] = true;
                    self.compare_flow(issue, expected[i], flow);
                }
                None => unexpected.push(lines),
            }
        }

        let missing: Vec<&ExpectedFlow> = expected
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(flow, _)| *flow)
            .collect();
        let (line, column) = (issue.line(), issue.location.start_column());
        match (missing.as_slice(), unexpected.as_slice()) {
            ([], []) => {}
            ([flow], [lines]) => self.push(
                DiscrepancyKind::FlowMismatch,
                line,
                column,
                format!("flow `{}` expected on lines {:?}, actual {:?}", flow.id, flow.lines(), lines),
            ),
            _ => {
                for flow in &missing {
                    self.push(
                        DiscrepancyKind::FlowMismatch,
                        line,
                        column,
                        format!("missing flow `{}` on lines {:?}", flow.id, flow.lines()),
                    );
                }
                for lines in &unexpected {
                    self.push(
                        DiscrepancyKind::FlowMismatch,
                        line,
                        column,
                        format!("unexpected flow on lines {:?}", lines),
                    );
                }
            }
        }
    }

    fn compare_flow(&mut self, issue: &ExpectedIssue, expected: &ExpectedFlow, actual: &[ActualFlowStep]) {
        let (line, column) = (issue.line(), issue.location.start_column());
        if !flow_messages_match(expected, actual) {
            let quote = |message: &Option<String>| message.as_ref().map_or("-".to_string(), |m| format!("\"{}\"", m));
            let wanted: Vec<String> = expected
                .steps
                .iter()
                .zip(actual)
                .map(|(step, actual)| step.message.as_ref().map_or_else(|| quote(&actual.message), |m| m.to_string()))
                .collect();
            let got: Vec<String> = actual.iter().map(|step| quote(&step.message)).collect();
            self.push(
                DiscrepancyKind::FlowMismatch,
                line,
                column,
                format!(
                    "wrong messages in flow `{}`: expected [{}], actual [{}]",
                    expected.id,
                    wanted.join(", "),
                    got.join(", ")
                ),
            );
        }
        for (n, (step, actual)) in expected.steps.iter().zip(actual).enumerate() {
            if location_differs(&step.location, &actual.location) {
                self.push(
                    DiscrepancyKind::FlowMismatch,
                    line,
                    column,
                    format!(
                        "step {} of flow `{}`: expected location {}, actual {}",
                        n + 1,
                        expected.id,
                        step.location,
                        actual.location
                    ),
                );
            }
        }
    }

    fn compare_quickfixes(&mut self, expected: &ExpectedIssue, actual: &ActualIssue) {
        let line = expected.line();
        let column = expected.location.start_column();

        if expected.no_quickfix_expected {
            if !actual.quickfixes.is_empty() {
                let offered: Vec<String> = actual
                    .quickfixes
                    .iter()
                    .map(|q| format!("\"{}\"", q.description))
                    .collect();
                self.push(
                    DiscrepancyKind::UnexpectedQuickfix,
                    line,
                    column,
                    format!("no quickfix expected, but the issue offers {}", offered.join(", ")),
                );
            }
            return;
        }
        if expected.quickfix_ids.is_empty() {
            return;
        }

        let mut claimed = vec![false; actual.quickfixes.len()];
        for quickfix in &expected.quickfixes {
            let found = (0..actual.quickfixes.len())
                .find(|&i| !claimed[i] && actual.quickfixes[i].description == quickfix.description);
            match found {
                Some(i) => {
                    claimed[i] = true;
                    if let Some(detail) = compare_edits(quickfix, &actual.quickfixes[i]) {
                        self.push(DiscrepancyKind::QuickfixMismatch, line, column, detail);
                    }
                }
                None => {
                    let offered: Vec<String> = actual
                        .quickfixes
                        .iter()
                        .map(|q| format!("\"{}\"", q.description))
                        .collect();
                    self.push(
                        DiscrepancyKind::QuickfixMismatch,
                        line,
                        column,
                        format!(
                            "quickfix `{}` (\"{}\") is not offered; offered: [{}]",
                            quickfix.id,
                            quickfix.description,
                            offered.join(", ")
                        ),
                    );
                }
            }
        }

        for (quickfix, _) in actual.quickfixes.iter().zip(claimed).filter(|(_, claimed)| !claimed) {
            self.verdict.warnings.push(Warning {
                kind: WarningKind::UnreferencedQuickfix,
                line,
                detail: format!("offered quickfix \"{}\" is not referenced", quickfix.description),
            });
        }
    }

    fn verify_quickfixes(&mut self, source: &SourceText, issues: &[ExpectedIssue], goldens: &BTreeMap<String, String>) {
        let mut verified = BTreeSet::new();
        for issue in issues {
            for quickfix in &issue.quickfixes {
                if !verified.insert((quickfix.id.as_str(), issue.line())) {
                    continue;
                }
                let golden = goldens.get(&quickfix.id).map(String::as_str);
                if let Err(error) = verify_quickfix(source, quickfix, golden) {
                    let kind = match error {
                        QuickfixError::ConflictingEdits { .. } => DiscrepancyKind::ConflictingEdit,
                        QuickfixError::EditOutOfBounds { .. } => DiscrepancyKind::EditOutOfBounds,
                        QuickfixError::TextMismatch { .. } => DiscrepancyKind::QuickfixTextMismatch,
                    };
                    self.push(kind, issue.line(), issue.location.start_column(), error.to_string());
                }
            }
        }
    }
}

/// First difference between an expected and an offered quickfix with the same description.
fn compare_edits(expected: &ExpectedQuickfix, actual: &ActualQuickfix) -> Option<String> {
    if expected.edits.len() != actual.edits.len() {
        return Some(format!(
            "quickfix `{}` expects {} edit(s), the offered one has {}",
            expected.id,
            expected.edits.len(),
            actual.edits.len()
        ));
    }
    expected
        .edits
        .iter()
        .zip(&actual.edits)
        .enumerate()
        .find_map(|(n, (e, a))| {
            if e.replacement != a.replacement {
                Some(format!(
                    "edit {} of quickfix `{}`: expected replacement \"{}\", actual \"{}\"",
                    n + 1,
                    expected.id,
                    e.replacement.escape_default(),
                    a.replacement.escape_default()
                ))
            } else if e.range != a.range {
                Some(format!(
                    "edit {} of quickfix `{}`: expected range {}, actual {}",
                    n + 1,
                    expected.id,
                    e.range,
                    a.range
                ))
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_issues, AnalyzerEdit, AnalyzerFlowStep, AnalyzerIssue, AnalyzerLocation};
    use expectkit_syntax::build_expectations;

    fn run(text: &str, issues: &[AnalyzerIssue]) -> FileVerdict {
        run_with(text, issues, &VerifierConfig::default())
    }

    fn run_with(text: &str, issues: &[AnalyzerIssue], config: &VerifierConfig) -> FileVerdict {
        let source = SourceText::new("A.java", text);
        let expectations = build_expectations(&source, config);
        let actual = normalize_issues(&source, issues).unwrap();
        reconcile(&source, config, &expectations, &actual, &BTreeMap::new())
    }

    fn run_expecting_file_issue(text: &str, issues: &[AnalyzerIssue], message: &str) -> FileVerdict {
        let config = VerifierConfig::default();
        let source = SourceText::new("A.java", text);
        let mut expectations = build_expectations(&source, &config);
        expectations.expect_file_issue(message, &config.fragment_marker);
        let actual = normalize_issues(&source, issues).unwrap();
        reconcile(&source, &config, &expectations, &actual, &BTreeMap::new())
    }

    fn kinds(verdict: &FileVerdict) -> Vec<DiscrepancyKind> {
        verdict.discrepancies.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn exact_match_passes() {
        let verdict = run(
            "value = bitMask & -1; // Noncompliant\n",
            &[AnalyzerIssue::new(AnalyzerLocation::line(1), "Remove this unnecessary bit operation.")],
        );
        assert!(verdict.passed(), "{}", verdict);
    }

    #[test]
    fn missing_and_unexpected_issues() {
        let verdict = run(
            "a(); // Noncompliant\nb();\n",
            &[AnalyzerIssue::new(AnalyzerLocation::line(2), "Nope")],
        );
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::MissingIssue, DiscrepancyKind::UnexpectedIssue]);
        assert_eq!(verdict.discrepancies[1].detail, "unexpected issue at 2: \"Nope\"");
    }

    #[test]
    fn columns_disambiguate_issues_on_one_line() {
        let text = "foo(a, b); // Noncompliant [[sc=8;ec=9]] {{Second}}\n// Noncompliant@-1 [[sc=5;ec=6]] {{First}}\n";
        let issues = [
            AnalyzerIssue::new(AnalyzerLocation::span(1, 5, 1, 6), "First"),
            AnalyzerIssue::new(AnalyzerLocation::span(1, 8, 1, 9), "Second"),
        ];
        assert!(run(text, &issues).passed());
        let reversed = [issues[1].clone(), issues[0].clone()];
        assert!(run(text, &reversed).passed());
    }

    #[test]
    fn location_and_message_mismatches() {
        let verdict = run(
            "foo(a, b); // Noncompliant [[sc=5;ec=6]] {{Remove...argument}}\n",
            &[AnalyzerIssue::new(AnalyzerLocation::span(1, 5, 1, 9), "Rename this")],
        );
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::LocationMismatch, DiscrepancyKind::MessageMismatch]);
        assert_eq!(verdict.discrepancies[0].detail, "expected location 1:5-1:6, actual 1:5-1:9");
        assert_eq!(
            verdict.discrepancies[1].detail,
            "expected message \"Remove...argument\", actual \"Rename this\""
        );
    }

    #[test]
    fn line_only_expectation_accepts_any_column() {
        let verdict = run(
            "foo(a, b); // Noncompliant\n",
            &[AnalyzerIssue::new(AnalyzerLocation::span(1, 5, 1, 9), "x")],
        );
        assert!(verdict.passed());
    }

    #[test]
    fn secondaries_are_unordered_unless_requested() {
        let text = "a();\nb();\nc(); // Noncompliant [[secondary=-1,+2]]\nd();\ne();\n";
        for order in [[2usize, 5], [5, 2]] {
            let issue = AnalyzerIssue::new(AnalyzerLocation::line(3), "x")
                .with_secondary(AnalyzerLocation::line(order[0]))
                .with_secondary(AnalyzerLocation::line(order[1]));
            assert!(run(text, &[issue]).passed());
        }

        let ordered = text.replace("+2]]", "+2;order]]");
        let issue = AnalyzerIssue::new(AnalyzerLocation::line(3), "x")
            .with_secondary(AnalyzerLocation::line(5))
            .with_secondary(AnalyzerLocation::line(2));
        let verdict = run(&ordered, &[issue]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::SecondaryMismatch]);
        assert_eq!(verdict.discrepancies[0].detail, "expected secondary locations [2, 5] in this order, actual [5, 2]");
    }

    #[test]
    fn secondaries_must_match_exactly_when_listed() {
        let text = "a();\nb(); // Noncompliant [[secondary=-1]]\n";
        let extra = AnalyzerIssue::new(AnalyzerLocation::line(2), "x")
            .with_secondary(AnalyzerLocation::line(1))
            .with_secondary(AnalyzerLocation::line(2));
        assert_eq!(kinds(&run(text, &[extra])), vec![DiscrepancyKind::SecondaryMismatch]);

        let unchecked = AnalyzerIssue::new(AnalyzerLocation::line(1), "x").with_secondary(AnalyzerLocation::line(2));
        assert!(run("a(); // Noncompliant\nb();\n", &[unchecked]).passed());
    }

    #[test]
    fn bang_rejects_any_offered_quickfix() {
        let issue = AnalyzerIssue::new(AnalyzerLocation::line(1), "x")
            .with_quickfix("Remove", vec![AnalyzerEdit::on_line(1, 1, 2, "")]);
        let verdict = run("a(); // Noncompliant [[quickfixes=!]]\n", &[issue]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::UnexpectedQuickfix]);
    }

    #[test]
    fn referenced_quickfix_is_compared_edit_by_edit() {
        let text = concat!(
            "    if (B) { // Noncompliant [[sc=9;ec=10;quickfixes=qf1]]\n",
            "    // fix@qf1 {{Add parentheses}}\n",
            "    // edit@qf1 [[sc=9;ec=9]] {{(}}\n",
            "    // edit@qf1 [[sc=10;ec=10]] {{)}}\n",
        );
        let offer = |close: usize| {
            AnalyzerIssue::new(AnalyzerLocation::span(1, 9, 1, 10), "x").with_quickfix(
                "Add parentheses",
                vec![AnalyzerEdit::on_line(1, 9, 9, "("), AnalyzerEdit::on_line(1, close, close, ")")],
            )
        };
        assert!(run(text, &[offer(10)]).passed());

        let verdict = run(text, &[offer(11)]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::QuickfixMismatch]);
        assert_eq!(
            verdict.discrepancies[0].detail,
            "edit 2 of quickfix `qf1`: expected range 1:10-1:10, actual 1:11-1:11"
        );

        let other = AnalyzerIssue::new(AnalyzerLocation::span(1, 9, 1, 10), "x")
            .with_quickfix("Invert", vec![AnalyzerEdit::on_line(1, 9, 10, "!B")]);
        let verdict = run(text, &[other]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::QuickfixMismatch]);
        assert_eq!(verdict.warnings.len(), 1);
        assert_eq!(verdict.warnings[0].detail, "offered quickfix \"Invert\" is not referenced");
    }

    #[test]
    fn unreferenced_quickfixes_only_warn() {
        let text = concat!(
            "f(); // Noncompliant [[quickfixes=qf1]]\n",
            "// fix@qf1 {{Remove}}\n",
            "// edit@qf1 [[sc=1;ec=5]] {{}}\n",
        );
        let issue = AnalyzerIssue::new(AnalyzerLocation::line(1), "x")
            .with_quickfix("Remove", vec![AnalyzerEdit::on_line(1, 1, 5, "")])
            .with_quickfix("Rename", vec![AnalyzerEdit::on_line(1, 1, 2, "g")]);
        let verdict = run(text, &[issue]);
        assert!(verdict.passed(), "{}", verdict);
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn conflicting_expected_edits_are_reported() {
        let text = concat!(
            "foo(bar); // Noncompliant [[quickfixes=qf1]]\n",
            "// fix@qf1 {{Rewrite}}\n",
            "// edit@qf1 [[sc=1;ec=6]] {{x}}\n",
            "// edit@qf1 [[sc=4;ec=8]] {{y}}\n",
        );
        let issue = AnalyzerIssue::new(AnalyzerLocation::line(1), "x").with_quickfix(
            "Rewrite",
            vec![AnalyzerEdit::on_line(1, 1, 6, "x"), AnalyzerEdit::on_line(1, 4, 8, "y")],
        );
        assert_eq!(kinds(&run(text, &[issue])), vec![DiscrepancyKind::ConflictingEdit]);
    }

    #[test]
    fn file_level_rules() {
        let verdict = run("int a;\n", &[]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::NoIssueRaised]);

        let relaxed = VerifierConfig { require_issues: false, ..Default::default() };
        assert!(run_with("int a;\n", &[], &relaxed).passed());

        let none = VerifierConfig { expect_no_issues: true, ..Default::default() };
        assert!(run_with("int a;\n", &[], &none).passed());
        let verdict = run_with(
            "int a; // Noncompliant\n",
            &[AnalyzerIssue::new(AnalyzerLocation::line(1), "x")],
            &none,
        );
        assert_eq!(
            kinds(&verdict),
            vec![DiscrepancyKind::UnexpectedAnnotation, DiscrepancyKind::UnexpectedIssue]
        );
    }

    #[test]
    fn build_defects_become_discrepancies() {
        let verdict = run(
            "a(); // Noncompliant [[quickfixes=nope]]\nb(); // Noncompliant [[bogus]]\n",
            &[AnalyzerIssue::new(AnalyzerLocation::line(1), "x")],
        );
        assert_eq!(
            kinds(&verdict),
            vec![DiscrepancyKind::UnresolvedQuickfixReference, DiscrepancyKind::MalformedAnnotation]
        );
        assert_eq!(verdict.discrepancies[1].detail, "malformed annotation: unknown attribute `bogus`");
    }

    #[test]
    fn column_constrained_secondaries() {
        let text = "a();\nb(); // Noncompliant [[secondary=+1:4]]\nc(); d();\n";
        let at = |column: usize| {
            AnalyzerIssue::new(AnalyzerLocation::line(2), "x")
                .with_secondary(AnalyzerLocation { column: Some(column), ..AnalyzerLocation::line(3) })
        };
        assert!(run(text, &[at(4)]).passed());

        let verdict = run(text, &[at(5)]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::SecondaryMismatch]);
        assert_eq!(verdict.discrepancies[0].detail, "expected secondary locations [3:4], actual [3:5]");
    }

    const NPE: &str = concat!(
        "Object a = null; // flow@npe {{a is null}}\n",
        "Object b = a; // flow@npe [[sc=12;ec=13]] {{b is a}}\n",
        "b.toString(); // Noncompliant [[flows=npe]] {{NPE}}\n",
    );

    fn npe(flows: Vec<Vec<AnalyzerFlowStep>>) -> AnalyzerIssue {
        flows
            .into_iter()
            .fold(AnalyzerIssue::new(AnalyzerLocation::line(3), "NPE"), AnalyzerIssue::with_flow)
    }

    fn step(location: AnalyzerLocation, message: &str) -> AnalyzerFlowStep {
        AnalyzerFlowStep::new(location, message)
    }

    #[test]
    fn flows_are_compared_line_by_line() {
        let reported = vec![
            step(AnalyzerLocation::span(2, 12, 2, 13), "b is a"),
            step(AnalyzerLocation::line(1), "a is null"),
        ];
        assert!(run(NPE, &[npe(vec![reported])]).passed());

        let verdict = run(NPE, &[npe(Vec::new())]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::FlowMismatch]);
        assert_eq!(verdict.discrepancies[0].detail, "missing flow `npe` on lines [2, 1]");

        let elsewhere = vec![step(AnalyzerLocation::line(3), "b is a"), step(AnalyzerLocation::line(1), "a is null")];
        let verdict = run(NPE, &[npe(vec![elsewhere])]);
        assert_eq!(verdict.discrepancies[0].detail, "flow `npe` expected on lines [2, 1], actual [3, 1]");
    }

    #[test]
    fn flow_messages_and_columns_are_checked() {
        let wrong_message = vec![
            step(AnalyzerLocation::span(2, 12, 2, 13), "b is copied"),
            step(AnalyzerLocation::line(1), "a is null"),
        ];
        let verdict = run(NPE, &[npe(vec![wrong_message])]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::FlowMismatch]);
        assert_eq!(
            verdict.discrepancies[0].detail,
            "wrong messages in flow `npe`: expected [\"b is a\", \"a is null\"], actual [\"b is copied\", \"a is null\"]"
        );

        let wrong_column = vec![
            step(AnalyzerLocation::span(2, 5, 2, 6), "b is a"),
            step(AnalyzerLocation::line(1), "a is null"),
        ];
        let verdict = run(NPE, &[npe(vec![wrong_column])]);
        assert_eq!(
            verdict.discrepancies[0].detail,
            "step 1 of flow `npe`: expected location 2:12-2:13, actual 2:5-2:6"
        );
    }

    #[test]
    fn flows_through_the_same_lines_are_told_apart_by_messages() {
        let text = "a(); // flow@f1 {{first}} flow@f2 {{second}}\nb(); // Noncompliant [[flows=f1,f2]]\n";
        let issue = AnalyzerIssue::new(AnalyzerLocation::line(2), "x")
            .with_flow(vec![step(AnalyzerLocation::line(1), "second")])
            .with_flow(vec![step(AnalyzerLocation::line(1), "first")]);
        assert!(run(text, &[issue]).passed());
    }

    #[test]
    fn flow_defects_are_discrepancies() {
        let verdict = run(
            "a(); // Noncompliant [[flows=nope]]\n",
            &[AnalyzerIssue::new(AnalyzerLocation::line(1), "x")],
        );
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::InvalidFlow]);
    }

    #[test]
    fn effort_to_fix_is_compared_with_the_cost() {
        let text = "a(); // Noncompliant [[effortToFix=2]]\n";
        let issue = AnalyzerIssue::new(AnalyzerLocation::line(1), "x");
        assert!(run(text, &[issue.clone().with_cost(2.0)]).passed());

        let verdict = run(text, &[issue.clone().with_cost(3.0)]);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::EffortMismatch]);
        assert_eq!(verdict.discrepancies[0].detail, "expected effort to fix 2, actual 3");

        let verdict = run(text, &[issue]);
        assert_eq!(verdict.discrepancies[0].detail, "expected effort to fix 2, actual none");
    }

    #[test]
    fn issue_expected_on_the_file() {
        let message = "Split this file";
        assert!(run_expecting_file_issue("int a;\n", &[AnalyzerIssue::on_file(message)], message).passed());

        let verdict = run_expecting_file_issue("int a;\n", &[], message);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::MissingIssue]);
        assert_eq!(verdict.discrepancies[0].line, None);
        assert_eq!(
            verdict.discrepancies[0].detail,
            "expected an issue on the file with message \"Split this file\", none was raised"
        );

        let on_a_line = [AnalyzerIssue::new(AnalyzerLocation::line(1), message)];
        let verdict = run_expecting_file_issue("int a;\n", &on_a_line, message);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::MissingIssue, DiscrepancyKind::UnexpectedIssue]);

        let verdict = run_expecting_file_issue("int a;\n", &[AnalyzerIssue::on_file("Rename")], message);
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::MessageMismatch]);
    }

    #[test]
    fn unexpected_file_issue() {
        let verdict = run(
            "a(); // Noncompliant\n",
            &[AnalyzerIssue::new(AnalyzerLocation::line(1), "x"), AnalyzerIssue::on_file("Split this file")],
        );
        assert_eq!(kinds(&verdict), vec![DiscrepancyKind::UnexpectedIssue]);
        assert_eq!(verdict.discrepancies[0].detail, "unexpected issue on the file: \"Split this file\"");
        assert_eq!(verdict.actual, 2);
    }
}
