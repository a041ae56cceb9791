//! Directive scanner
//!
//! Walks a fixture line by line and turns every comment directive into an
//! [`Annotation`]. The scanner holds nothing but a line cursor, so it can be
//! cloned to restart from the same point, and a malformed directive only costs
//! its own line.

use std::{collections::VecDeque, ops::Range};

use expectkit_source::{SourceText, VerifierConfig};
use miette::SourceSpan;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::{
    error::MalformedAnnotation,
    token::{Annotation, AttributeBlock, DirectiveKind, LineRef, QuickfixList, SecondaryRef},
};

/// Directive head, matched right after a comment prefix.
static DIRECTIVE_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:Noncompliant(?:@(?P<shift>[^\s\[{]*)|\b)|(?P<kind>fix|edit|flow)@(?P<id>[^\s\[{]*))",
    )
    .expect("directive head pattern is valid")
});

/// A flow step following another directive in the same comment.
static FLOW_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bflow@(?P<id>[^\s\[{]*)").expect("flow head pattern is valid"));

type ScanResult = Result<Annotation, MalformedAnnotation>;

/// Lazy iterator over the directives of one file.
#[derive(Debug, Clone)]
pub struct AnnotationScanner<'a> {
    source: &'a SourceText,
    prefixes: &'a [String],
    next_line: usize,
    /// Directives of the current line not handed out yet
    pending: VecDeque<ScanResult>,
}

impl<'a> AnnotationScanner<'a> {
    pub fn new(source: &'a SourceText, prefixes: &'a [String]) -> Self {
        Self { source, prefixes, next_line: 1, pending: VecDeque::new() }
    }

    pub fn with_config(source: &'a SourceText, config: &'a VerifierConfig) -> Self {
        Self::new(source, &config.comment_prefixes)
    }

    fn malformed(&self, line: usize, span: SourceSpan, reason: impl Into<String>) -> MalformedAnnotation {
        MalformedAnnotation {
            file: self.source.path().to_string(),
            line,
            reason: reason.into(),
            span,
        }
    }

    /// Every directive of one line: at most one head after a comment prefix,
    /// followed by any number of `flow@` steps.
    fn scan_line(&self, line: usize) -> Vec<ScanResult> {
        let text = match self.source.line_text(line) {
            Some(text) => text,
            None => return Vec::new(),
        };
        let line_offset = self.source.line_span(line).map_or(0, |span| span.offset());

        let heads = find_heads(text, self.prefixes);
        let first = match heads.first() {
            Some(first) => first,
            None => return Vec::new(),
        };

        let mut cuts: Vec<usize> = FLOW_HEAD
            .find_iter(&text[first.body_start..])
            .map(|m| first.body_start + m.start())
            .collect();
        cuts.push(text.len());

        let mut segments = vec![Segment {
            start: first.start,
            body: first.body_start..cuts[0],
            kind: first.kind,
        }];
        for window in cuts.windows(2) {
            let (start, end) = (window[0], window[1]);
            if let Some(captures) = FLOW_HEAD.captures(&text[start..end]) {
                let body_start = start + captures.get(0).map_or(0, |m| m.end());
                segments.push(Segment {
                    start,
                    body: body_start..end,
                    kind: HeadKind::Named { kind: "flow", id: captures.name("id").map_or("", |m| m.as_str()) },
                });
            }
        }

        let parsed: Vec<_> = segments
            .iter()
            .map(|segment| parse_directive(segment.kind, &text[segment.body.clone()]))
            .collect();
        let messages: Vec<Range<usize>> = segments
            .iter()
            .zip(&parsed)
            .filter_map(|(segment, result)| {
                let (_, _, message) = result.as_ref().ok()?;
                message.as_ref().map(|(range, _)| shift(range, segment.body.start))
            })
            .collect();
        let extra = heads[1..].iter().any(|head| {
            !head.kind.is_flow() && !messages.iter().any(|range| range.contains(&head.start))
        });

        segments
            .iter()
            .zip(parsed)
            .enumerate()
            .map(|(n, (segment, result))| {
                let length = text[segment.start..segment.body.end].trim_end().len();
                let span = SourceSpan::from((line_offset + segment.start, length));
                let result = if n == 0 && extra {
                    Err("more than one directive on a line".to_string())
                } else {
                    result
                };
                result
                    .map(|(kind, attributes, message)| Annotation {
                        line,
                        kind,
                        attributes,
                        text: message.map(|(_, text)| text),
                        span,
                    })
                    .map_err(|reason| self.malformed(line, span, reason))
            })
            .collect()
    }
}

impl Iterator for AnnotationScanner<'_> {
    type Item = ScanResult;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.pending.pop_front() {
                Some(Ok(annotation)) => {
                    log::debug!(
                        "{}:{}: {} directive",
                        self.source.path(),
                        annotation.line,
                        annotation.kind.name()
                    );
                    return Some(Ok(annotation));
                }
                Some(Err(malformed)) => {
                    log::warn!("Skipping directive: {}", malformed);
                    return Some(Err(malformed));
                }
                None => {}
            }
            if self.next_line > self.source.line_count() {
                return None;
            }
            let line = self.next_line;
            self.next_line += 1;
            let found = self.scan_line(line);
            self.pending.extend(found);
        }
    }
}

/// What a directive head names, before any validation.
#[derive(Debug, Clone, Copy)]
enum HeadKind<'t> {
    Noncompliant { shift: Option<&'t str> },
    /// `fix@`, `edit@` or `flow@` with the raw id
    Named { kind: &'t str, id: &'t str },
}

impl<'t> HeadKind<'t> {
    fn from_captures(captures: &Captures<'t>) -> Self {
        match captures.name("kind") {
            Some(kind) => HeadKind::Named {
                kind: kind.as_str(),
                id: captures.name("id").map_or("", |m| m.as_str()),
            },
            None => HeadKind::Noncompliant { shift: captures.name("shift").map(|m| m.as_str()) },
        }
    }

    fn is_flow(&self) -> bool {
        matches!(self, HeadKind::Named { kind: "flow", .. })
    }
}

/// Where a directive head was found on a line.
struct Head<'t> {
    /// Byte offset of the comment prefix
    start: usize,
    /// Byte offset of everything after the head
    body_start: usize,
    kind: HeadKind<'t>,
}

/// One directive of a line: its head and the text it owns.
struct Segment<'t> {
    start: usize,
    body: Range<usize>,
    kind: HeadKind<'t>,
}

/// Comment prefixes followed by a directive head.
///
/// Before the first head, prefixes inside double-quoted string literals are
/// skipped; after it the rest of the line is comment text.
fn find_heads<'t>(text: &'t str, prefixes: &[String]) -> Vec<Head<'t>> {
    let mut heads = Vec::new();
    let mut from = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if idx < from {
            continue;
        }
        if heads.is_empty() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            // `'"'` is a character literal, not the start of a string.
            if c == '"' && !(text[..idx].ends_with('\'') && text[idx + 1..].starts_with('\'')) {
                in_string = true;
                continue;
            }
        }
        let rest = &text[idx..];
        for prefix in prefixes {
            if !rest.starts_with(prefix.as_str()) {
                continue;
            }
            let after = idx + prefix.len();
            if let Some(captures) = DIRECTIVE_HEAD.captures(&text[after..]) {
                let body_start = after + captures.get(0).map_or(0, |m| m.end());
                heads.push(Head { start: idx, body_start, kind: HeadKind::from_captures(&captures) });
                from = body_start;
                break;
            }
        }
    }
    heads
}

fn shift(range: &Range<usize>, by: usize) -> Range<usize> {
    range.start + by..range.end + by
}

type Message = (Range<usize>, String);

fn parse_ids(key: &str, value: &str) -> Result<Vec<String>, String> {
    let ids: Vec<String> = value.split(',').map(|id| id.trim().to_string()).collect();
    if ids.iter().any(String::is_empty) {
        return Err(format!("`{}` expects a comma-separated list of ids", key));
    }
    Ok(ids)
}

/// Move a `message=` attribute into the message slot.
fn take_message_attribute(attributes: &mut AttributeBlock, message: &mut Option<Message>) -> Result<(), String> {
    if let Some(text) = attributes.message.take() {
        if message.is_some() {
            return Err("message given both as `message=` and as `{{...}}`".to_string());
        }
        *message = Some((0..0, text));
    }
    Ok(())
}

fn parse_directive(
    head: HeadKind<'_>,
    body: &str,
) -> Result<(DirectiveKind, AttributeBlock, Option<Message>), String> {
    let kind = match head {
        HeadKind::Named { kind: "flow", id } => DirectiveKind::Flow {
            ids: parse_ids("flow@", id).map_err(|_| "`flow@` needs one or more flow ids".to_string())?,
        },
        HeadKind::Named { kind, id } => {
            if id.is_empty() {
                return Err(format!("`{}@` needs a quickfix id", kind));
            }
            if kind == "fix" {
                DirectiveKind::Fix { id: id.to_string() }
            } else {
                DirectiveKind::Edit { id: id.to_string() }
            }
        }
        HeadKind::Noncompliant { shift } => {
            let shift = match shift {
                Some("") => return Err("missing line shift after `@`".to_string()),
                Some(shift) => Some(shift.parse::<LineRef>()?),
                None => None,
            };
            DirectiveKind::Noncompliant { shift }
        }
    };

    let (attributes, message) = split_body(body)?;
    let mut attributes = match attributes {
        Some(block) => parse_attributes(block)?,
        None => AttributeBlock::default(),
    };
    let mut message = message.map(|range| {
        let text = body[range.start + 2..range.end - 2].to_string();
        (range, text)
    });

    match &kind {
        DirectiveKind::Noncompliant { shift } => {
            if shift.is_some() && attributes.start_line.is_some() {
                return Err("`sl` cannot be combined with a line shift".to_string());
            }
            if attributes.step_order.is_some() {
                return Err("`order=N` numbers flow steps; use a bare `order` for secondaries".to_string());
            }
            take_message_attribute(&mut attributes, &mut message)?;
        }
        DirectiveKind::Fix { .. } => {
            if !attributes.is_empty() {
                return Err("`fix@` takes no attributes".to_string());
            }
            if message.is_none() {
                return Err("missing message for quick fix".to_string());
            }
        }
        DirectiveKind::Edit { .. } => {
            if attributes.secondary.is_some()
                || attributes.quickfixes.is_some()
                || attributes.flows.is_some()
                || attributes.effort_to_fix.is_some()
                || attributes.message.is_some()
                || attributes.ordered
                || attributes.step_order.is_some()
            {
                return Err("`edit@` only accepts sc, ec, sl and el".to_string());
            }
            if message.is_none() {
                return Err("quick fix edit should contain a replacement".to_string());
            }
        }
        DirectiveKind::Flow { .. } => {
            if attributes.start_line.is_some()
                || attributes.secondary.is_some()
                || attributes.quickfixes.is_some()
                || attributes.flows.is_some()
                || attributes.effort_to_fix.is_some()
                || attributes.ordered
            {
                return Err("`flow@` only accepts sc, ec, el, order=N and message".to_string());
            }
            take_message_attribute(&mut attributes, &mut message)?;
        }
    }
    Ok((kind, attributes, message))
}

/// Locate the attribute block and the message block of a directive body.
///
/// The message runs from the first `{{` to the last `}}`; the attribute block
/// is looked up outside of it.
fn split_body(body: &str) -> Result<(Option<&str>, Option<Range<usize>>), String> {
    let message = match (body.find("{{"), body.rfind("}}")) {
        (Some(open), Some(close)) if close >= open + 2 => Some(open..close + 2),
        (None, None) => None,
        _ => return Err("unbalanced `{{ }}`".to_string()),
    };
    let outside: Vec<&str> = match &message {
        Some(range) => vec![&body[..range.start], &body[range.end..]],
        None => vec![body],
    };

    let mut block = None;
    for part in outside {
        let mut rest = part;
        while let Some(open) = rest.find("[[") {
            let close = rest[open..]
                .find("]]")
                .ok_or_else(|| "unbalanced `[[ ]]`".to_string())?;
            if block.is_some() {
                return Err("more than one attribute block".to_string());
            }
            block = Some(&rest[open + 2..open + close]);
            rest = &rest[open + close + 2..];
        }
        if rest.contains("]]") {
            return Err("unbalanced `[[ ]]`".to_string());
        }
    }
    Ok((block, message))
}

fn parse_column(key: &str, value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(format!("`{}` is 1-based, got 0", key)),
        Ok(column) => Ok(column),
        Err(_) => Err(format!("`{}` expects a column number, got `{}`", key, value.trim())),
    }
}

fn parse_secondary(value: &str) -> Result<Vec<SecondaryRef>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((line, column)) => Ok(SecondaryRef {
                line: line.parse()?,
                column: Some(parse_column("secondary", column)?),
            }),
            None => Ok(SecondaryRef { line: entry.parse()?, column: None }),
        })
        .collect()
}

fn parse_quickfixes(value: &str) -> Result<QuickfixList, String> {
    let ids: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    match ids.as_slice() {
        [] => Err("`quickfixes` needs at least one id, or `!`".to_string()),
        [only] if only == "!" => Ok(QuickfixList::NoneExpected),
        _ if ids.iter().any(|id| id == "!") => {
            Err("`!` cannot be combined with quickfix ids".to_string())
        }
        _ => Ok(QuickfixList::Ids(ids)),
    }
}

/// Parse the inside of a `[[...]]` block.
pub fn parse_attributes(block: &str) -> Result<AttributeBlock, String> {
    let mut attributes = AttributeBlock::default();
    let mut seen: Vec<&'static str> = Vec::new();

    for pair in block.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key.trim(), Some(value)),
            None => (pair, None),
        };
        let canonical = match key {
            "sc" | "startColumn" => "sc",
            "ec" | "endColumn" => "ec",
            "sl" | "startLine" => "sl",
            "el" | "endLine" => "el",
            "secondary" => "secondary",
            "quickfixes" => "quickfixes",
            "flows" => "flows",
            "effortToFix" => "effortToFix",
            "message" => "message",
            "order" => "order",
            other => return Err(format!("unknown attribute `{}`", other)),
        };
        if seen.contains(&canonical) {
            return Err(format!("duplicate attribute `{}`", canonical));
        }
        seen.push(canonical);

        if canonical == "order" {
            match value.map(str::trim) {
                None | Some("true") => attributes.ordered = true,
                Some("false") => attributes.ordered = false,
                Some(other) => {
                    let step = other.parse::<usize>().map_err(|_| {
                        format!("`order` expects true, false or a step number, got `{}`", other)
                    })?;
                    attributes.step_order = Some(step);
                }
            }
            continue;
        }
        let value = value.ok_or_else(|| format!("attribute `{}` needs a value", canonical))?;
        match canonical {
            "sc" => attributes.start_column = Some(parse_column(canonical, value)?),
            "ec" => attributes.end_column = Some(parse_column(canonical, value)?),
            "sl" => attributes.start_line = Some(value.parse()?),
            "el" => {
                let end_line: LineRef = value.parse()?;
                if end_line.is_negative() {
                    return Err("`el` cannot be a negative offset".to_string());
                }
                attributes.end_line = Some(end_line);
            }
            "secondary" => attributes.secondary = Some(parse_secondary(value)?),
            "quickfixes" => attributes.quickfixes = Some(parse_quickfixes(value)?),
            "flows" => attributes.flows = Some(parse_ids(canonical, value)?),
            "effortToFix" => {
                let effort = value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|effort| effort.is_finite() && *effort >= 0.0)
                    .ok_or_else(|| format!("`effortToFix` expects a number, got `{}`", value.trim()))?;
                attributes.effort_to_fix = Some(effort);
            }
            _ => attributes.message = Some(value.trim().to_string()),
        }
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Vec<Result<Annotation, MalformedAnnotation>> {
        let source = SourceText::new("Sample.java", text);
        let prefixes = vec!["//".to_string()];
        AnnotationScanner::new(&source, &prefixes).collect()
    }

    fn only(text: &str) -> Annotation {
        let mut results = scan(text);
        assert_eq!(results.len(), 1, "{:?}", results);
        results.remove(0).unwrap()
    }

    fn reason(text: &str) -> String {
        let mut results = scan(text);
        assert_eq!(results.len(), 1, "{:?}", results);
        results.remove(0).unwrap_err().reason
    }

    #[test]
    fn bare_noncompliant() {
        let annotation = only("value = bitMask & -1; // Noncompliant\n");
        assert_eq!(annotation.line, 1);
        assert_eq!(annotation.kind, DirectiveKind::Noncompliant { shift: None });
        assert!(annotation.attributes.is_empty());
        assert_eq!(annotation.text, None);
        assert_eq!(annotation.span, SourceSpan::from((22, 15)));
    }

    #[test]
    fn shift_attributes_and_message() {
        let annotation = only("a();\nb(); // Noncompliant@+1 [[sc=3;ec=7;secondary=-1,+2:4]] {{Use [[this]] instead}}\n");
        assert_eq!(annotation.line, 2);
        assert_eq!(annotation.kind, DirectiveKind::Noncompliant { shift: Some(LineRef::Relative(1)) });
        assert_eq!(annotation.attributes.start_column, Some(3));
        assert_eq!(annotation.attributes.end_column, Some(7));
        assert_eq!(
            annotation.attributes.secondary,
            Some(vec![
                SecondaryRef { line: LineRef::Relative(-1), column: None },
                SecondaryRef { line: LineRef::Relative(2), column: Some(4) },
            ])
        );
        assert_eq!(annotation.text.as_deref(), Some("Use [[this]] instead"));
    }

    #[test]
    fn message_before_attributes_and_long_keys() {
        let annotation = only("x(); // Noncompliant {{Fix {it}}} [[startColumn=1;endLine=+1;order]]");
        assert_eq!(annotation.text.as_deref(), Some("Fix {it}"));
        assert_eq!(annotation.attributes.start_column, Some(1));
        assert_eq!(annotation.attributes.end_line, Some(LineRef::Relative(1)));
        assert!(annotation.attributes.ordered);
    }

    #[test]
    fn message_attribute_is_an_alternative_to_braces() {
        let annotation = only("x(); // Noncompliant [[message=Remove it]]");
        assert_eq!(annotation.text.as_deref(), Some("Remove it"));
        assert_eq!(annotation.attributes.message, None);
        assert!(reason("x(); // Noncompliant [[message=a]] {{b}}").contains("both"));
    }

    #[test]
    fn fix_and_edit_directives() {
        let results = scan("if (B) {\n// fix@qf1 {{Add parentheses}}\n// edit@qf1 [[sc=9;ec=9]] {{(}}\n");
        let kinds: Vec<_> = results.iter().map(|r| r.as_ref().unwrap().kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                DirectiveKind::Fix { id: "qf1".to_string() },
                DirectiveKind::Edit { id: "qf1".to_string() },
            ]
        );
        let edit = results[1].as_ref().unwrap();
        assert_eq!(edit.text.as_deref(), Some("("));
        assert_eq!(edit.attributes.start_column, Some(9));
    }

    #[test]
    fn quickfix_lists() {
        let annotation = only("f(); // Noncompliant [[quickfixes=qf1, qf2]]");
        assert_eq!(
            annotation.attributes.quickfixes,
            Some(QuickfixList::Ids(vec!["qf1".to_string(), "qf2".to_string()]))
        );
        let annotation = only("f(); // Noncompliant [[quickfixes=!]]");
        assert_eq!(annotation.attributes.quickfixes, Some(QuickfixList::NoneExpected));
        assert!(reason("f(); // Noncompliant [[quickfixes=!,qf1]]").contains("`!`"));
    }

    #[test]
    fn ignores_words_that_only_start_like_a_directive() {
        assert!(scan("// NoncompliantCode is fine\n// Compliant\n").is_empty());
    }

    #[test]
    fn accepts_triple_slash_and_other_prefixes() {
        assert_eq!(scan("/// Noncompliant").len(), 1);
        let source = SourceText::new("a.py", "x = 1 # Noncompliant\ny = 2 // Noncompliant\n");
        let prefixes = vec!["#".to_string()];
        let found: Vec<_> = AnnotationScanner::new(&source, &prefixes).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].as_ref().unwrap().line, 1);
    }

    #[test]
    fn malformed_directives_are_reported_and_skipped() {
        let results = scan(concat!(
            "a(); // Noncompliant [[sc=x]]\n",
            "b(); // Noncompliant [[bogus=1]]\n",
            "c(); // Noncompliant [[sc=1\n",
            "d(); // Noncompliant {{unclosed\n",
            "e(); // Noncompliant\n",
        ));
        assert_eq!(results.len(), 5);
        let lines: Vec<usize> = results.iter().filter_map(|r| r.as_ref().err()).map(|m| m.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
        assert!(results[4].is_ok());
        assert_eq!(results[0].as_ref().unwrap_err().file, "Sample.java");
    }

    #[test]
    fn rejects_conflicting_or_repeated_attributes() {
        assert!(reason("a(); // Noncompliant@+1 [[sl=3]]").contains("`sl`"));
        assert!(reason("a(); // Noncompliant [[sc=1;startColumn=2]]").contains("duplicate"));
        assert!(reason("a(); // Noncompliant [[el=-1]]").contains("negative"));
        assert!(reason("a(); // Noncompliant [[sc=0]]").contains("1-based"));
        assert!(reason("a(); // Noncompliant@").contains("shift"));
        assert!(reason("a(); // Noncompliant // Noncompliant").contains("more than one"));
        assert!(reason("// fix@qf1").contains("message"));
        assert!(reason("// edit@qf1 [[sc=1;ec=2]]").contains("replacement"));
        assert!(reason("// edit@qf1 [[sc=1;ec=2;quickfixes=a]] {{x}}").contains("only accepts"));
    }

    #[test]
    fn directives_inside_a_message_do_not_count() {
        let annotation = only("a(); // Noncompliant {{Remove this // Noncompliant comment}}");
        assert_eq!(annotation.text.as_deref(), Some("Remove this // Noncompliant comment"));
    }

    #[test]
    fn prefixes_inside_string_literals_are_code() {
        let annotation = only("s = \"// Noncompliant\"; // Noncompliant\n");
        assert_eq!(annotation.span, SourceSpan::from((23, 15)));
        assert!(scan("s = \"a \\\" // Noncompliant\";\n").is_empty());
        assert_eq!(only("c = '\"'; // Noncompliant {{x}}\n").text.as_deref(), Some("x"));
    }

    #[test]
    fn flow_steps_follow_other_directives() {
        let results = scan(concat!(
            "a(); // Noncompliant [[flows=f1]] {{Bad}} flow@f1 {{here}}\n",
            "b(); // flow@f1,f2 [[order=2;sc=3]] {{there}} flow@f2\n",
        ));
        let annotations: Vec<Annotation> = results.into_iter().map(Result::unwrap).collect();
        let kinds: Vec<_> = annotations.iter().map(|a| (a.line, a.kind.clone())).collect();
        assert_eq!(
            kinds,
            vec![
                (1, DirectiveKind::Noncompliant { shift: None }),
                (1, DirectiveKind::Flow { ids: vec!["f1".to_string()] }),
                (2, DirectiveKind::Flow { ids: vec!["f1".to_string(), "f2".to_string()] }),
                (2, DirectiveKind::Flow { ids: vec!["f2".to_string()] }),
            ]
        );
        assert_eq!(annotations[0].text.as_deref(), Some("Bad"));
        assert_eq!(annotations[0].attributes.flows, Some(vec!["f1".to_string()]));
        assert_eq!(annotations[1].text.as_deref(), Some("here"));
        assert_eq!(annotations[2].attributes.step_order, Some(2));
        assert_eq!(annotations[2].attributes.start_column, Some(3));
        assert_eq!(annotations[3].text, None);
    }

    #[test]
    fn a_bad_flow_step_does_not_hide_its_neighbours() {
        let results = scan("a(); // Noncompliant {{x}} flow@ {{y}} flow@f2 [[sl=1]] flow@f3\n");
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(results[1].as_ref().unwrap_err().reason.contains("flow id"));
        assert!(results[2].as_ref().unwrap_err().reason.contains("only accepts"));
        assert!(results[3].is_ok());
    }

    #[test]
    fn effort_and_step_order_attributes() {
        let annotation = only("f(); // Noncompliant [[effortToFix=2.5]]");
        assert_eq!(annotation.attributes.effort_to_fix, Some(2.5));
        assert!(reason("f(); // Noncompliant [[effortToFix=soon]]").contains("number"));
        assert!(reason("f(); // Noncompliant [[order=2]]").contains("flow steps"));
        assert!(reason("f(); // Noncompliant [[order=later]]").contains("step number"));
        assert!(reason("f(); // Noncompliant [[flows=a,,b]]").contains("list of ids"));
        assert!(reason("// flow@a [[order]]").contains("only accepts"));
    }

    #[test]
    fn scanner_restarts_when_cloned() {
        let source = SourceText::new("A.java", "a(); // Noncompliant\nb(); // Noncompliant\n");
        let prefixes = vec!["//".to_string()];
        let mut scanner = AnnotationScanner::new(&source, &prefixes);
        let again = scanner.clone();
        assert_eq!(scanner.next().unwrap().unwrap().line, 1);
        assert_eq!(again.count(), 2);
        assert_eq!(scanner.count(), 1);
    }
}
