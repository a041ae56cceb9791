//! Edit application in original-text coordinates.
//!
//! Every edit of a quickfix addresses the untouched source. Edits are checked
//! for conflicts, then spliced from the highest offset down so that no edit
//! shifts the text another one points into. The declared order of the edits
//! therefore never changes the result.

use expectkit_source::{position_in, EditOperation, SourceText};
use expectkit_syntax::ExpectedQuickfix;

use crate::error::QuickfixError;

struct Splice<'e> {
    start: usize,
    end: usize,
    edit: &'e EditOperation,
}

/// Resolve every edit to byte offsets and sort them by position.
fn splices<'e>(
    source: &SourceText,
    id: &str,
    edits: &'e [EditOperation],
) -> Result<Vec<Splice<'e>>, QuickfixError> {
    let mut splices = edits
        .iter()
        .map(|edit| {
            source
                .range_offsets(&edit.range)
                .map(|(start, end)| Splice { start, end, edit })
                .map_err(|e| QuickfixError::EditOutOfBounds {
                    id: id.to_string(),
                    range: edit.range,
                    reason: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    splices.sort_by_key(|splice| (splice.start, splice.end));
    Ok(splices)
}

/// Reject edits that overlap, and insertions at the same offset.
///
/// Splices are sorted by start, so any overlap shows up between neighbours.
/// An insertion sorts before a replacement starting where it inserts, and is
/// applied in front of the replaced text.
fn check_conflicts(id: &str, splices: &[Splice<'_>]) -> Result<(), QuickfixError> {
    for pair in splices.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        let same_point = first.start == first.end
            && second.start == second.end
            && first.start == second.start;
        if second.start < first.end || same_point {
            return Err(QuickfixError::ConflictingEdits {
                id: id.to_string(),
                first: first.edit.range,
                second: second.edit.range,
            });
        }
    }
    Ok(())
}

/// Apply the edits of a quickfix to the original text.
pub fn apply_edits(source: &SourceText, id: &str, edits: &[EditOperation]) -> Result<String, QuickfixError> {
    let splices = splices(source, id, edits)?;
    check_conflicts(id, &splices)?;

    let mut text = source.contents().to_string();
    for splice in splices.iter().rev() {
        text.replace_range(splice.start..splice.end, &splice.edit.replacement);
    }
    Ok(text)
}

/// Compare an edited text with its golden version.
///
/// A mismatch reports the first differing position and the rest of that line
/// on both sides.
pub fn compare_with_golden(id: &str, actual: &str, golden: &str) -> Result<(), QuickfixError> {
    if actual == golden {
        return Ok(());
    }
    let offset = actual
        .char_indices()
        .zip(golden.chars())
        .find(|((_, a), g)| a != g)
        .map_or_else(|| actual.len().min(golden.len()), |((idx, _), _)| idx);
    let (line, column) = position_in(golden, offset);
    let rest_of_line = |text: &str| {
        let rest = text.get(offset..).unwrap_or_default();
        rest.lines().next().unwrap_or_default().to_string()
    };
    Err(QuickfixError::TextMismatch {
        id: id.to_string(),
        line,
        column,
        expected: rest_of_line(golden),
        actual: rest_of_line(actual),
    })
}

/// Apply a resolved quickfix and, when a golden text is given, compare with it.
///
/// Returns the edited text.
pub fn verify_quickfix(
    source: &SourceText,
    quickfix: &ExpectedQuickfix,
    golden: Option<&str>,
) -> Result<String, QuickfixError> {
    let text = apply_edits(source, &quickfix.id, &quickfix.edits)?;
    if let Some(golden) = golden {
        compare_with_golden(&quickfix.id, &text, golden)?;
    }
    log::debug!("Quickfix `{}` applies cleanly to {}", quickfix.id, source.path());
    Ok(text)
}
