use std::fmt;

use serde::{Deserialize, Serialize};

/// An expected issue message.
///
/// Text without the fragment marker must match exactly. Text containing the
/// marker is split on it, and the pieces must occur in the actual message in
/// order; a piece is anchored to the start (or end) unless the marker opens
/// (or closes) the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessagePattern {
    Exact(String),
    Fragments {
        text: String,
        pieces: Vec<String>,
        anchored_start: bool,
        anchored_end: bool,
    },
}

impl MessagePattern {
    pub fn parse(text: &str, marker: &str) -> Self {
        if marker.is_empty() || !text.contains(marker) {
            return MessagePattern::Exact(text.to_string());
        }
        MessagePattern::Fragments {
            text: text.to_string(),
            pieces: text
                .split(marker)
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect(),
            anchored_start: !text.starts_with(marker),
            anchored_end: !text.ends_with(marker),
        }
    }

    /// The expected text as written.
    pub fn text(&self) -> &str {
        match self {
            MessagePattern::Exact(text) | MessagePattern::Fragments { text, .. } => text,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, MessagePattern::Fragments { .. })
    }

    pub fn matches(&self, actual: &str) -> bool {
        let (pieces, anchored_start, anchored_end) = match self {
            MessagePattern::Exact(text) => return text == actual,
            MessagePattern::Fragments { pieces, anchored_start, anchored_end, .. } => {
                (pieces.as_slice(), *anchored_start, *anchored_end)
            }
        };

        let mut rest = actual;
        let mut pieces = pieces;
        if anchored_start {
            if let Some((first, others)) = pieces.split_first() {
                match rest.strip_prefix(first.as_str()) {
                    Some(after) => rest = after,
                    None => return false,
                }
                pieces = others;
            }
        }
        let mut tail = None;
        if anchored_end {
            if let Some((last, init)) = pieces.split_last() {
                tail = Some(last);
                pieces = init;
            }
        }
        for piece in pieces {
            match rest.find(piece.as_str()) {
                Some(idx) => rest = &rest[idx + piece.len()..],
                None => return false,
            }
        }
        tail.map_or(true, |last| rest.ends_with(last.as_str()))
    }
}

impl fmt::Display for MessagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.text())
    }
}
