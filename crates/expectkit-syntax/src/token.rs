use std::{fmt, str::FromStr};

use miette::SourceSpan;
use serde::{Deserialize, Serialize};

/// A line number written in a directive.
///
/// `+N` and `-N` are relative to some anchor line; a bare `N` is absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineRef {
    Absolute(usize),
    Relative(isize),
}

impl LineRef {
    /// Resolve against an anchor line. `None` when the result falls before
    /// line 1 or does not fit a line number.
    pub fn resolve(self, anchor: usize) -> Option<usize> {
        match self {
            LineRef::Absolute(line) => (line >= 1).then_some(line),
            LineRef::Relative(delta) => isize::try_from(anchor)
                .ok()?
                .checked_add(delta)
                .filter(|line| *line >= 1)
                .map(|line| line as usize),
        }
    }

    pub fn is_negative(self) -> bool {
        matches!(self, LineRef::Relative(delta) if delta < 0)
    }
}

impl FromStr for LineRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("`{}` is not a line number", s);
        if let Some(rest) = s.strip_prefix('+') {
            rest.parse::<isize>()
                .ok()
                .filter(|_| !rest.starts_with(&['+', '-'][..]))
                .map(LineRef::Relative)
                .ok_or_else(invalid)
        } else if s.starts_with('-') {
            s.parse::<isize>().map(LineRef::Relative).map_err(|_| invalid())
        } else {
            s.parse::<usize>().map(LineRef::Absolute).map_err(|_| invalid())
        }
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRef::Absolute(line) => write!(f, "{}", line),
            LineRef::Relative(delta) if *delta >= 0 => write!(f, "+{}", delta),
            LineRef::Relative(delta) => write!(f, "{}", delta),
        }
    }
}

/// One entry of a `secondary=` list: `line[:column]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryRef {
    pub line: LineRef,
    pub column: Option<usize>,
}

/// Value of the `quickfixes=` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuickfixList {
    /// `quickfixes=!`: the issue must not offer any quickfix
    NoneExpected,
    /// Identifiers of `fix@id` blocks, in the order written
    Ids(Vec<String>),
}

/// Parsed contents of a `[[...]]` block.
///
/// Short and long spellings of a key (`sc` and `startColumn`) fill the same
/// field; every field is `None` when the block is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeBlock {
    pub start_column: Option<usize>,
    pub end_column: Option<usize>,
    pub start_line: Option<LineRef>,
    pub end_line: Option<LineRef>,
    pub secondary: Option<Vec<SecondaryRef>>,
    pub quickfixes: Option<QuickfixList>,
    /// Ids from `flows=`, in the order written
    pub flows: Option<Vec<String>>,
    /// `effortToFix=`
    pub effort_to_fix: Option<f64>,
    pub message: Option<String>,
    /// Bare `order`, `order=true` or `order=false`
    pub ordered: bool,
    /// `order=N` on a flow step
    pub step_order: Option<usize>,
}

impl AttributeBlock {
    pub fn is_empty(&self) -> bool {
        *self == AttributeBlock::default()
    }
}

/// The kind of directive an annotation carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectiveKind {
    /// `Noncompliant`, optionally shifted with `@N`
    Noncompliant { shift: Option<LineRef> },
    /// `fix@id {{description}}`
    Fix { id: String },
    /// `edit@id [[...]] {{replacement}}`
    Edit { id: String },
    /// `flow@id1,id2 [[...]] {{message}}`: one step shared by the listed flows
    Flow { ids: Vec<String> },
}

impl DirectiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            DirectiveKind::Noncompliant { .. } => "Noncompliant",
            DirectiveKind::Fix { .. } => "fix",
            DirectiveKind::Edit { .. } => "edit",
            DirectiveKind::Flow { .. } => "flow",
        }
    }
}

/// One directive found in a comment, before any line arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Line the comment is written on (the anchor line)
    pub line: usize,
    pub kind: DirectiveKind,
    pub attributes: AttributeBlock,
    /// Text between the first `{{` and the last `}}`, verbatim
    pub text: Option<String>,
    /// Byte span of the directive in the file
    pub span: SourceSpan,
}
