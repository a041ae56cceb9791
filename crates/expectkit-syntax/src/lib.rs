//! Annotation grammar for expectkit fixtures.
//!
//! Fixture files carry their own expectations in line comments:
//!
//! ```text
//! if (B) { // Noncompliant [[sc=9;ec=10;quickfixes=qf1]] {{Add parentheses}}
//! // fix@qf1 {{Add parentheses}}
//! // edit@qf1 [[sc=9;ec=9]] {{(}}
//! // edit@qf1 [[sc=10;ec=10]] {{)}}
//! ```
//!
//! Issues may also list the flows they report, each step declared where it
//! happens with `// flow@id {{message}}`.
//!
//! [`AnnotationScanner`] turns those comments into [`Annotation`] tokens, and
//! [`ExpectationBuilder`] resolves the tokens into [`Expectations`]: expected
//! issues with absolute positions, their quickfixes and their flows.

mod builder;
mod error;
mod message;
mod model;
mod scanner;
mod token;

pub use builder::{build_expectations, ExpectationBuilder};
pub use error::{BuildError, MalformedAnnotation};
pub use message::MessagePattern;
pub use model::{
    EditDirective, ExpectedFlow, ExpectedIssue, ExpectedQuickfix, Expectations, FlowStep, Quickfix,
    SecondaryLocation,
};
pub use scanner::{parse_attributes, AnnotationScanner};
pub use token::{Annotation, AttributeBlock, DirectiveKind, LineRef, QuickfixList, SecondaryRef};
