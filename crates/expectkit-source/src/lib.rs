//! Source text and position model for the expectkit fixture verifier.
//!
//! This crate is responsible for:
//! - Holding the immutable text of a fixture file and its line index
//! - Converting 1-based `(line, column)` positions to byte offsets
//! - The position types shared by expectations and analyzer output
//! - Loading the verifier configuration (`expectkit.toml`)
//! - Bundling diagnostics with source text for miette rendering

mod config;
mod diagnostic;
mod edit;
mod error;
mod file;
mod position;

pub use config::{VerifierConfig, CONFIG_FILE_NAME};
pub use diagnostic::{ExpectError, Report};
pub use edit::EditOperation;
pub use error::{ConfigError, SourceError};
pub use file::{SourceText, position_in};
pub use position::{Location, Position, TextRange};
