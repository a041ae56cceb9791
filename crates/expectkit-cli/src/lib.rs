//! Command-line surface of the expectkit fixture verifier.
//!
//! `expectkit verify` checks annotated fixture files against an analyzer
//! report; `expectkit init` writes a default `expectkit.toml`.

pub mod commands;
pub mod error;
pub mod utils;

pub use error::CliError;
