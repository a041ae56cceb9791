use std::path::PathBuf;

use expectkit_source::{ConfigError, SourceError};
use miette::Diagnostic;
use thiserror::Error;

/// CLI-specific error type that provides rich diagnostics
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Failed {operation} {path}")]
    #[diagnostic(code(expectkit::cli::io_error))]
    IoError {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to parse analyzer report {path}")]
    #[diagnostic(
        code(expectkit::cli::report_parse_error),
        help("The report is a JSON object with a `files` array; each entry has a `path` and its `issues`")
    )]
    ReportParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} already exists")]
    #[diagnostic(
        code(expectkit::cli::already_initialized),
        help("Edit the existing file, or remove it and run `expectkit init` again")
    )]
    AlreadyInitialized { path: PathBuf },

    #[error("Verification failed: {discrepancies} discrepancy(ies) in {failed} of {total} file(s)")]
    #[diagnostic(code(expectkit::cli::verification_failed))]
    VerificationFailed {
        discrepancies: usize,
        failed: usize,
        total: usize,
    },

    #[error("Internal error: {0}")]
    #[diagnostic(code(expectkit::cli::internal_error))]
    InternalError(String),
}

/// Convert IO errors with context
pub fn convert_io_error(error: std::io::Error, path: PathBuf, operation: &str) -> CliError {
    CliError::IoError {
        path,
        operation: operation.to_string(),
        source: error,
    }
}
