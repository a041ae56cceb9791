use std::path::PathBuf;
use thiserror::Error;
use miette::Diagnostic;

/// Errors raised while reading source text or addressing positions in it
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    /// The source file could not be read
    #[error("Failed to read source file {path}")]
    #[diagnostic(
        code("SOURCE-001"),
        help("Make sure the path exists and has proper permissions")
    )]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line number outside the file
    #[error("Line {line} is outside the file ({line_count} lines)")]
    #[diagnostic(code("SOURCE-002"))]
    LineOutOfBounds { line: usize, line_count: usize },

    /// A column past the end of its line
    #[error("Column {column} is outside line {line} ({line_length} characters)")]
    #[diagnostic(
        code("SOURCE-003"),
        help("Columns are 1-based; the last valid column is one past the final character")
    )]
    ColumnOutOfBounds {
        line: usize,
        column: usize,
        line_length: usize,
    },

    /// A span whose end precedes its start
    #[error("Span ends at {end} before it starts at {start}")]
    #[diagnostic(code("SOURCE-004"))]
    InvertedSpan { start: String, end: String },
}

/// Errors that can occur when loading the verifier configuration
#[derive(Debug, Error, Diagnostic, Clone)]
pub enum ConfigError {
    /// The configuration file does not exist
    #[error("Configuration file not found: {0}")]
    #[diagnostic(
        code("CONFIG-001"),
        help("Create one with `expectkit init` or pass --config")
    )]
    ConfigNotFound(PathBuf),

    /// Error reading the configuration file
    #[error("Error reading configuration: {0}")]
    #[diagnostic(
        code("CONFIG-002"),
        help("Check file permissions and ensure the file is not corrupted")
    )]
    ConfigReadError(String),

    /// Error parsing the configuration
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code("CONFIG-003"),
        help("Check your expectkit.toml syntax")
    )]
    ConfigParseError(String),

    /// A value that parses but cannot be used
    #[error("Invalid configuration value for `{key}`: {reason}")]
    #[diagnostic(code("CONFIG-004"))]
    InvalidValue { key: &'static str, reason: String },
}

// Conversion from io::Error to ConfigError
impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::ConfigReadError(err.to_string())
    }
}

// Conversion from toml::de::Error to ConfigError
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ConfigParseError(err.to_string())
    }
}
