use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Name of the configuration file looked up by the command line.
pub const CONFIG_FILE_NAME: &str = "expectkit.toml";

/// Settings for one verification run.
///
/// Every field has a default, so an empty `expectkit.toml` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Verify quickfix annotations and offered quickfixes
    pub with_quickfixes: bool,

    /// The files under test must not produce any issue
    pub expect_no_issues: bool,

    /// Report a file that neither expects nor raises any issue
    pub require_issues: bool,

    /// Line-comment openers that may carry directives
    pub comment_prefixes: Vec<String>,

    /// Marker separating fragments of a partial expected message
    pub fragment_marker: String,

    /// Worker threads for multi-file verification (defaults to the CPU count)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Suffix of golden post-edit files: `<file>.<quickfix id>.<suffix>`
    pub golden_suffix: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            with_quickfixes: true,
            expect_no_issues: false,
            require_issues: true,
            comment_prefixes: vec!["//".to_string()],
            fragment_marker: "...".to_string(),
            workers: None,
            golden_suffix: "fixed".to_string(),
        }
    }
}

impl VerifierConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: VerifierConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a file, or from `expectkit.toml` inside a directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = if path.is_dir() { path.join(CONFIG_FILE_NAME) } else { path.to_path_buf() };
        if !file.is_file() {
            return Err(ConfigError::ConfigNotFound(file));
        }
        let content = fs::read_to_string(&file)?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded configuration from {}", file.display());
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigParseError(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.comment_prefixes.is_empty() || self.comment_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "comment_prefixes",
                reason: "at least one non-blank comment prefix is required".to_string(),
            });
        }
        if self.fragment_marker.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "fragment_marker",
                reason: "the marker cannot be empty".to_string(),
            });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "workers",
                reason: "at least one worker is required".to_string(),
            });
        }
        if self.golden_suffix.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "golden_suffix",
                reason: "the suffix cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}
