use std::fs;
use std::path::{Path, PathBuf};

use expectkit_source::{VerifierConfig, CONFIG_FILE_NAME};

use crate::error::{convert_io_error, CliError};

/// Write a default `expectkit.toml` into `dir`, creating the directory if needed.
///
/// An existing configuration is never overwritten.
pub fn handle_init(dir: &Path) -> Result<PathBuf, CliError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| convert_io_error(e, dir.to_path_buf(), "creating"))?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        return Err(CliError::AlreadyInitialized { path: config_path });
    }

    let content = VerifierConfig::default().to_toml_string()?;
    fs::write(&config_path, content).map_err(|e| convert_io_error(e, config_path.clone(), "writing"))?;

    println!("Created {}", config_path.display());
    Ok(config_path)
}
