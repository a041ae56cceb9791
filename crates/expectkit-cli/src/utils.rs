use std::path::{Path, PathBuf};

use expectkit_source::{VerifierConfig, CONFIG_FILE_NAME};

use crate::error::{convert_io_error, CliError};

/// Finds the directory holding `expectkit.toml` by searching upwards from `start_path`.
pub fn find_config_root(start_path: &Path) -> Result<Option<PathBuf>, CliError> {
    let mut current = if start_path.is_dir() {
        start_path.to_path_buf()
    } else {
        start_path.parent().map_or_else(|| start_path.to_path_buf(), |p| p.to_path_buf())
    };

    loop {
        if current.join(CONFIG_FILE_NAME).is_file() {
            return current
                .canonicalize()
                .map(Some)
                .map_err(|e| convert_io_error(e, current.clone(), "canonicalizing"));
        }
        if !current.pop() {
            return Ok(None);
        }
    }
}

/// Load the configuration from `explicit`, else from the nearest `expectkit.toml`
/// above `start_path`, else fall back to defaults.
pub fn load_config(explicit: Option<&Path>, start_path: &Path) -> Result<VerifierConfig, CliError> {
    if let Some(path) = explicit {
        return Ok(VerifierConfig::load(path)?);
    }
    match find_config_root(start_path)? {
        Some(root) => {
            log::info!("Using {}", root.join(CONFIG_FILE_NAME).display());
            Ok(VerifierConfig::load(&root)?)
        }
        None => {
            log::info!("No {} found, using defaults", CONFIG_FILE_NAME);
            Ok(VerifierConfig::default())
        }
    }
}

/// Golden post-edit texts stored next to `file` as `<name>.<quickfix id>.<suffix>`.
pub fn find_goldens(file: &Path, suffix: &str) -> Result<Vec<(String, PathBuf)>, CliError> {
    let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(Vec::new());
    };
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = format!("{}.", name);
    let ending = format!(".{}", suffix);

    let entries = std::fs::read_dir(&dir).map_err(|e| convert_io_error(e, dir.clone(), "listing"))?;
    let mut goldens = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| convert_io_error(e, dir.clone(), "listing"))?;
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        let id = entry_name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&ending))
            .filter(|id| !id.is_empty() && !id.contains('.'));
        if let Some(id) = id {
            goldens.push((id.to_string(), entry.path()));
        }
    }
    goldens.sort();
    Ok(goldens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_config_in_a_parent_directory() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE_NAME), "").unwrap();
        let nested = root.path().join("src").join("checks");
        fs::create_dir_all(&nested).unwrap();

        let found = find_config_root(&nested).unwrap();
        assert_eq!(found, Some(root.path().canonicalize().unwrap()));
    }

    #[test]
    fn missing_config_means_defaults() {
        let root = tempfile::tempdir().unwrap();
        // Only meaningful when no config exists above the temp dir.
        if find_config_root(root.path()).unwrap().is_none() {
            assert_eq!(load_config(None, root.path()).unwrap(), VerifierConfig::default());
        }
    }

    #[test]
    fn goldens_are_keyed_by_quickfix_id() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("A.java");
        for name in ["A.java", "A.java.qf1.fixed", "A.java.qf2.fixed", "A.java.fixed", "B.java.qf1.fixed"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let ids: Vec<String> = find_goldens(&file, "fixed").unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["qf1", "qf2"]);
    }
}
