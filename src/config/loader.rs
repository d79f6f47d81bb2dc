//! Configuration loading functionality
//!
//! This module contains functions for locating, loading and saving settings.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use log::{debug, info};
use serde_yaml::from_str;

use crate::utils::find_project_folder;

use super::model::Settings;

/// Loads settings from a file
///
/// Font directories and tool paths are expanded with `~` and `$VAR`
/// substitution after parsing.
///
/// # Arguments
/// * `file` - Path to the settings file
///
/// # Returns
/// * `Result<Settings>` - The loaded settings or an error
///
/// # Errors
/// Returns an error if the file cannot be read or if the settings are invalid
pub fn load_settings(file: &Path) -> Result<Settings> {
    let file_content = fs::read(file).map_err(|e| {
        anyhow!(
            "Failed to read configuration file {}: {}",
            file.display(),
            e
        )
    })?;

    let content_str = String::from_utf8(file_content).map_err(|e| {
        anyhow!(
            "Configuration file {} contains invalid UTF-8 characters: {}",
            file.display(),
            e
        )
    })?;

    // An empty file is a valid, all-default configuration
    let mut settings: Settings = if content_str.trim().is_empty() {
        Settings::default()
    } else {
        from_str(&content_str).map_err(|e| {
            anyhow!(
                "Failed to parse configuration file {}: {}\nPlease check the YAML syntax.",
                file.display(),
                e
            )
        })?
    };

    settings.font_dirs = settings
        .font_dirs
        .iter()
        .map(|dir| expand_path(dir))
        .collect::<Result<Vec<_>>>()?;
    for path in settings.tools.values_mut() {
        *path = expand_path(path)?;
    }

    settings.validate()?;

    debug!("Loaded settings from {}", file.display());
    Ok(settings)
}

/// Loads settings from `config`, or the defaults when no file exists there
///
/// # Errors
/// Returns an error if an existing file cannot be parsed
pub fn load_or_default(config: &Path) -> Result<Settings> {
    let path = settings_path(config)?;
    if path.exists() {
        info!("Using configuration {}", path.display());
        load_settings(&path)
    } else {
        debug!("No configuration at {}, using defaults", path.display());
        Ok(Settings::default())
    }
}

/// Resolves the settings file location
///
/// An existing path is used as given. Otherwise the name is looked up in the
/// platform configuration directory.
///
/// # Errors
/// Returns an error if the configuration directory cannot be determined
pub fn settings_path(config: &Path) -> Result<PathBuf> {
    let expanded = expand_path(config)?;
    if expanded.exists() || expanded.is_absolute() {
        Ok(expanded)
    } else {
        let folder = find_project_folder()?;
        Ok(folder.config_dir().join(expanded))
    }
}

/// Saves settings to a YAML file
///
/// # Errors
/// Returns an error if serialisation or writing fails
pub fn save_settings(settings: &Settings, output_path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(settings)?;
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, yaml)?;
    debug!("Settings saved to {}", output_path.display());
    Ok(())
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| anyhow!("Failed to expand path {}: {}", raw, e))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_round_trips_through_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut settings = Settings::default();
        settings.image.width = 900;
        settings.translate.target = "hi".to_string();
        save_settings(&settings, &path).unwrap();

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(load_settings(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "pdf: [unclosed").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("Please check the YAML syntax"));
    }

    #[test]
    fn test_font_dirs_are_expanded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        unsafe { std::env::set_var("FTK_TEST_FONTS", "/opt/fonts") };
        fs::write(&path, "font_dirs:\n  - $FTK_TEST_FONTS/truetype\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.font_dirs, vec![PathBuf::from("/opt/fonts/truetype")]);
    }
}
