use crate::error::{Result, SayError};
use crate::settings::config::Settings;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads settings from `~/.ai-say/settings.toml` (or an explicit path). A
/// missing file is created with defaults; a file that fails to parse is moved
/// aside to `settings.toml.backup` and replaced with defaults.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Create a new settings manager with default settings location
    pub fn new() -> Result<Self> {
        Self::from_path(Self::default_settings_path()?)
    }

    /// Create a settings manager from a specific path
    pub fn from_path(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            write_settings(&path, &Settings::default())?;
        }

        let settings = Self::load_from_file_with_backup(&path)?;

        Ok(Self {
            settings_path: path,
            settings,
        })
    }

    /// Get the default settings path (~/.ai-say/settings.toml)
    pub fn default_settings_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SayError::Config("failed to get home directory".to_string()))?;
        Ok(home.join(".ai-say").join("settings.toml"))
    }

    fn load_from_file_with_backup(path: &Path) -> Result<Settings> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SayError::Config(format!("failed to read settings from {path:?}: {e}"))
        })?;

        match toml::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(error = %e, ?path, "settings file is corrupt, restoring defaults");

                let backup_path = path.with_extension("toml.backup");
                fs::rename(path, &backup_path).map_err(|e| {
                    SayError::Config(format!(
                        "failed to backup corrupted settings to {backup_path:?}: {e}"
                    ))
                })?;

                let defaults = Settings::default();
                write_settings(path, &defaults)?;
                Ok(defaults)
            }
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.clone()
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SayError::Config(format!("failed to create directory {parent:?}: {e}"))
        })?;
    }

    let contents = toml::to_string_pretty(settings)
        .map_err(|e| SayError::Config(format!("failed to serialize settings: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| SayError::Config(format!("failed to write settings to {path:?}: {e}")))
}
