//! User configuration file.
//!
//! Settings live in `~/.referada/config.ini`:
//!
//! ```ini
//! [portal]
//! base_url = https://student.racunarstvo.hr/digitalnareferada/
//! materials_path = api/materijali
//!
//! [download]
//! output_dir = /home/ana/faks
//!
//! [state]
//! snapshot_file = /home/ana/.referada/materials.json
//!
//! [logging]
//! directory = /home/ana/.referada/logs
//! ```
//!
//! Missing keys fall back to their defaults. An unset `output_dir` means the
//! current working directory.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::portal::{PortalConfig, DEFAULT_BASE_URL, DEFAULT_MATERIALS_PATH};

/// Directory name below the home directory.
const CONFIG_DIR_NAME: &str = ".referada";

const CONFIG_FILE_NAME: &str = "config.ini";
const SNAPSHOT_FILE_NAME: &str = "materials.json";
const LOG_DIR_NAME: &str = "logs";

/// Errors loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Base directory for configuration and state.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Location of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// `[portal]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSettings {
    pub base_url: String,
    pub materials_path: String,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            materials_path: DEFAULT_MATERIALS_PATH.to_string(),
        }
    }
}

impl From<&PortalSettings> for PortalConfig {
    fn from(settings: &PortalSettings) -> Self {
        PortalConfig {
            base_url: settings.base_url.clone(),
            materials_path: settings.materials_path.clone(),
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSettings {
    pub output_dir: Option<PathBuf>,
}

/// `[state]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSettings {
    pub snapshot_file: PathBuf,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            snapshot_file: config_dir().join(SNAPSHOT_FILE_NAME),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: config_dir().join(LOG_DIR_NAME),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub portal: PortalSettings,
    pub download: DownloadSettings,
    pub state: StateSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_ini(&ini))
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    fn from_ini(ini: &Ini) -> Self {
        let mut config = Self::default();
        let get = |section: &str, key: &str| {
            ini.section(Some(section))
                .and_then(|s| s.get(key))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(v) = get("portal", "base_url") {
            config.portal.base_url = v;
        }
        if let Some(v) = get("portal", "materials_path") {
            config.portal.materials_path = v;
        }
        config.download.output_dir = get("download", "output_dir").map(PathBuf::from);
        if let Some(v) = get("state", "snapshot_file") {
            config.state.snapshot_file = PathBuf::from(v);
        }
        if let Some(v) = get("logging", "directory") {
            config.logging.directory = PathBuf::from(v);
        }

        config
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("portal"))
            .set("base_url", self.portal.base_url.as_str())
            .set("materials_path", self.portal.materials_path.as_str());
        ini.with_section(Some("download")).set(
            "output_dir",
            self.download
                .output_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        );
        ini.with_section(Some("state")).set(
            "snapshot_file",
            self.state.snapshot_file.display().to_string(),
        );
        ini.with_section(Some("logging"))
            .set("directory", self.logging.directory.display().to_string());
        ini
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert_eq!(config.portal.base_url, DEFAULT_BASE_URL);
        assert!(config.download.output_dir.is_none());
        assert!(config.state.snapshot_file.ends_with(".referada/materials.json"));
        assert!(config.logging.directory.ends_with(".referada/logs"));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.ini");
        let mut config = ConfigFile::default();
        config.portal.base_url = "https://portal.example/".to_string();
        config.download.output_dir = Some(PathBuf::from("/home/ana/faks"));
        config.state.snapshot_file = PathBuf::from("/var/lib/referada/materials.json");

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[download]\noutput_dir = /srv/faks\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();

        assert_eq!(config.download.output_dir, Some(PathBuf::from("/srv/faks")));
        assert_eq!(config.portal, PortalSettings::default());
    }

    #[test]
    fn test_portal_config_from_settings() {
        let settings = PortalSettings {
            base_url: "https://portal.example/".to_string(),
            materials_path: "v2/materials".to_string(),
        };
        let config = PortalConfig::from(&settings);
        assert_eq!(config.base_url, "https://portal.example/");
        assert_eq!(config.materials_path, "v2/materials");
    }
}
