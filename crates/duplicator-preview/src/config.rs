use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILE: &str = "duplicator-preview.toml";

/// The user's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Index of the monitor to duplicate.
    pub monitor: u32,

    /// Whether to mirror frames into a preview window.
    pub show_preview: bool,

    /// Milliseconds between frame updates.
    pub frame_interval_ms: u64,

    /// Stop after this many new frames.
    pub max_frames: Option<u64>,

    /// Log at debug level.
    pub debug: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open config file:\n{0}")]
    OpenFile(#[source] io::Error),

    #[error("Failed to save config file:\n{0}")]
    SaveFile(#[from] SaveError),

    #[error("Failed to read config file:\n{0}")]
    ReadFile(#[source] io::Error),

    #[error("Failed to deserialize config:\n{0}")]
    Deserialize(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to serialize config:\n{0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write file:\n{0}")]
    Write(#[from] io::Error),
}

impl Config {
    /// Loads the config file, writing out the defaults if there is none.
    pub fn load_or_create() -> Result<Self, LoadError> {
        Self::load_or_create_at(&Self::file_path())
    }

    /// Loads the config file at `path`, writing out the defaults if there is none.
    pub fn load_or_create_at(path: &Path) -> Result<Self, LoadError> {
        let file = fs::File::open(path);

        if file
            .as_ref()
            .is_err_and(|e| e.kind() == io::ErrorKind::NotFound)
        {
            let config = Self::default();
            config.save_to(path)?;

            return Ok(config);
        }

        let mut file = file.map_err(LoadError::OpenFile)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(LoadError::ReadFile)?;

        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, LoadError> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SaveError> {
        let toml_string = toml::to_string_pretty(self)?;

        fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    pub fn file_path() -> PathBuf {
        PathBuf::from(".").join(CONFIG_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: 0,
            show_preview: true,
            frame_interval_ms: 16,
            max_frames: None,
            debug: false,
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::{CONFIG_FILE, Config, LoadError};

    #[test]
    fn missing_fields_use_defaults() {
        let config = Config::parse("monitor = 1\nmax_frames = 120\n").unwrap();

        assert_eq!(
            config,
            Config {
                monitor: 1,
                max_frames: Some(120),
                ..Default::default()
            }
        );
    }

    #[test]
    fn defaults_survive_serialization() {
        let contents = toml::to_string_pretty(&Config::default()).unwrap();

        assert_eq!(Config::parse(&contents).unwrap(), Config::default());
    }

    #[test]
    fn invalid_config() {
        let result = Config::parse("monitor = \"primary\"\n");

        assert!(matches!(result, Err(LoadError::Deserialize(_))));
    }

    #[test]
    fn missing_file_writes_defaults() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join(CONFIG_FILE);

        let config = Config::load_or_create_at(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        // The written file is read back on the next start.
        let config = Config {
            monitor: 2,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_or_create_at(&path).unwrap(), config);
    }

    #[test]
    fn invalid_file_is_not_overwritten() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join(CONFIG_FILE);
        fs::write(&path, "show_preview = 3\n").unwrap();

        let result = Config::load_or_create_at(&path);

        assert!(matches!(result, Err(LoadError::Deserialize(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "show_preview = 3\n");
    }
}
