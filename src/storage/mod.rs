use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::config::{app_config_path, config_env_dirs, ConfigPathError, APP_DIR};
use crate::tokens::Settings;

const SETTINGS_FILE: &str = "tokens.json";
const TEMP_SUFFIX: &str = "tmp";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to read token settings: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write token settings: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse token settings: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize token settings")]
    Serialize(#[from] serde_json::Error),
    #[error("settings backend rejected the write: {message}")]
    Rejected { message: String },
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Load/save boundary for the single settings record.
pub trait SettingsStorage {
    /// Stored settings, or defaults when nothing has been saved yet.
    fn load_settings(&self) -> StorageResult<Settings>;
    fn save_settings(&self, settings: &Settings) -> StorageResult<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn with_default_path() -> StorageResult<Self> {
        let (xdg_config_home, home) = config_env_dirs();
        Self::with_default_path_in(xdg_config_home.as_deref(), home.as_deref())
    }

    fn with_default_path_in(
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
    ) -> StorageResult<Self> {
        let path = app_config_path(APP_DIR, SETTINGS_FILE, xdg_config_home, home).map_err(
            |error| match error {
                ConfigPathError::MissingHomeDirectory => StorageError::MissingHomeDirectory,
            },
        )?;
        Ok(Self::with_path(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| SETTINGS_FILE.into());
        name.push(".");
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }
}

impl SettingsStorage for JsonFileStorage {
    fn load_settings(&self) -> StorageResult<Settings> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no stored settings; using defaults");
            return Ok(Settings::default());
        }

        let serialized = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&serialized).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write to a sibling temp file and rename it over the target.
    fn save_settings(&self, settings: &Settings) -> StorageResult<()> {
        let write_error = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let serialized = serde_json::to_string_pretty(settings)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, serialized).map_err(write_error)?;
        if let Err(source) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_error(source));
        }

        tracing::debug!(path = %self.path.display(), "saved token settings");
        Ok(())
    }
}

/// In-process storage, for tests and embedding without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    settings: Mutex<Option<Settings>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
        }
    }

    pub fn stored(&self) -> Option<Settings> {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SettingsStorage for MemoryStorage {
    fn load_settings(&self) -> StorageResult<Settings> {
        Ok(self.stored().unwrap_or_default())
    }

    fn save_settings(&self, settings: &Settings) -> StorageResult<()> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{FluidToken, RootUnitSize, StaticToken};

    fn sample_settings() -> Settings {
        let mut settings = Settings {
            root_font_size: RootUnitSize::LargeBase,
            ..Settings::default()
        };
        settings
            .tokens
            .insert("h1".to_string(), FluidToken { min: 1.5, max: 3.0 });
        settings
            .static_tokens
            .insert("gap".to_string(), StaticToken { value: 0.5 });
        settings
    }

    #[test]
    fn default_path_prefers_xdg_config_home() {
        let storage = JsonFileStorage::with_default_path_in(
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .unwrap();
        assert_eq!(
            storage.path(),
            Path::new("/tmp/config-root/fluid-tokens/tokens.json")
        );
    }

    #[test]
    fn default_path_errors_without_home() {
        assert!(matches!(
            JsonFileStorage::with_default_path_in(None, None),
            Err(StorageError::MissingHomeDirectory)
        ));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::with_path(dir.path().join("tokens.json"));
        let settings = storage.load_settings().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.root_font_size, RootUnitSize::SmallBase);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::with_path(dir.path().join("nested").join("tokens.json"));
        storage.save_settings(&sample_settings()).unwrap();

        assert_eq!(storage.load_settings().unwrap(), sample_settings());
        assert!(!storage.temp_path().exists());
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::with_path(dir.path().join("tokens.json"));
        storage.save_settings(&sample_settings()).unwrap();
        storage.save_settings(&Settings::default()).unwrap();
        assert_eq!(storage.load_settings().unwrap(), Settings::default());
    }

    #[test]
    fn invalid_payload_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "{ invalid ").unwrap();
        let storage = JsonFileStorage::with_path(&path);
        assert!(matches!(
            storage.load_settings(),
            Err(StorageError::Parse { .. })
        ));
    }

    #[test]
    fn hand_edited_file_is_cleaned_when_adopted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(
            &path,
            r#"{
                "root_font_size": "100%",
                "tokens": {
                    "X}</style><script>alert(1)</script>": {"min": 3, "max": -1},
                    "Hero Title": {"min": 2, "max": 4}
                },
                "static_tokens": {"gap": 0, "Radius": 0.5}
            }"#,
        )
        .unwrap();

        let settings = JsonFileStorage::with_path(&path).load_settings().unwrap();
        let store = crate::tokens::TokenStore::from_settings(settings);
        assert_eq!(store.root_unit_size(), RootUnitSize::LargeBase);
        assert_eq!(
            store.fluid_tokens().keys().collect::<Vec<_>>(),
            vec!["herotitle"]
        );
        assert_eq!(
            store.static_tokens().keys().collect::<Vec<_>>(),
            vec!["radius"]
        );
    }

    #[test]
    fn memory_storage_keeps_last_save() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load_settings().unwrap(), Settings::default());
        storage.save_settings(&sample_settings()).unwrap();
        assert_eq!(storage.stored(), Some(sample_settings()));
    }
}
