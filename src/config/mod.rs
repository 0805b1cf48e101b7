use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::viewport::{
    DefaultViewport, KitFileBackend, PageBuilderViewport, ViewportError, ViewportResult,
    ViewportSource, DEFAULT_VIEWPORT_MAX_PX, DEFAULT_VIEWPORT_MIN_PX,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

pub(crate) const APP_DIR: &str = "fluid-tokens";
const APP_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportSourceKind {
    #[default]
    Default,
    PageBuilder,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewportConfig {
    #[serde(default)]
    pub source: ViewportSourceKind,
    #[serde(default = "default_min_px")]
    pub min_px: u32,
    #[serde(default = "default_max_px")]
    pub max_px: u32,
    #[serde(default)]
    pub kit_path: Option<PathBuf>,
    #[serde(default)]
    pub content_width_fallback: Option<u32>,
}

fn default_min_px() -> u32 {
    DEFAULT_VIEWPORT_MIN_PX
}

fn default_max_px() -> u32 {
    DEFAULT_VIEWPORT_MAX_PX
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            source: ViewportSourceKind::Default,
            min_px: DEFAULT_VIEWPORT_MIN_PX,
            max_px: DEFAULT_VIEWPORT_MAX_PX,
            kit_path: None,
            content_width_fallback: None,
        }
    }
}

impl ViewportConfig {
    pub fn build_source(&self) -> ViewportResult<Box<dyn ViewportSource>> {
        let defaults = DefaultViewport::new(self.min_px, self.max_px)?;
        match self.source {
            ViewportSourceKind::Default => Ok(Box::new(defaults)),
            ViewportSourceKind::PageBuilder => {
                let kit_path = self.kit_path.clone().ok_or(ViewportError::MissingKitPath)?;
                Ok(Box::new(PageBuilderViewport::new(
                    KitFileBackend::new(kit_path),
                    self.content_width_fallback,
                    defaults,
                )))
            }
        }
    }
}

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
    #[serde(default)]
    pub viewport: ViewportConfig,
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
