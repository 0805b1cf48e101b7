use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use self::kit::parse_kit_breakpoints;

mod kit;

pub use self::kit::KitBreakpoints;

pub const DEFAULT_VIEWPORT_MIN_PX: u32 = 320;
pub const DEFAULT_VIEWPORT_MAX_PX: u32 = 1200;

#[derive(Debug, Error)]
pub enum ViewportError {
    #[error("viewport defaults must satisfy max > min (min {min_px}px, max {max_px}px)")]
    InvalidDefaults { min_px: u32, max_px: u32 },
    #[error("page builder viewport source needs a kit_path")]
    MissingKitPath,
    #[error("failed to read page builder kit settings: {path}")]
    ReadKit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid page builder kit settings: {message}")]
    InvalidKit { message: String },
    #[error("page builder breakpoints rejected: desktop {desktop_px}px must exceed mobile {mobile_px}px")]
    InvalidBreakpoints { mobile_px: u32, desktop_px: u32 },
}

pub type ViewportResult<T> = std::result::Result<T, ViewportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportOrigin {
    Default,
    PageBuilder,
}

impl fmt::Display for ViewportOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::PageBuilder => f.write_str("page_builder"),
        }
    }
}

/// Viewport width interval used for interpolation. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewportRange {
    pub min_px: u32,
    pub max_px: u32,
    pub source: ViewportOrigin,
}

pub trait ViewportSource {
    fn viewport_range(&self) -> ViewportRange;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultViewport {
    min_px: u32,
    max_px: u32,
}

impl DefaultViewport {
    pub fn new(min_px: u32, max_px: u32) -> ViewportResult<Self> {
        if max_px <= min_px {
            return Err(ViewportError::InvalidDefaults { min_px, max_px });
        }
        Ok(Self { min_px, max_px })
    }
}

impl Default for DefaultViewport {
    fn default() -> Self {
        Self {
            min_px: DEFAULT_VIEWPORT_MIN_PX,
            max_px: DEFAULT_VIEWPORT_MAX_PX,
        }
    }
}

impl ViewportSource for DefaultViewport {
    fn viewport_range(&self) -> ViewportRange {
        ViewportRange {
            min_px: self.min_px,
            max_px: self.max_px,
            source: ViewportOrigin::Default,
        }
    }
}

/// Supplies the raw kit settings document of a page builder, if one is installed.
pub trait KitSettingsBackend {
    fn kit_settings_json(&self) -> ViewportResult<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct KitFileBackend {
    path: PathBuf,
}

impl KitFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KitSettingsBackend for KitFileBackend {
    fn kit_settings_json(&self) -> ViewportResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ViewportError::ReadKit {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Page-builder breakpoints with a fallback to the default range.
#[derive(Debug, Clone)]
pub struct PageBuilderViewport<B> {
    backend: B,
    content_width_fallback: Option<u32>,
    fallback: DefaultViewport,
}

impl<B: KitSettingsBackend> PageBuilderViewport<B> {
    pub fn new(backend: B, content_width_fallback: Option<u32>, fallback: DefaultViewport) -> Self {
        Self {
            backend,
            content_width_fallback,
            fallback,
        }
    }

    pub fn breakpoints(&self) -> ViewportResult<Option<KitBreakpoints>> {
        let Some(json) = self.backend.kit_settings_json()? else {
            return Ok(None);
        };
        parse_kit_breakpoints(&json, self.content_width_fallback).map(Some)
    }
}

impl<B: KitSettingsBackend> ViewportSource for PageBuilderViewport<B> {
    fn viewport_range(&self) -> ViewportRange {
        match self.breakpoints() {
            Ok(Some(breakpoints)) => ViewportRange {
                min_px: breakpoints.mobile_px,
                max_px: breakpoints.desktop_px,
                source: ViewportOrigin::PageBuilder,
            },
            Ok(None) => {
                tracing::debug!("no page builder kit settings; using default viewport");
                self.fallback.viewport_range()
            }
            Err(err) => {
                tracing::warn!(%err, "page builder viewport unavailable; using default viewport");
                self.fallback.viewport_range()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticKit(Option<&'static str>);

    impl KitSettingsBackend for StaticKit {
        fn kit_settings_json(&self) -> ViewportResult<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct BrokenKit;

    impl KitSettingsBackend for BrokenKit {
        fn kit_settings_json(&self) -> ViewportResult<Option<String>> {
            Err(ViewportError::ReadKit {
                path: PathBuf::from("/nowhere/kit.json"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    #[test]
    fn default_viewport_reports_default_origin() {
        let range = DefaultViewport::default().viewport_range();
        assert_eq!(
            range,
            ViewportRange {
                min_px: 320,
                max_px: 1200,
                source: ViewportOrigin::Default,
            }
        );
    }

    #[test]
    fn default_viewport_rejects_empty_range() {
        assert!(matches!(
            DefaultViewport::new(1140, 1140),
            Err(ViewportError::InvalidDefaults { .. })
        ));
        assert!(DefaultViewport::new(320, 1140).is_ok());
    }

    #[test]
    fn page_builder_overrides_when_breakpoints_valid() {
        let source = PageBuilderViewport::new(
            StaticKit(Some(r#"{"viewport_mobile": 480, "container_width": {"size": 1320}}"#)),
            None,
            DefaultViewport::default(),
        );
        assert_eq!(
            source.viewport_range(),
            ViewportRange {
                min_px: 480,
                max_px: 1320,
                source: ViewportOrigin::PageBuilder,
            }
        );
    }

    #[test]
    fn page_builder_falls_back_when_desktop_not_wider() {
        let source = PageBuilderViewport::new(
            StaticKit(Some(r#"{"viewport_mobile": 900, "container_width": {"size": 800}}"#)),
            None,
            DefaultViewport::new(320, 1140).unwrap(),
        );
        let range = source.viewport_range();
        assert_eq!(range.source, ViewportOrigin::Default);
        assert_eq!((range.min_px, range.max_px), (320, 1140));
    }

    #[test]
    fn page_builder_falls_back_without_kit_or_on_read_error() {
        let absent = PageBuilderViewport::new(StaticKit(None), None, DefaultViewport::default());
        assert_eq!(absent.viewport_range().source, ViewportOrigin::Default);

        let broken = PageBuilderViewport::new(BrokenKit, None, DefaultViewport::default());
        assert_eq!(broken.viewport_range().source, ViewportOrigin::Default);
    }

    #[test]
    fn kit_file_backend_treats_missing_file_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let backend = KitFileBackend::new(dir.path().join("kit.json"));
        assert!(backend.kit_settings_json().unwrap().is_none());

        std::fs::write(backend.path(), r#"{"viewport_mobile": 360}"#).unwrap();
        assert_eq!(
            backend.kit_settings_json().unwrap().as_deref(),
            Some(r#"{"viewport_mobile": 360}"#)
        );
    }
}
