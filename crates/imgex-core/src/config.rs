//! Viewer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::FilterType;

/// Errors raised while reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Format(#[from] serde_json::Error),
}

/// Settings shared by every image in the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory bare image names are resolved against.
    pub picture_dir: Option<PathBuf>,
    /// Factor applied per zoom step (e.g., 1.1 = 10% per wheel notch).
    pub zoom_step: f64,
    /// Minimum stepped zoom (e.g., 0.05 = 5%).
    pub min_zoom: f64,
    /// Maximum stepped zoom (e.g., 20.0 = 2000%).
    pub max_zoom: f64,
    /// Resampling filter used when zooming.
    pub filter: FilterType,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            picture_dir: dirs::picture_dir().or_else(dirs::home_dir),
            zoom_step: 1.1,
            min_zoom: 0.05,
            max_zoom: 20.0,
            filter: FilterType::default(),
        }
    }
}

impl ViewerConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Next zoom factor one step in or out from `current`, clamped to
    /// `[min_zoom, max_zoom]`.
    pub fn step_zoom(&self, current: f64, forward: bool) -> f64 {
        let next = if forward {
            current * self.zoom_step
        } else {
            current / self.zoom_step
        };
        next.clamp(self.min_zoom, self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.zoom_step, 1.1);
        assert_eq!(config.filter, FilterType::Bilinear);
        assert!(config.min_zoom < 1.0 && config.max_zoom > 1.0);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"zoom_step": 1.5, "filter": "nearest"}"#).unwrap();
        assert_eq!(config.zoom_step, 1.5);
        assert_eq!(config.filter, FilterType::Nearest);
        assert_eq!(config.max_zoom, 20.0);
    }

    #[test]
    fn test_step_zoom() {
        let config = ViewerConfig {
            zoom_step: 2.0,
            min_zoom: 0.25,
            max_zoom: 4.0,
            ..ViewerConfig::default()
        };
        assert_eq!(config.step_zoom(1.0, true), 2.0);
        assert_eq!(config.step_zoom(1.0, false), 0.5);
        assert_eq!(config.step_zoom(3.0, true), 4.0);
        assert_eq!(config.step_zoom(0.3, false), 0.25);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ViewerConfig::load(Path::new("/nonexistent/imgex.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let path = std::env::temp_dir().join(format!("imgex-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = ViewerConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Format(_)));
    }
}
