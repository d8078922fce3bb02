use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::data::projection::CellSize;
use crate::deck::MapOptions;
use crate::error::{PipelineError, Result};

pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/musamibrahim/DRABMTestMap/refs/heads/main/DailyAverageBuoyData.csv";

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "buoy-grid.toml";

/// Overrides `source_url` from the environment.
pub const SOURCE_ENV_VAR: &str = "BUOY_GRID_SOURCE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV URL or local path loaded at start-up.
    pub source_url: String,
    pub title: String,
    pub default_cell_size: i64,
    pub map: MapOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            title: "Clinton Lake Data Visualization".to_string(),
            default_cell_size: CellSize::DEFAULT.get() as i64,
            map: MapOptions::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or from `buoy-grid.toml` if present, or defaults.
    /// An explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if !p.exists() => {
                return Err(PipelineError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )))
            }
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Ok(source) = std::env::var(SOURCE_ENV_VAR) {
            info!("Using source from {SOURCE_ENV_VAR}: {source}");
            config.source_url = source;
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Start-up cell size; out-of-range values are clamped.
    pub fn cell_size(&self) -> CellSize {
        CellSize::new(self.default_cell_size).unwrap_or_else(|_| {
            let clamped = CellSize::clamped(self.default_cell_size);
            warn!(
                "default_cell_size {} is invalid; using {}",
                self.default_cell_size,
                clamped.get()
            );
            clamped
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            "title = \"Test lake\"\n[map]\nzoom = 9.5\n",
        )
        .unwrap();
        assert_eq!(config.title, "Test lake");
        assert_eq!(config.map.zoom, 9.5);
        assert_eq!(config.map.pitch, 40.0);
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
    }

    #[test]
    fn invalid_cell_size_is_clamped() {
        let config = Config {
            default_cell_size: 42,
            ..Config::default()
        };
        assert_eq!(config.cell_size().get(), 100);
        assert_eq!(Config::default().cell_size(), CellSize::DEFAULT);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/buoy-grid.toml"))).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn from_file_reports_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"zoom = [").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
