//! Runtime configuration.
//!
//! Defaults cover the bundled workbook. A JSON file may override any field,
//! and `RUSTY_TRACTOR_DATA` overrides the workbook path.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::export::EXPORT_FILE_NAME;
use crate::data::loader::SheetNames;

/// Environment variable overriding [`DashboardConfig::default_path`].
pub const DATA_PATH_ENV: &str = "RUSTY_TRACTOR_DATA";

/// Repository-relative location of the bundled workbook.
pub const DEFAULT_DATA_PATH: &str = "data/ple_sales.xlsx";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Workbook used when nothing is uploaded.
    pub default_path: PathBuf,
    pub sheets: SheetNames,
    pub export_file_name: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            default_path: PathBuf::from(DEFAULT_DATA_PATH),
            sheets: SheetNames::default(),
            export_file_name: EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Defaults, then the optional file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(data) = std::env::var_os(DATA_PATH_ENV) {
            config.default_path = PathBuf::from(data);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "sheets": { "mower": "Mowers" } }"#).unwrap();

        let config = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(config.sheets.mower, "Mowers");
        assert_eq!(config.sheets.tractor, "Tractor Unit Sales");
        assert_eq!(config.default_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.export_file_name, "filtered_sales.csv");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(DashboardConfig::from_file(&path).is_err());
        assert!(DashboardConfig::from_file(&dir.path().join("absent.json")).is_err());
    }
}
