// TermiBase
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.


use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use termibase_core::SimulatorConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermibaseConfig {
    pub db_path: PathBuf,
    pub repl: ReplConfig,
    pub simulator: SimulatorConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Show the simulated plan before every statement.
    pub explain_by_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub max_result_rows: usize,
}

impl Default for TermibaseConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            repl: ReplConfig::default(),
            simulator: SimulatorConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { max_result_rows: 100 }
    }
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("termibase").join("sandbox.db")
}

impl TermibaseConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `--config` wins over `$TERMIBASE_CONFIG`, which wins over defaults.
    /// The database path can be overridden separately.
    pub fn resolve_config(cli_config: Option<PathBuf>, cli_db_path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(config_path) = cli_config {
            Self::load_from_file(config_path)?
        } else if let Ok(env_config) = std::env::var("TERMIBASE_CONFIG") {
            Self::load_from_file(env_config)?
        } else {
            Self::default()
        };

        if let Some(db_path) = cli_db_path {
            config.db_path = db_path;
        } else if let Ok(env_db_path) = std::env::var("TERMIBASE_DB_PATH") {
            config.db_path = PathBuf::from(env_db_path);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TermibaseConfig::default();
        assert!(config.db_path.ends_with("termibase/sandbox.db"));
        assert!(!config.repl.explain_by_default);
        assert_eq!(config.simulator.default_row_estimate, 100);
        assert_eq!(config.simulator.large_result_threshold, 1000);
        assert_eq!(config.output.max_result_rows, 100);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("termibase.toml");
        std::fs::write(&path, "[repl]\nexplain_by_default = true\n\n[simulator]\nlarge_result_threshold = 50\n").unwrap();

        let config = TermibaseConfig::load_from_file(&path).unwrap();
        assert!(config.repl.explain_by_default);
        assert_eq!(config.simulator.large_result_threshold, 50);
        assert_eq!(config.simulator.index_selectivity, 0.3);
        assert_eq!(config.output.max_result_rows, 100);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("termibase.toml");

        let mut config = TermibaseConfig::default();
        config.db_path = dir.path().join("custom.db");
        config.output.max_result_rows = 5;
        config.save_to_file(&path).unwrap();

        assert_eq!(TermibaseConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_cli_arguments_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("termibase.toml");
        std::fs::write(&path, "db_path = \"/from/file.db\"\n[output]\nmax_result_rows = 7\n").unwrap();

        let config = TermibaseConfig::resolve_config(Some(path.clone()), None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/from/file.db"));
        assert_eq!(config.output.max_result_rows, 7);

        let override_path = dir.path().join("cli.db");
        let config = TermibaseConfig::resolve_config(Some(path), Some(override_path.clone())).unwrap();
        assert_eq!(config.db_path, override_path);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[output\nmax_result_rows = ").unwrap();
        assert!(TermibaseConfig::load_from_file(&path).is_err());
        assert!(TermibaseConfig::load_from_file(dir.path().join("missing.toml")).is_err());
    }
}
