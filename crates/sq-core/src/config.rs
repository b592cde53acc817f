//! Run settings and parsing for pgsquash.yml
//!
//! Every knob has a default that reproduces the conventional golang-migrate
//! layout, so the config file is optional. Resolution order is
//! CLI flag > config file > default.

use crate::error::{CoreError, CoreResult};
use crate::files::same_location;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file names looked up in the working directory
const CONFIG_FILE_NAMES: [&str; 2] = ["pgsquash.yml", "pgsquash.yaml"];

/// Fully resolved settings for one squash run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the migration files to squash
    pub migrations_dir: PathBuf,

    /// Directory receiving verbatim copies of the old migrations
    pub backup_dir: PathBuf,

    /// Migration bookkeeping table excluded from the baseline
    pub tracking_table: String,

    /// File name of the generated up-migration
    pub up_file: String,

    /// File name of the generated down-migration
    pub down_file: String,

    /// Number of up-migration lines printed in a dry run
    pub preview_lines: usize,

    /// Project name shown in the up-migration header
    pub project_name: String,

    /// `psql` binary used for the connectivity probe
    pub psql_bin: String,

    /// `pg_dump` binary used for the schema dump
    pub pg_dump_bin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            backup_dir: PathBuf::from("migrations_backup"),
            tracking_table: "schema_migrations".to_string(),
            up_file: "001_initial_schema.up.sql".to_string(),
            down_file: "001_initial_schema.down.sql".to_string(),
            preview_lines: 30,
            project_name: "NOF0".to_string(),
            psql_bin: "psql".to_string(),
            pg_dump_bin: "pg_dump".to_string(),
        }
    }
}

/// On-disk shape of pgsquash.yml; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub migrations_dir: Option<PathBuf>,
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    #[serde(default)]
    pub tracking_table: Option<String>,
    #[serde(default)]
    pub up_file: Option<String>,
    #[serde(default)]
    pub down_file: Option<String>,
    #[serde(default)]
    pub preview_lines: Option<usize>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub psql_bin: Option<String>,
    #[serde(default)]
    pub pg_dump_bin: Option<String>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub migrations_dir: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
}

impl SettingsFile {
    /// Load a config file from an explicit path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Look for pgsquash.yml or pgsquash.yaml in `dir`; absent is not an error
    pub fn discover(dir: &Path) -> CoreResult<Option<Self>> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                log::debug!("Using config file {}", candidate.display());
                return Self::load(&candidate).map(Some);
            }
        }
        Ok(None)
    }

    fn parse(content: &str, path: &Path) -> CoreResult<Self> {
        // An empty YAML document deserializes to unit, not a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| CoreError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

impl Settings {
    /// Resolve settings from an optional explicit config path, the working
    /// directory used for discovery, and CLI overrides.
    pub fn resolve(
        config_path: Option<&Path>,
        working_dir: &Path,
        overrides: &SettingsOverrides,
    ) -> CoreResult<Self> {
        let file = match config_path {
            Some(path) => Some(SettingsFile::load(path)?),
            None => SettingsFile::discover(working_dir)?,
        };
        let settings = Self::merge(file.unwrap_or_default(), overrides);
        settings.validate()?;
        Ok(settings)
    }

    /// Layer file values and overrides on top of the defaults
    pub fn merge(file: SettingsFile, overrides: &SettingsOverrides) -> Self {
        let defaults = Self::default();
        Self {
            migrations_dir: overrides
                .migrations_dir
                .clone()
                .or(file.migrations_dir)
                .unwrap_or(defaults.migrations_dir),
            backup_dir: overrides
                .backup_dir
                .clone()
                .or(file.backup_dir)
                .unwrap_or(defaults.backup_dir),
            tracking_table: file.tracking_table.unwrap_or(defaults.tracking_table),
            up_file: file.up_file.unwrap_or(defaults.up_file),
            down_file: file.down_file.unwrap_or(defaults.down_file),
            preview_lines: file.preview_lines.unwrap_or(defaults.preview_lines),
            project_name: file.project_name.unwrap_or(defaults.project_name),
            psql_bin: file.psql_bin.unwrap_or(defaults.psql_bin),
            pg_dump_bin: file.pg_dump_bin.unwrap_or(defaults.pg_dump_bin),
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> CoreResult<()> {
        if self.tracking_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "tracking_table cannot be empty".to_string(),
            });
        }

        for (field, name) in [("up_file", &self.up_file), ("down_file", &self.down_file)] {
            if name.is_empty() || !name.ends_with(".sql") {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{field} must be a non-empty .sql file name, got '{name}'"),
                });
            }
            if name.contains('/') || name.contains('\\') {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{field} must be a bare file name, got '{name}'"),
                });
            }
        }

        if self.up_file == self.down_file {
            return Err(CoreError::ConfigInvalid {
                message: format!("up_file and down_file are both '{}'", self.up_file),
            });
        }

        if same_location(&self.migrations_dir, &self.backup_dir) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "migrations_dir and backup_dir must differ (both '{}')",
                    self.migrations_dir.display()
                ),
            });
        }

        for (field, bin) in [("psql_bin", &self.psql_bin), ("pg_dump_bin", &self.pg_dump_bin)] {
            if bin.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        Ok(())
    }

    /// Path of the generated up-migration
    pub fn up_path(&self) -> PathBuf {
        self.migrations_dir.join(&self.up_file)
    }

    /// Path of the generated down-migration
    pub fn down_path(&self) -> PathBuf {
        self.migrations_dir.join(&self.down_file)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
