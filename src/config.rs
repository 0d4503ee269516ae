//! Engine configuration.
//!
//! Defaults mirror a local single-file deployment (`database.sqlite` next to the process).
//! Values can be loaded from a JSON file or from `SHEET_INGEST_*` environment variables.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::DEFAULT_PREVIEW_ROWS;
use crate::error::{IngestError, IngestResult};
use crate::observability::Severity;

pub const ENV_DATABASE: &str = "SHEET_INGEST_DB";
pub const ENV_PREVIEW_ROWS: &str = "SHEET_INGEST_PREVIEW_ROWS";
pub const ENV_DEDUP: &str = "SHEET_INGEST_DEDUP";
pub const ENV_ADMIN_SECRET: &str = "SHEET_INGEST_ADMIN_SECRET";

/// Settings for [`crate::engine::Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Path of the SQLite database file.
    pub database: PathBuf,
    /// Rows kept per table in ingest previews.
    pub preview_rows: usize,
    /// Default dedup mode for [`crate::engine::Engine::append`].
    pub dedup_on_append: bool,
    /// Failures at or above this severity are raised through `on_alert`.
    pub alert_at_or_above: Severity,
    /// Secret required to obtain an [`crate::admin::AdminToken`]. `None` disables admin actions.
    pub admin_secret: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("database.sqlite"),
            preview_rows: DEFAULT_PREVIEW_ROWS,
            dedup_on_append: false,
            alert_at_or_above: Severity::Critical,
            admin_secret: None,
        }
    }
}

impl EngineConfig {
    /// Default settings with a different database file.
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        Self {
            database: path.into(),
            ..Default::default()
        }
    }

    /// Load settings from a JSON file; missing keys keep their defaults.
    pub fn from_json_path(path: impl AsRef<Path>) -> IngestResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            IngestError::invalid_input(format!("config {}: {e}", path.display()))
        })
    }

    /// Build settings from the process environment on top of the defaults.
    pub fn from_env() -> IngestResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (used by [`Self::from_env`]).
    pub fn from_lookup<F>(lookup: F) -> IngestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(db) = lookup(ENV_DATABASE).filter(|v| !v.trim().is_empty()) {
            config.database = PathBuf::from(db);
        }
        if let Some(raw) = lookup(ENV_PREVIEW_ROWS) {
            config.preview_rows = raw.trim().parse().map_err(|_| {
                IngestError::invalid_input(format!("{ENV_PREVIEW_ROWS}='{raw}' is not a row count"))
            })?;
        }
        if let Some(raw) = lookup(ENV_DEDUP) {
            config.dedup_on_append = parse_flag(&raw).ok_or_else(|| {
                IngestError::invalid_input(format!("{ENV_DEDUP}='{raw}' is not a boolean"))
            })?;
        }
        if let Some(secret) = lookup(ENV_ADMIN_SECRET).filter(|v| !v.is_empty()) {
            config.admin_secret = Some(secret);
        }
        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_DATABASE, "/tmp/x.sqlite"),
            (ENV_PREVIEW_ROWS, "3"),
            (ENV_DEDUP, "yes"),
            (ENV_ADMIN_SECRET, "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.database, PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(config.preview_rows, 3);
        assert!(config.dedup_on_append);
        assert_eq!(config.admin_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn empty_lookup_gives_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(EngineConfig::from_lookup(lookup(&[(ENV_PREVIEW_ROWS, "many")])).is_err());
        assert!(EngineConfig::from_lookup(lookup(&[(ENV_DEDUP, "maybe")])).is_err());
    }

    #[test]
    fn json_keeps_defaults_for_missing_keys() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"database": "data.sqlite", "alert_at_or_above": "error"}"#)
                .unwrap();
        assert_eq!(config.database, PathBuf::from("data.sqlite"));
        assert_eq!(config.preview_rows, DEFAULT_PREVIEW_ROWS);
        assert_eq!(config.alert_at_or_above, Severity::Error);
    }

    #[test]
    fn json_file_is_loaded_and_unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"preview_rows": 10, "dedup_on_append": true}"#).unwrap();
        let config = EngineConfig::from_json_path(&path).unwrap();
        assert_eq!(config.preview_rows, 10);
        assert!(config.dedup_on_append);

        std::fs::write(&path, r#"{"preview": 10}"#).unwrap();
        let err = EngineConfig::from_json_path(&path).unwrap_err();
        assert!(err.is_validation());
    }
}
