//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Router configuration, constructed once at startup and passed by
/// reference into the pipeline — no ambient globals.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Path to the libSQL database file.
    pub db_path: PathBuf,
    /// Name of the documents table.
    pub table: String,
    /// Root folder the per-class archive folders live under.
    pub archive_root: PathBuf,
    /// Optional low-confidence gate: records scoring below this are routed
    /// to the review folder. Unset by default.
    pub review_below: Option<f64>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/doc-router.db"),
            table: "documents".to_string(),
            archive_root: PathBuf::from("./archive"),
            review_below: None,
        }
    }
}

impl RouterConfig {
    /// Build a config from `DOC_ROUTER_*` environment variables, falling
    /// back to the documented defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = std::env::var("DOC_ROUTER_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let table = std::env::var("DOC_ROUTER_TABLE").unwrap_or(defaults.table);

        let archive_root = std::env::var("DOC_ROUTER_ARCHIVE_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.archive_root);

        let review_below = match std::env::var("DOC_ROUTER_REVIEW_BELOW") {
            Ok(raw) => Some(raw.parse::<f64>().map_err(|e| ConfigError::InvalidValue {
                key: "DOC_ROUTER_REVIEW_BELOW".to_string(),
                message: e.to_string(),
            })?),
            Err(_) => None,
        };

        Ok(Self {
            db_path,
            table,
            archive_root,
            review_below,
        })
    }
}
