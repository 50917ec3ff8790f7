use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::paths::{assignment_config_path, ensure_parent_dir};

/// Upper bound on parameter slots per student, as accepted by the template sheets.
pub const MAX_DUMMY_COUNT: usize = 100;

/// Per-assignment settings handed to every correction call.
///
/// Loaded from `{STORAGE_ROOT}/{codename}/config.json`. Missing fields fall
/// back to the defaults below, a missing file falls back to
/// [`AssignmentConfig::default_config`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AssignmentConfig {
    /// Short identifier used in storage paths and attachment names.
    #[serde(default = "default_codename")]
    pub codename: String,

    /// Human-readable title, forwarded to the notifier.
    #[serde(default)]
    pub title: String,

    /// Number of graded attempts per exercise before the student is blocked.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Number of per-student parameter values substituted into the template.
    #[serde(default = "default_dummy_count")]
    pub dummy_count: usize,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl AssignmentConfig {
    pub fn default_config() -> Self {
        AssignmentConfig {
            codename: default_codename(),
            title: String::new(),
            max_attempts: default_max_attempts(),
            dummy_count: default_dummy_count(),
        }
    }

    /// Checks the invariants every correction relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts < 1 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.dummy_count > MAX_DUMMY_COUNT {
            return Err(format!(
                "dummy_count must not exceed {MAX_DUMMY_COUNT} (got {})",
                self.dummy_count
            ));
        }
        if self.codename.trim().is_empty() {
            return Err("codename must not be empty".to_string());
        }
        Ok(())
    }

    /// Reads and validates a config file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|_| format!("Failed to read config file at {path:?}"))?;
        let cfg: AssignmentConfig = serde_json::from_str(&contents)
            .map_err(|_| "Invalid config JSON format".to_string())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads the config for `codename` from the storage root.
    ///
    /// A missing file yields the defaults with the codename filled in.
    pub fn get_assignment_config(codename: &str) -> Result<Self, String> {
        let path = assignment_config_path(codename);
        if !path.exists() {
            tracing::debug!(%codename, "No config.json found, using defaults");
            return Ok(AssignmentConfig {
                codename: codename.to_string(),
                ..Self::default_config()
            });
        }
        Self::load_from(&path)
    }

    pub fn save(&self) -> Result<(), String> {
        let path = assignment_config_path(&self.codename);
        ensure_parent_dir(&path)
            .map_err(|e| format!("Failed to create config directory: {e:?}"))?;

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config to JSON: {e}"))?;

        fs::write(&path, json).map_err(|e| format!("Failed to write config file to disk: {e:?}"))?;

        Ok(())
    }
}

// Default functions

fn default_codename() -> String {
    "assignment".to_string()
}

fn default_max_attempts() -> usize {
    3
}

fn default_dummy_count() -> usize {
    8
}
