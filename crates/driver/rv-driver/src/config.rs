//! Driver configuration
//!
//! Read from a TOML file whose `[passes]` table switches the post-typecheck
//! passes on and off. Every key is optional.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level driver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Pass switches
    #[serde(default)]
    pub passes: PassConfig,
}

/// Switches for the post-typecheck passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassConfig {
    /// Promote constant borrows to statics
    #[serde(default = "default_true")]
    pub static_borrow_constants: bool,

    /// Re-run the static borrow pass and fail if it changes anything
    #[serde(default)]
    pub verify_idempotent: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            static_borrow_constants: true,
            verify_idempotent: false,
        }
    }
}

impl DriverConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or unknown keys.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid driver configuration")
    }
}
