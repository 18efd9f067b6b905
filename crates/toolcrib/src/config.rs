//! Configuration file support.
//!
//! The file is TOML:
//!
//! ```toml
//! state_file = "/var/lib/toolcrib/state.json"
//!
//! [engine]
//! selection = "worst-first"
//! replenish_condition = "GOOD"
//! max_loan_days = 30
//! ```
//!
//! Lookup order: `--config PATH`, then `./toolcrib.toml`, then
//! `toolcrib/toolcrib.toml` under the user's config directory. A missing
//! file means defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use toolcrib_engine::EngineOptions;

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "toolcrib.toml";

/// Settings read from `toolcrib.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Ledger state file.
    pub state_file: Option<PathBuf>,
    /// Engine behavior.
    pub engine: EngineOptions,
}

impl Config {
    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read a configuration file.
    ///
    /// A relative `state_file` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config =
            Self::parse(&text).with_context(|| format!("in {}", path.display()))?;
        if let (Some(state), Some(dir)) = (&config.state_file, path.parent()) {
            if state.is_relative() {
                config.state_file = Some(dir.join(state));
            }
        }
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Find and read the configuration, or fall back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        let user = dirs::config_dir().map(|d| d.join("toolcrib").join(CONFIG_FILE_NAME));
        match [Some(local), user].into_iter().flatten().find(|p| p.is_file()) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

/// State file used when neither the command line nor the config names one.
#[must_use]
pub fn default_state_file() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("toolcrib").join("state.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolcrib_core::{Condition, SelectionPreference};

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.engine.selection, SelectionPreference::BestFirst);
    }

    #[test]
    fn test_parse_engine_section() {
        let config = Config::parse(
            r#"
            state_file = "crib.json"

            [engine]
            selection = "worst-first"
            replenish_condition = "GOOD"
            max_loan_days = 14
            "#,
        )
        .unwrap();

        assert_eq!(config.state_file, Some(PathBuf::from("crib.json")));
        assert_eq!(config.engine.selection, SelectionPreference::WorstFirst);
        assert_eq!(config.engine.replenish_condition, Condition::Good);
        assert_eq!(config.engine.max_loan_days, Some(14));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Config::parse("stat_file = \"x.json\"").is_err());
        assert!(Config::parse("[engine]\nselect = \"best-first\"").is_err());
    }

    #[test]
    fn test_bad_value_rejected() {
        assert!(Config::parse("[engine]\nreplenish_condition = \"SHINY\"").is_err());
    }
}
