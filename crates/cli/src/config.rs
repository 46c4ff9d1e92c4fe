//! TOML configuration for `dicedist --config` and `--custom` files.
//!
//! # Example
//!
//! ```toml
//! [display]
//! bar_size = 2
//! bar_char = "="
//! bar_prefix = "|"
//! decimal_places = 2
//! sort = "key"
//! show_counts = false
//!
//! [operations.best-two]
//! pipeline = "sort select -1 -2"
//! description = "keep the two highest dice"
//! ```
//!
//! Files passed with `--custom` hold only `[operations.*]` tables.

use std::collections::BTreeMap;
use std::path::Path;

use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::CliError;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    /// Named pipelines, keyed by operation name.
    #[serde(default)]
    pub operations: BTreeMap<String, OperationDef>,
}

/// `[display]` section. Unset keys fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DisplayConfig {
    pub bar_size: Option<usize>,
    pub bar_char: Option<String>,
    pub bar_prefix: Option<String>,
    pub decimal_places: Option<usize>,
    pub sort: Option<SortOrder>,
    pub show_counts: Option<bool>,
}

/// A `--custom` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OperationsFile {
    #[serde(default)]
    pub operations: BTreeMap<String, OperationDef>,
}

/// One named pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OperationDef {
    pub pipeline: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SortOrder {
    #[default]
    Key,
    Value,
}

// ── Functions ─────────────────────────────────────────────────────────────────

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| CliError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_config(path: &Path) -> Result<Config, CliError> {
    let config: Config = read_toml(path)?;
    tracing::debug!(
        path = %path.display(),
        operations = config.operations.len(),
        "loaded configuration"
    );
    Ok(config)
}

pub(crate) fn read_operations(path: &Path) -> Result<OperationsFile, CliError> {
    read_toml(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [display]
            bar_size = 0
            sort = "value"
            show_counts = true

            [operations.best-two]
            pipeline = "sort select -1 -2"
            description = "keep the two highest dice"
            "#,
        )
        .unwrap();
        assert_eq!(config.display.bar_size, Some(0));
        assert_eq!(config.display.sort, Some(SortOrder::Value));
        assert_eq!(config.display.bar_char, None);
        assert_eq!(config.operations["best-two"].pipeline, "sort select -1 -2");
    }

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.operations.is_empty());
        assert_eq!(config.display.decimal_places, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[display]\nbar_width = 3\n").is_err());
        assert!(toml::from_str::<Config>("[colors]\n").is_err());
        assert!(toml::from_str::<OperationsFile>("[display]\nbar_size = 3\n").is_err());
        assert!(toml::from_str::<OperationsFile>(
            "[operations.x]\npipeline = \"sum\"\nparams = 1\n"
        )
        .is_err());
    }

    #[test]
    fn operation_needs_a_pipeline() {
        assert!(toml::from_str::<OperationsFile>("[operations.x]\ndescription = \"?\"\n").is_err());
    }
}
