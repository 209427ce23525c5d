//! Configuration and constants for the engine and CLI.

use super::error::ConfigError;
use crate::aggregator::Combine;
use crate::table::ColumnPolicy;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current literal export schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Suffix turning an exclusive metric name into its inclusive counterpart
pub const INCLUSIVE_SUFFIX: &str = " (inc)";

/// Provenance column added by unify when rows exist on one side only
pub const MISSING_NODE_COLUMN: &str = "_missing_node";
pub const LEFT_ONLY_MARKER: &str = "L";
pub const RIGHT_ONLY_MARKER: &str = "R";

/// Column holding the display name of each node
pub const NAME_COLUMN: &str = "name";

/// Exclusive metric created by the folded-stack importer
pub const DEFAULT_FOLDED_METRIC: &str = "samples";

/// Metric given to every node by `from_paths`
pub const DEFAULT_PATH_METRIC: &str = "time";

/// Inclusive column name for an exclusive metric
pub fn inclusive_name(exclusive: &str) -> String {
    format!("{}{}", exclusive, INCLUSIVE_SUFFIX)
}

/// Whether a metric name denotes an inclusive metric
pub fn is_inclusive_name(metric: &str) -> bool {
    metric.contains("(inc)")
}

/// Engine-wide defaults, passed explicitly to the operations that need them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Row re-aggregation policy used by squash
    #[serde(default)]
    pub squash: ColumnPolicy,

    /// Aggregation used by group-by
    #[serde(default)]
    pub groupby: ColumnPolicy,

    /// Operator the `summary` command folds each root's subgraph with
    #[serde(default)]
    pub combine: Combine,

    /// Exclusive metric name for folded-stack input
    #[serde(default = "default_folded_metric")]
    pub folded_metric: String,
}

fn default_folded_metric() -> String {
    DEFAULT_FOLDED_METRIC.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            squash: ColumnPolicy::default(),
            groupby: ColumnPolicy::default(),
            combine: Combine::default(),
            folded_metric: default_folded_metric(),
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.folded_metric.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "folded_metric cannot be empty".to_string(),
            ));
        }
        if is_inclusive_name(&self.folded_metric) {
            return Err(ConfigError::Invalid(format!(
                "folded_metric '{}' must name an exclusive metric",
                self.folded_metric
            )));
        }
        Ok(())
    }
}

/// Load engine configuration from a TOML file
///
/// # Errors
/// * `ConfigError::Io` - If the file cannot be read
/// * `ConfigError::TomlParse` - If the TOML is invalid
/// * `ConfigError::Invalid` - If values are out of range
///
/// # Example
/// ```ignore
/// let config = load_config("callframe.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading engine config from: {}", path.display());
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse engine configuration from TOML text
pub fn parse_config(contents: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}
