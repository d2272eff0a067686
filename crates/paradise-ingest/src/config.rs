//! Configuration for the paradise-ingest loader.

use serde::Deserialize;

use paradise_core::NodeKind;
use paradise_graph::MaterializeMode;

/// Top-level ingest configuration.
///
/// Loaded from the `paradise.toml` `[ingest]` section or
/// `PARADISE__INGEST__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Path to the SQLite database holding the leak tables.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Node tables, ingested in this order before any edge.
    #[serde(default = "default_node_tables")]
    pub node_tables: Vec<String>,

    /// Table holding the relationships.
    #[serde(default = "default_edges_table")]
    pub edges_table: String,

    /// What to do when a row fails.
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// How handle-less records are written.
    #[serde(default)]
    pub materialize_mode: MaterializeMode,

    /// Declare the external id index before ingesting.
    #[serde(default = "default_true")]
    pub apply_schema: bool,
}

/// Reaction to a row that cannot be parsed, resolved, or written.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the table and the whole run on the first failure.
    #[default]
    FailFast,
    /// Record the failure against its row and keep going.
    Isolate,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "isolate" => Ok(Self::Isolate),
            _ => Err(format!("Invalid policy: {s}. Choose: fail-fast, isolate")),
        }
    }
}

fn default_sqlite_path() -> String {
    "./paradise.db".to_string()
}

fn default_node_tables() -> Vec<String> {
    NodeKind::ALL.iter().map(|k| k.table().to_string()).collect()
}

fn default_edges_table() -> String {
    "edges".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
            node_tables: default_node_tables(),
            edges_table: default_edges_table(),
            error_policy: ErrorPolicy::default(),
            materialize_mode: MaterializeMode::default(),
            apply_schema: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(
            config.node_tables,
            vec![
                "nodes.address",
                "nodes.entity",
                "nodes.intermediary",
                "nodes.officer",
                "nodes.other"
            ]
        );
        assert_eq!(config.edges_table, "edges");
        assert_eq!(config.error_policy, ErrorPolicy::FailFast);
        assert_eq!(config.materialize_mode, MaterializeMode::Create);
        assert!(config.apply_schema);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("fail-fast".parse::<ErrorPolicy>(), Ok(ErrorPolicy::FailFast));
        assert_eq!("Isolate".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Isolate));
        assert!("retry".parse::<ErrorPolicy>().is_err());
    }
}
