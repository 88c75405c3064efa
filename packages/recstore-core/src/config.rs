//! Store configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Physical table naming for every record type
    pub table_names: TableNames,
    /// Settings for the in-memory backend
    pub memory: MemoryConfig,
}

impl StoreConfig {
    /// Parses a configuration from JSON; absent keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// How a read-write transaction applies its writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Writes hit the shared tables immediately; abort cannot undo them
    #[default]
    Direct,
    /// Writes go to per-transaction table copies swapped in on commit
    Staged,
}

/// In-memory backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Initial entry capacity of a lazily created table
    pub initial_table_capacity: usize,
    /// Write application strategy
    pub write_mode: WriteMode,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            initial_table_capacity: 16,
            write_mode: WriteMode::Direct,
        }
    }
}

/// Maps (record type, key name) to a physical table name.
///
/// Without an override the table is named `<record>_<key>`, where the
/// primary key's name is [`TableNames::PRIMARY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    /// Overrides keyed by `"<record>.<key>"`
    pub overrides: BTreeMap<String, String>,
}

impl TableNames {
    /// Key name used for the primary table.
    pub const PRIMARY: &'static str = "pk";

    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one key of a record type to an explicit table.
    pub fn with_override(
        mut self,
        record: &str,
        key: &str,
        table: impl Into<String>,
    ) -> Self {
        self.overrides
            .insert(format!("{record}.{key}"), table.into());
        self
    }

    /// Resolves the physical table for a key of a record type.
    pub fn resolve(&self, record: &str, key: &str) -> String {
        self.overrides
            .get(&format!("{record}.{key}"))
            .cloned()
            .unwrap_or_else(|| format!("{record}_{key}"))
    }
}
