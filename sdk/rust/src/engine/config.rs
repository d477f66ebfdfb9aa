use std::collections::BTreeMap;

use serde_json::Value;

use crate::filters::CompilerOptions;

/// Default soft-delete marker column
pub const DEFAULT_SOFT_DELETE_COLUMN: &str = "isDeleted";

/// Default soft-delete marker value
pub const DEFAULT_SOFT_DELETE_MARKER: &str = "true";

/// Engine settings
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub compiler: CompilerOptions,
    pub soft_delete: SoftDeleteConfig,
    /// Index definitions keyed by index name, applied by `create_index`
    pub index_settings: BTreeMap<String, Value>,
}

/// Soft-delete detection policy settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftDeleteConfig {
    pub enabled: bool,
    pub column: String,
    pub marker: String,
}

impl Default for SoftDeleteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            column: DEFAULT_SOFT_DELETE_COLUMN.to_string(),
            marker: DEFAULT_SOFT_DELETE_MARKER.to_string(),
        }
    }
}
