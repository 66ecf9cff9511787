use serde::{Deserialize, Serialize};

/// Sync pass tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Rows per multi-row `INSERT ... ON CONFLICT` statement.
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,

    /// Keys per `DELETE ... WHERE code IN (...)` statement.
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,

    /// Name of the JSON document inside the bundle archive.
    #[serde(default = "default_bundle_entry")]
    pub bundle_entry: String,

    /// Periodic sync in `serve` mode; `0` disables it.
    #[serde(default)]
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upsert_batch_size: default_upsert_batch_size(),
            delete_batch_size: default_delete_batch_size(),
            bundle_entry: default_bundle_entry(),
            interval_secs: 0,
        }
    }
}

fn default_upsert_batch_size() -> usize {
    1000
}

fn default_delete_batch_size() -> usize {
    2000
}

fn default_bundle_entry() -> String {
    "zywrap-data.json".to_string()
}
