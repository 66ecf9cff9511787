//! Table-level apply engines: batched upsert, key deletion and full-mirror
//! reconciliation, all running on a caller-owned connection (normally the
//! sync transaction).

pub mod delete;
pub mod keys;
pub mod reconcile;
pub mod rows;
pub mod table;
pub mod upsert;

use serde::Serialize;

use crate::config::SyncConfig;

pub use delete::delete_by_keys;
pub use keys::{PrimaryKey, RowKey};
pub use reconcile::{local_keys, prune, reconcile};
pub use rows::{AiModelRow, BlockTemplateRow, CategoryRow, LanguageRow, MirrorRow, WrapperRow};
pub use table::TableSpec;
pub use upsert::upsert_rows;

/// Statement page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub upsert_batch_size: usize,
    pub delete_batch_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for BatchOptions {
    fn from(cfg: &SyncConfig) -> Self {
        Self {
            upsert_batch_size: cfg.upsert_batch_size.max(1),
            delete_batch_size: cfg.delete_batch_size.max(1),
        }
    }
}

/// Rows touched in one table during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: &'static str,
    pub upserted: u64,
    pub deleted: u64,
}
