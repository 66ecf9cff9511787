//! Database module: connection, schema, version cursor and read queries.
//!
//! Layout:
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `pool.rs`: connection options and schema bootstrap
//! - `version.rs`: the `data_version` cursor
//! - `journal.rs`: `sync_runs` bookkeeping (also the cross-process write lock)
//! - `models.rs` / `queries.rs`: read side used by the HTTP API

pub mod journal;
pub mod models;
pub mod pool;
pub mod queries;
pub mod schema;
pub mod version;

pub use models::{DbAiModel, DbBlockTemplate, DbCategory, DbLanguage, DbSyncRun, DbWrapper};
pub use pool::connect;
pub use schema::SQLITE_INIT;
pub use version::{VERSION_KEY, current_version, save_version};
