//! Sync orchestration: one pass = update check, optional bundle download,
//! normalization, then a single transaction that applies the plan and moves
//! the version cursor.

mod actor;
mod engine;
mod report;

pub use actor::{SyncActorHandle, SyncActorMessage, spawn};
pub use engine::SyncEngine;
pub use report::{SyncOutcome, SyncReport, SyncState};
