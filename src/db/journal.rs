//! `sync_runs` bookkeeping.
//!
//! The opening insert is the first write of every pass, so it takes SQLite's
//! write lock for the rest of the transaction and keeps other writers (other
//! processes included) out until commit or rollback.

use chrono::Utc;
use sqlx::SqliteConnection;

use crate::error::{ApplyOp, SyncError};

pub async fn begin_run(
    conn: &mut SqliteConnection,
    run_id: &str,
    mode: &str,
    from_version: Option<&str>,
) -> Result<(), SyncError> {
    sqlx::query(
        r#"
        INSERT INTO sync_runs (run_id, mode, from_version, started_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(run_id)
    .bind(mode)
    .bind(from_version)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(SyncError::apply("sync_runs", ApplyOp::Journal))?;
    Ok(())
}

pub async fn finish_run(
    conn: &mut SqliteConnection,
    run_id: &str,
    to_version: Option<&str>,
    upserted: u64,
    deleted: u64,
) -> Result<(), SyncError> {
    sqlx::query(
        r#"
        UPDATE sync_runs
        SET to_version = ?, upserted = ?, deleted = ?, finished_at = ?
        WHERE run_id = ?
        "#,
    )
    .bind(to_version)
    .bind(i64::try_from(upserted).unwrap_or(i64::MAX))
    .bind(i64::try_from(deleted).unwrap_or(i64::MAX))
    .bind(Utc::now())
    .bind(run_id)
    .execute(&mut *conn)
    .await
    .map_err(SyncError::apply("sync_runs", ApplyOp::Journal))?;
    Ok(())
}
