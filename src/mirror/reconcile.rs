//! Full-mirror reconciliation.
//!
//! `reconcile` upserts the authoritative rows first and only then diffs the
//! local key set against them, so nothing is deleted before the incoming
//! rows have been written. It assumes `rows` is the complete remote set for
//! the table and must never be fed a delta.

use sqlx::{Row, SqliteConnection};
use std::collections::HashSet;
use tracing::{debug, info};

use super::delete::delete_by_keys;
use super::keys::{PrimaryKey, RowKey};
use super::rows::MirrorRow;
use super::table::{TableSpec, quote_ident};
use super::upsert::upsert_rows;
use super::{BatchOptions, TableReport};
use crate::error::{ApplyOp, SyncError};

/// Upsert `rows`, then delete every local key absent from them.
pub async fn reconcile<R: MirrorRow>(
    conn: &mut SqliteConnection,
    rows: &[R],
    batch: &BatchOptions,
) -> Result<TableReport, SyncError> {
    let table = R::TABLE;
    info!(table = table.name, rows = rows.len(), "mirroring table");

    let upserted = upsert_rows(conn, rows, batch.upsert_batch_size).await?;
    let authoritative: HashSet<RowKey> = rows.iter().map(MirrorRow::key).collect();
    let deleted = prune(conn, &table, &authoritative, batch).await?;

    Ok(TableReport {
        table: table.name,
        upserted,
        deleted,
    })
}

/// Deletes local rows of `table` whose key is not in `authoritative`.
pub async fn prune(
    conn: &mut SqliteConnection,
    table: &TableSpec,
    authoritative: &HashSet<RowKey>,
    batch: &BatchOptions,
) -> Result<u64, SyncError> {
    let local = local_keys(conn, table).await?;
    let mut stale: Vec<RowKey> = local.difference(authoritative).cloned().collect();
    if stale.is_empty() {
        return Ok(0);
    }
    stale.sort();

    debug!(
        table = table.name,
        stale = stale.len(),
        "cleaning up obsolete records"
    );
    delete_by_keys(conn, table, &stale, batch.delete_batch_size).await
}

/// Current key set of `table`.
pub async fn local_keys(
    conn: &mut SqliteConnection,
    table: &TableSpec,
) -> Result<HashSet<RowKey>, SyncError> {
    let sql = format!(
        "SELECT {} FROM {}",
        table.key_column_list(),
        quote_ident(table.name)
    );
    let rows = sqlx::query(&sql)
        .fetch_all(&mut *conn)
        .await
        .map_err(SyncError::apply(table.name, ApplyOp::ReadKeys))?;

    let width = table.primary_key.columns().len();
    rows.iter()
        .map(|row| {
            let parts = (0..width)
                .map(|idx| row.try_get::<String, _>(idx))
                .collect::<Result<Vec<_>, _>>()
                .map_err(SyncError::apply(table.name, ApplyOp::ReadKeys))?;
            Ok(match table.primary_key {
                PrimaryKey::Simple(_) => RowKey::Simple(parts.into_iter().next().unwrap_or_default()),
                PrimaryKey::Compound(_) => RowKey::Compound(parts),
            })
        })
        .collect()
}
