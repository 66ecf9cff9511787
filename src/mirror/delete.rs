use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use super::keys::{PrimaryKey, RowKey};
use super::table::{TableSpec, quote_ident};
use crate::error::{ApplyOp, SyncError};

/// Removes rows by key. Missing keys are ignored.
///
/// Simple keys go out as `IN (...)` pages of `batch_size`; compound keys are
/// deleted one statement per key.
pub async fn delete_by_keys(
    conn: &mut SqliteConnection,
    table: &TableSpec,
    keys: &[RowKey],
    batch_size: usize,
) -> Result<u64, SyncError> {
    if keys.is_empty() {
        return Ok(0);
    }
    if let Some(bad) = keys.iter().find(|k| !k.fits(table.primary_key)) {
        return Err(SyncError::malformed(
            table.name,
            format!("key `{bad}` does not match the table key"),
        ));
    }

    let removed = match table.primary_key {
        PrimaryKey::Simple(column) => {
            delete_simple(conn, table, column, keys, batch_size.max(1)).await?
        }
        PrimaryKey::Compound(columns) => delete_compound(conn, table, columns, keys).await?,
    };

    debug!(
        table = table.name,
        requested = keys.len(),
        removed,
        "delete applied"
    );
    Ok(removed)
}

async fn delete_simple(
    conn: &mut SqliteConnection,
    table: &TableSpec,
    column: &str,
    keys: &[RowKey],
    batch_size: usize,
) -> Result<u64, SyncError> {
    let head = format!(
        "DELETE FROM {} WHERE {} IN (",
        quote_ident(table.name),
        quote_ident(column)
    );

    let mut removed = 0;
    for chunk in keys.chunks(batch_size) {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(head.as_str());
        let mut list = qb.separated(", ");
        for key in chunk {
            list.push_bind(key.parts()[0].clone());
        }
        list.push_unseparated(")");

        let res = qb
            .build()
            .execute(&mut *conn)
            .await
            .map_err(SyncError::apply(table.name, ApplyOp::Delete))?;
        removed += res.rows_affected();
    }
    Ok(removed)
}

async fn delete_compound(
    conn: &mut SqliteConnection,
    table: &TableSpec,
    columns: &[&str],
    keys: &[RowKey],
) -> Result<u64, SyncError> {
    let predicate = columns
        .iter()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(" AND ");
    let sql = format!("DELETE FROM {} WHERE {predicate}", quote_ident(table.name));

    let mut removed = 0;
    for key in keys {
        let mut query = sqlx::query(&sql);
        for part in key.parts() {
            query = query.bind(part.clone());
        }
        let res = query
            .execute(&mut *conn)
            .await
            .map_err(SyncError::apply(table.name, ApplyOp::Delete))?;
        removed += res.rows_affected();
    }
    Ok(removed)
}
