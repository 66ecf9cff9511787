use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use super::rows::MirrorRow;
use super::table::{TableSpec, quote_ident};
use crate::error::{ApplyOp, SyncError};

/// Writes `rows` into `R::TABLE` with insert-or-overwrite semantics.
///
/// Every non-key column takes the incoming value (last writer wins). A row
/// whose values already match is left untouched, so the returned count is
/// the number of rows actually inserted or changed. Rows are sent in pages
/// of `batch_size` to bound statement size.
pub async fn upsert_rows<R: MirrorRow>(
    conn: &mut SqliteConnection,
    rows: &[R],
    batch_size: usize,
) -> Result<u64, SyncError> {
    let table = R::TABLE;
    if rows.is_empty() {
        return Ok(0);
    }

    let insert_head = format!(
        "INSERT INTO {} ({}) ",
        quote_ident(table.name),
        table.column_list()
    );
    let conflict_clause = conflict_clause(&table);

    let mut applied = 0;
    for (page, chunk) in rows.chunks(batch_size.max(1)).enumerate() {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(insert_head.as_str());
        qb.push_values(chunk, |mut b, row| row.push_columns(&mut b));
        qb.push(conflict_clause.as_str());

        let res = qb
            .build()
            .execute(&mut *conn)
            .await
            .map_err(SyncError::apply(table.name, ApplyOp::Upsert))?;

        applied += res.rows_affected();
        debug!(
            table = table.name,
            page,
            rows = chunk.len(),
            affected = res.rows_affected(),
            "upsert page applied"
        );
    }

    Ok(applied)
}

fn conflict_clause(table: &TableSpec) -> String {
    let updates: Vec<String> = table.update_columns().map(quote_ident).collect();
    if updates.is_empty() {
        return format!(" ON CONFLICT ({}) DO NOTHING", table.key_column_list());
    }

    let target = quote_ident(table.name);
    let assignments = updates
        .iter()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let changed = updates
        .iter()
        .map(|c| format!("{target}.{c} IS NOT excluded.{c}"))
        .collect::<Vec<_>>()
        .join(" OR ");

    format!(
        " ON CONFLICT ({}) DO UPDATE SET {assignments} WHERE {changed}",
        table.key_column_list()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::table::{BLOCK_TEMPLATES, CATEGORIES};

    #[test]
    fn conflict_clause_targets_the_declared_key() {
        let clause = conflict_clause(&CATEGORIES);
        assert!(clause.starts_with(r#" ON CONFLICT ("code") DO UPDATE SET "name" = excluded."name""#));
        assert!(clause.contains(r#""categories"."ordering" IS NOT excluded."ordering""#));

        let clause = conflict_clause(&BLOCK_TEMPLATES);
        assert!(clause.contains(r#"ON CONFLICT ("type", "code")"#));
        assert!(!clause.contains(r#""type" = excluded"#));
    }
}
