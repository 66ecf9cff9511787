//! Read-side queries behind the HTTP API.

use sqlx::SqlitePool;
use std::collections::BTreeMap;

use crate::db::models::{
    DbAiModel, DbBlockTemplate, DbCategory, DbLanguage, DbSyncRun, DbWrapper,
};
use crate::error::SyncError;

pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<DbCategory>, SyncError> {
    let rows = sqlx::query_as::<_, DbCategory>(
        r#"
        SELECT code, name
        FROM categories
        ORDER BY ordering ASC, code ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_languages(pool: &SqlitePool) -> Result<Vec<DbLanguage>, SyncError> {
    let rows = sqlx::query_as::<_, DbLanguage>(
        r#"
        SELECT code, name
        FROM languages
        ORDER BY ordering ASC, code ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_ai_models(pool: &SqlitePool) -> Result<Vec<DbAiModel>, SyncError> {
    let rows = sqlx::query_as::<_, DbAiModel>(
        r#"
        SELECT code, name, provider_id
        FROM ai_models
        ORDER BY ordering ASC, code ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Block templates grouped by their type, each group ordered by name.
pub async fn block_templates_by_type(
    pool: &SqlitePool,
) -> Result<BTreeMap<String, Vec<DbBlockTemplate>>, SyncError> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        SELECT type, code, name
        FROM block_templates
        ORDER BY type ASC, name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut grouped: BTreeMap<String, Vec<DbBlockTemplate>> = BTreeMap::new();
    for (block_type, code, name) in rows {
        grouped
            .entry(block_type)
            .or_default()
            .push(DbBlockTemplate { code, name });
    }
    Ok(grouped)
}

pub async fn wrappers_by_category(
    pool: &SqlitePool,
    category_code: &str,
) -> Result<Vec<DbWrapper>, SyncError> {
    let rows = sqlx::query_as::<_, DbWrapper>(
        r#"
        SELECT code, name, description, featured, base
        FROM wrappers
        WHERE category_code = ?
        ORDER BY ordering ASC, code ASC
        "#,
    )
    .bind(category_code)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn recent_sync_runs(pool: &SqlitePool, limit: u32) -> Result<Vec<DbSyncRun>, SyncError> {
    let rows = sqlx::query_as::<_, DbSyncRun>(
        r#"
        SELECT run_id, mode, from_version, to_version, upserted, deleted, started_at, finished_at
        FROM sync_runs
        ORDER BY started_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
