use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::router::AppState;
use crate::db::{
    DbAiModel, DbBlockTemplate, DbCategory, DbLanguage, DbSyncRun, DbWrapper, current_version,
    queries,
};
use crate::error::SyncError;
use crate::sync::SyncOutcome;

const DEFAULT_RUN_LIMIT: u32 = 20;
const MAX_RUN_LIMIT: u32 = 200;

pub(super) async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<DbCategory>>, SyncError> {
    Ok(Json(queries::list_categories(&state.pool).await?))
}

pub(super) async fn list_languages(
    State(state): State<AppState>,
) -> Result<Json<Vec<DbLanguage>>, SyncError> {
    Ok(Json(queries::list_languages(&state.pool).await?))
}

pub(super) async fn list_ai_models(
    State(state): State<AppState>,
) -> Result<Json<Vec<DbAiModel>>, SyncError> {
    Ok(Json(queries::list_ai_models(&state.pool).await?))
}

pub(super) async fn list_block_templates(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, Vec<DbBlockTemplate>>>, SyncError> {
    Ok(Json(queries::block_templates_by_type(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
pub(super) struct WrappersQuery {
    category: Option<String>,
}

/// Wrappers of one category; no `category` means no wrappers.
pub(super) async fn list_wrappers(
    State(state): State<AppState>,
    Query(query): Query<WrappersQuery>,
) -> Result<Json<Vec<DbWrapper>>, SyncError> {
    let Some(category) = query.category.filter(|c| !c.is_empty()) else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(
        queries::wrappers_by_category(&state.pool, &category).await?,
    ))
}

#[derive(Debug, Serialize)]
pub(super) struct VersionBody {
    version: Option<String>,
}

pub(super) async fn get_version(
    State(state): State<AppState>,
) -> Result<Json<VersionBody>, SyncError> {
    let version = current_version(&state.pool).await?;
    Ok(Json(VersionBody { version }))
}

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    limit: Option<u32>,
}

pub(super) async fn list_sync_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<DbSyncRun>>, SyncError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RUN_LIMIT)
        .clamp(1, MAX_RUN_LIMIT);
    Ok(Json(queries::recent_sync_runs(&state.pool, limit).await?))
}

/// Runs one pass through the sync actor and returns its outcome.
pub(super) async fn trigger_sync(
    State(state): State<AppState>,
) -> Result<Json<SyncOutcome>, SyncError> {
    let Some(sync) = state.sync.as_ref() else {
        return Err(SyncError::Config(
            "no remote configured for this server".to_string(),
        ));
    };
    info!("manual sync requested");
    Ok(Json(sync.run_sync().await?))
}
