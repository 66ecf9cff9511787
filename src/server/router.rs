use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, Version, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use sqlx::SqlitePool;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::handlers;
use crate::error::{ApiErrorBody, ApiErrorObject};
use crate::sync::SyncActorHandle;

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// `None` serves the mirror read-only; `POST /api/sync` then answers 503.
    pub sync: Option<SyncActorHandle>,
}

impl AppState {
    pub fn new(pool: SqlitePool, sync: Option<SyncActorHandle>) -> Self {
        Self { pool, sync }
    }
}

async fn not_found_handler(req: Request) -> (StatusCode, Json<ApiErrorBody>) {
    let body = ApiErrorObject {
        code: "NOT_FOUND".to_string(),
        message: format!("No route for {} {}.", req.method(), req.uri().path()),
        details: None,
    };
    (StatusCode::NOT_FOUND, Json(ApiErrorBody { inner: body }))
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(|| Uuid::new_v4().simple().to_string(), str::to_string);

    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis();
    let path = uri.path();
    let protocol = format_http_version(version);

    let line = format!(
        "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms | {}",
        status.as_u16(),
        request_id,
        method.as_str(),
        protocol,
        path,
        latency_ms,
        user_agent
    );
    if status.is_server_error() {
        error!("{line}");
    } else if status.is_client_error() {
        warn!("{line}");
    } else {
        info!("{line}");
    }

    resp
}

pub fn mirror_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/languages", get(handlers::list_languages))
        .route("/api/ai-models", get(handlers::list_ai_models))
        .route("/api/block-templates", get(handlers::list_block_templates))
        .route("/api/wrappers", get(handlers::list_wrappers))
        .route("/api/version", get(handlers::get_version))
        .route("/api/sync-runs", get(handlers::list_sync_runs))
        .route("/api/sync", post(handlers::trigger_sync));

    Router::new()
        .merge(api)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}
