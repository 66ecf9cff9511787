mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::{FakeRemote, bundle, bundle_v1, check, engine, fresh_pool};
use serde_json::{Value, json};
use tower::ServiceExt;
use zywrap_mirror::server::{AppState, mirror_router};

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri)).await
}

async fn send(app: &Router, req: axum::http::request::Builder) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(req.body(Body::empty()).expect("failed to build request"))
        .await
        .expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("response body was not JSON")
    };
    (status, value)
}

#[tokio::test]
async fn read_endpoints_serve_the_mirror() {
    let pool = fresh_pool("api-read").await;
    engine(&pool, FakeRemote::new())
        .import_bundle(&bundle(bundle_v1()))
        .await
        .unwrap();
    let app = mirror_router(AppState::new(pool, None));

    let (status, body) = get_json(&app, "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"code": "legal", "name": "Legal"},
            {"code": "marketing", "name": "Marketing"},
            {"code": "support", "name": "Support"}
        ])
    );

    let (_, body) = get_json(&app, "/api/languages").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = get_json(&app, "/api/ai-models").await;
    assert_eq!(body[0]["provider_id"], "openai");

    let (_, body) = get_json(&app, "/api/block-templates").await;
    assert_eq!(
        body,
        json!({
            "style": [{"code": "formal", "name": "Formal style"}],
            "tone": [
                {"code": "casual", "name": "Casual"},
                {"code": "formal", "name": "Formal"}
            ]
        })
    );

    let (_, body) = get_json(&app, "/api/wrappers?category=marketing").await;
    assert_eq!(
        body,
        json!([{
            "code": "contract-review",
            "name": "Contract review",
            "description": "Reviews contracts",
            "featured": false,
            "base": true
        }])
    );

    let (_, body) = get_json(&app, "/api/wrappers?category=legal").await;
    assert_eq!(body, json!([]));
    let (_, body) = get_json(&app, "/api/wrappers").await;
    assert_eq!(body, json!([]));

    let (_, body) = get_json(&app, "/api/version").await;
    assert_eq!(body, json!({"version": "v1"}));

    let (_, body) = get_json(&app, "/api/sync-runs?limit=5").await;
    let runs = body.as_array().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["mode"], "IMPORT");
    assert_eq!(runs[0]["to_version"], "v1");

    let (status, body) = get_json(&app, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "No route for GET /api/nope.");
}

#[tokio::test]
async fn sync_trigger_without_remote_is_unavailable() {
    let pool = fresh_pool("api-no-sync").await;
    let app = mirror_router(AppState::new(pool, None));

    let (status, body) = send(&app, Request::builder().method("POST").uri("/api/sync")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SYNC_DISABLED");
}

#[tokio::test]
async fn sync_trigger_runs_a_pass_through_the_actor() {
    let pool = fresh_pool("api-sync").await;
    let remote = FakeRemote::new();
    remote.set_bundle(bundle(bundle_v1()));
    remote.push_check(check(json!({"mode": "FULL_RESET", "wrappers": {"version": "v1"}})));
    remote.push_check(check(json!({
        "mode": "DELTA_UPDATE",
        "metadata": {"languages": [{"code": "en", "name": "English", "ordering": 1}]},
        "deletions": [{"type": "Widget", "code": "w"}]
    })));

    let handle = zywrap_mirror::sync::spawn(engine(&pool, remote))
        .await
        .unwrap();
    let app = mirror_router(AppState::new(pool, Some(handle.clone())));

    let (status, body) = send(&app, Request::builder().method("POST").uri("/api/sync")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "committed");
    assert_eq!(body["detail"]["to_version"], "v1");

    // The second scripted check carries an unknown deletion tag.
    let (status, body) = send(&app, Request::builder().method("POST").uri("/api/sync")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "MALFORMED_RECORD");
    assert_eq!(body["error"]["details"]["entity"], "deletions");

    let (status, body) = send(&app, Request::builder().method("POST").uri("/api/sync")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "no_changes");

    handle.stop();
}
