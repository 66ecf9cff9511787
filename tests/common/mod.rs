#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use zywrap_mirror::error::FetchError;
use zywrap_mirror::mirror::BatchOptions;
use zywrap_mirror::remote::RemoteCatalog;
use zywrap_mirror::sync::SyncEngine;
use zywrap_schema::{BundleDocument, UpdateCheck};

/// Fresh SQLite file per test, unique per process and call.
pub fn temp_database_url(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "zywrap-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    format!("sqlite:{}", temp_path.display())
}

pub async fn fresh_pool(tag: &str) -> SqlitePool {
    zywrap_mirror::db::connect(&temp_database_url(tag))
        .await
        .expect("failed to open test database")
}

pub fn check(value: Value) -> UpdateCheck {
    serde_json::from_value(value).expect("invalid update check fixture")
}

pub fn bundle(value: Value) -> BundleDocument {
    serde_json::from_value(value).expect("invalid bundle fixture")
}

/// Scripted remote: hands out queued update checks in order, then
/// `NO_CHANGES`, and always serves the same bundle.
#[derive(Default)]
pub struct FakeRemote {
    checks: Mutex<VecDeque<UpdateCheck>>,
    bundle: Mutex<Option<BundleDocument>>,
    seen_versions: Mutex<Vec<Option<String>>>,
    seen_bundle_urls: Mutex<Vec<Option<String>>>,
    /// Written to the store during the next check, like a concurrent writer.
    race: Mutex<Option<(SqlitePool, String)>>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_check(&self, check: UpdateCheck) {
        self.checks.lock().unwrap().push_back(check);
    }

    pub fn set_bundle(&self, bundle: BundleDocument) {
        *self.bundle.lock().unwrap() = Some(bundle);
    }

    pub fn race_version_on_next_check(&self, pool: SqlitePool, version: &str) {
        *self.race.lock().unwrap() = Some((pool, version.to_string()));
    }

    pub fn seen_versions(&self) -> Vec<Option<String>> {
        self.seen_versions.lock().unwrap().clone()
    }

    pub fn seen_bundle_urls(&self) -> Vec<Option<String>> {
        self.seen_bundle_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteCatalog for FakeRemote {
    async fn check_updates(&self, from_version: Option<&str>) -> Result<UpdateCheck, FetchError> {
        self.seen_versions
            .lock()
            .unwrap()
            .push(from_version.map(str::to_string));

        let race = self.race.lock().unwrap().take();
        if let Some((pool, version)) = race {
            zywrap_mirror::db::save_version(&pool, &version)
                .await
                .expect("failed to move version");
        }

        let next = self.checks.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| check(serde_json::json!({"mode": "NO_CHANGES"}))))
    }

    async fn fetch_bundle(&self, url: Option<&str>) -> Result<BundleDocument, FetchError> {
        self.seen_bundle_urls
            .lock()
            .unwrap()
            .push(url.map(str::to_string));

        self.bundle
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::BundleRejected {
                content_type: "application/json".to_string(),
                body: r#"{"error":"no bundle"}"#.to_string(),
            })
    }
}

pub fn engine(pool: &SqlitePool, remote: Arc<FakeRemote>) -> SyncEngine {
    SyncEngine::new(pool.clone(), remote, BatchOptions::default())
}

/// Like [`engine`] but with tiny pages, so paging paths are exercised.
pub fn paged_engine(pool: &SqlitePool, remote: Arc<FakeRemote>) -> SyncEngine {
    SyncEngine::new(
        pool.clone(),
        remote,
        BatchOptions {
            upsert_batch_size: 2,
            delete_batch_size: 1,
        },
    )
}

pub async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count query failed")
}

pub async fn codes(pool: &SqlitePool, table: &str) -> Vec<String> {
    sqlx::query_scalar(&format!("SELECT code FROM {table} ORDER BY code"))
        .fetch_all(pool)
        .await
        .expect("code query failed")
}

pub async fn template_keys(pool: &SqlitePool) -> Vec<(String, String)> {
    sqlx::query_as("SELECT type, code FROM block_templates ORDER BY type, code")
        .fetch_all(pool)
        .await
        .expect("template query failed")
}

pub async fn version(pool: &SqlitePool) -> Option<String> {
    zywrap_mirror::db::current_version(pool)
        .await
        .expect("version query failed")
}

/// The v1 bundle: 3 categories, 2 languages, 1 wrapper, in the mapping
/// shape the export archive uses.
pub fn bundle_v1() -> Value {
    serde_json::json!({
        "version": "v1",
        "categories": {
            "legal": {"name": "Legal"},
            "marketing": {"name": "Marketing"},
            "support": {"name": "Support"}
        },
        "languages": {"en": "English", "fr": "French"},
        "aiModels": {
            "gpt-4o": {"name": "GPT-4o", "provId": "openai"}
        },
        "templates": {
            "tone": {"formal": "Formal", "casual": "Casual"},
            "style": {"formal": "Formal style"}
        },
        "wrappers": {
            "contract-review": {
                "name": "Contract review",
                "desc": "Reviews contracts",
                "cat": "marketing",
                "featured": false,
                "base": true
            }
        }
    })
}
