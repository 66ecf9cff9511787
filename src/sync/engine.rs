use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use zywrap_schema::{BundleDocument, SyncMode, UpdateCheck};

use super::report::{SyncOutcome, SyncReport, SyncState};
use crate::codec::{self, CatalogRows, DeletionPlan};
use crate::db::{current_version, journal, save_version};
use crate::error::SyncError;
use crate::mirror::{
    BatchOptions, MirrorRow, RowKey, TableReport, delete_by_keys, prune, reconcile, table,
    upsert_rows,
};
use crate::remote::RemoteCatalog;

/// Work of one pass, fully normalized before the transaction opens.
enum ApplyPlan {
    /// Every table is mirrored onto the bundle.
    Full(CatalogRows),
    /// Upserts and explicit deletions only.
    Delta {
        upserts: CatalogRows,
        deletions: DeletionPlan,
    },
}

/// Version the pass started from, and whether it must still be current
/// once the write lock is held. Local imports do not depend on it.
struct Cursor {
    from_version: Option<String>,
    enforce: bool,
}

/// Runs sync passes against one store.
///
/// Callers must not run two passes of the same engine concurrently; the
/// [`SyncActorHandle`](super::SyncActorHandle) serializes them in-process and the
/// journal insert that opens each transaction serializes writers across
/// processes.
#[derive(Clone)]
pub struct SyncEngine {
    pool: SqlitePool,
    remote: Arc<dyn RemoteCatalog>,
    batch: BatchOptions,
}

impl SyncEngine {
    pub fn new(pool: SqlitePool, remote: Arc<dyn RemoteCatalog>, batch: BatchOptions) -> Self {
        Self {
            pool,
            remote,
            batch,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// One pass: check for updates with the stored cursor, then apply the
    /// announced mode atomically.
    pub async fn run(&self) -> Result<SyncOutcome, SyncError> {
        let run_id = Uuid::new_v4().to_string();
        let mut state = SyncState::Idle;
        let result = self.run_pass(&run_id, &mut state).await;
        state.settle(result.is_ok(), &run_id);
        result
    }

    /// Applies a local bundle as a full reset and stores its `version`.
    pub async fn import_bundle(&self, bundle: &BundleDocument) -> Result<SyncOutcome, SyncError> {
        let run_id = Uuid::new_v4().to_string();
        let mut state = SyncState::Idle;
        let result = self.import_pass(&run_id, &mut state, bundle).await;
        state.settle(result.is_ok(), &run_id);
        result
    }

    async fn run_pass(
        &self,
        run_id: &str,
        state: &mut SyncState,
    ) -> Result<SyncOutcome, SyncError> {
        let from_version = current_version(&self.pool).await?;
        state.advance(SyncState::Fetching, run_id);

        let check = self.remote.check_updates(from_version.as_deref()).await?;
        let (plan, to_version) = match &check.mode {
            SyncMode::NoChanges => {
                info!(
                    run_id = %run_id,
                    version = from_version.as_deref().unwrap_or("<none>"),
                    "catalog is up to date"
                );
                return Ok(SyncOutcome::NoChanges);
            }
            SyncMode::Unknown(mode) => {
                warn!(run_id = %run_id, mode = %mode, "unknown sync mode, nothing applied");
                return Ok(SyncOutcome::UnknownMode(mode.clone()));
            }
            SyncMode::FullReset => self.full_reset_plan(&check).await?,
            SyncMode::DeltaUpdate => delta_plan(&check)?,
        };

        let report = self
            .apply(
                run_id,
                state,
                check.mode.as_str(),
                Cursor {
                    from_version,
                    enforce: true,
                },
                plan,
                to_version,
            )
            .await?;
        Ok(SyncOutcome::Committed(report))
    }

    async fn import_pass(
        &self,
        run_id: &str,
        state: &mut SyncState,
        bundle: &BundleDocument,
    ) -> Result<SyncOutcome, SyncError> {
        let version = bundle
            .version
            .clone()
            .ok_or_else(|| SyncError::malformed("version", "bundle has no `version`"))?;
        let rows = CatalogRows::from_payload(bundle)?;
        let from_version = current_version(&self.pool).await?;

        let report = self
            .apply(
                run_id,
                state,
                "IMPORT",
                Cursor {
                    from_version,
                    enforce: false,
                },
                ApplyPlan::Full(rows),
                Some(version),
            )
            .await?;
        Ok(SyncOutcome::Committed(report))
    }

    async fn full_reset_plan(
        &self,
        check: &UpdateCheck,
    ) -> Result<(ApplyPlan, Option<String>), SyncError> {
        let wrappers = check.wrappers.as_ref();
        let bundle = self
            .remote
            .fetch_bundle(wrappers.and_then(|w| w.download_url.as_deref()))
            .await?;

        let version = wrappers
            .and_then(|w| w.version.clone())
            .or_else(|| bundle.version.clone())
            .or_else(|| check.new_version.clone())
            .ok_or_else(|| SyncError::malformed("version", "full reset without a version"))?;

        let rows = CatalogRows::from_payload(&bundle)?;
        Ok((ApplyPlan::Full(rows), Some(version)))
    }

    async fn apply(
        &self,
        run_id: &str,
        state: &mut SyncState,
        mode: &str,
        cursor: Cursor,
        plan: ApplyPlan,
        to_version: Option<String>,
    ) -> Result<SyncReport, SyncError> {
        state.advance(SyncState::Applying, run_id);

        let mut tx = self.pool.begin().await?;
        let applied = self
            .apply_in(&mut *tx, run_id, mode, &cursor, &plan, to_version.as_deref())
            .await;

        let outcome = match applied {
            Ok(tables) => tx.commit().await.map(|()| tables).map_err(SyncError::from),
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(run_id, error = %rb, "explicit rollback failed");
                }
                Err(e)
            }
        };

        match outcome {
            Ok(tables) => {
                state.advance(SyncState::Committed, run_id);
                let report = SyncReport {
                    run_id: run_id.to_string(),
                    mode: mode.to_string(),
                    from_version: cursor.from_version,
                    to_version,
                    tables,
                };
                info!(
                    run_id,
                    mode,
                    to_version = report.to_version.as_deref().unwrap_or("<unchanged>"),
                    upserted = report.upserted(),
                    deleted = report.deleted(),
                    "sync committed"
                );
                Ok(report)
            }
            Err(e) => {
                state.advance(SyncState::RolledBack, run_id);
                error!(run_id, mode, error = %e, "sync rolled back");
                Err(e)
            }
        }
    }

    async fn apply_in(
        &self,
        conn: &mut SqliteConnection,
        run_id: &str,
        mode: &str,
        cursor: &Cursor,
        plan: &ApplyPlan,
        to_version: Option<&str>,
    ) -> Result<Vec<TableReport>, SyncError> {
        journal::begin_run(conn, run_id, mode, cursor.from_version.as_deref()).await?;

        if cursor.enforce {
            let found = current_version(&mut *conn).await?;
            if found != cursor.from_version {
                return Err(SyncError::CursorMoved {
                    expected: cursor.from_version.clone(),
                    found,
                });
            }
        }

        let tables = match plan {
            ApplyPlan::Full(rows) => self.apply_full(conn, rows).await?,
            ApplyPlan::Delta { upserts, deletions } => {
                self.apply_delta(conn, upserts, deletions).await?
            }
        };

        let upserted = tables.iter().map(|t| t.upserted).sum();
        let deleted = tables.iter().map(|t| t.deleted).sum();
        journal::finish_run(conn, run_id, to_version, upserted, deleted).await?;

        match to_version {
            Some(version) => save_version(&mut *conn, version).await?,
            None => info!(run_id, "no new version announced, cursor unchanged"),
        }
        Ok(tables)
    }

    /// Mirrors every table present in the bundle. Categories are pruned
    /// last so wrappers that still point at a retiring category are
    /// reconciled away first.
    async fn apply_full(
        &self,
        conn: &mut SqliteConnection,
        rows: &CatalogRows,
    ) -> Result<Vec<TableReport>, SyncError> {
        for name in &rows.absent {
            warn!(table = *name, "entity missing from bundle, table left as is");
        }

        let categories_upserted =
            upsert_rows(conn, &rows.categories, self.batch.upsert_batch_size).await?;

        let languages = self.mirror(conn, &rows.languages, rows).await?;
        let ai_models = self.mirror(conn, &rows.ai_models, rows).await?;
        let block_templates = self.mirror(conn, &rows.block_templates, rows).await?;
        let wrappers = self.mirror(conn, &rows.wrappers, rows).await?;

        let categories_deleted = if rows.is_absent(table::CATEGORIES.name) {
            0
        } else {
            let keys: HashSet<RowKey> = rows.categories.iter().map(MirrorRow::key).collect();
            prune(conn, &table::CATEGORIES, &keys, &self.batch).await?
        };

        Ok(vec![
            TableReport {
                table: table::CATEGORIES.name,
                upserted: categories_upserted,
                deleted: categories_deleted,
            },
            languages,
            ai_models,
            block_templates,
            wrappers,
        ])
    }

    async fn mirror<R: MirrorRow>(
        &self,
        conn: &mut SqliteConnection,
        table_rows: &[R],
        rows: &CatalogRows,
    ) -> Result<TableReport, SyncError> {
        if rows.is_absent(R::TABLE.name) {
            return Ok(TableReport {
                table: R::TABLE.name,
                upserted: 0,
                deleted: 0,
            });
        }
        reconcile(conn, table_rows, &self.batch).await
    }

    /// Upserts what the patch carries, then removes exactly the listed keys.
    async fn apply_delta(
        &self,
        conn: &mut SqliteConnection,
        upserts: &CatalogRows,
        deletions: &DeletionPlan,
    ) -> Result<Vec<TableReport>, SyncError> {
        let size = self.batch.upsert_batch_size;
        let mut tables = vec![
            TableReport {
                table: table::CATEGORIES.name,
                upserted: upsert_rows(conn, &upserts.categories, size).await?,
                deleted: 0,
            },
            TableReport {
                table: table::LANGUAGES.name,
                upserted: upsert_rows(conn, &upserts.languages, size).await?,
                deleted: 0,
            },
            TableReport {
                table: table::AI_MODELS.name,
                upserted: upsert_rows(conn, &upserts.ai_models, size).await?,
                deleted: 0,
            },
            TableReport {
                table: table::BLOCK_TEMPLATES.name,
                upserted: upsert_rows(conn, &upserts.block_templates, size).await?,
                deleted: 0,
            },
            TableReport {
                table: table::WRAPPERS.name,
                upserted: upsert_rows(conn, &upserts.wrappers, size).await?,
                deleted: 0,
            },
        ];

        for (spec, keys) in deletions.in_apply_order() {
            let removed = delete_by_keys(conn, &spec, keys, self.batch.delete_batch_size).await?;
            if let Some(report) = tables.iter_mut().find(|t| t.table == spec.name) {
                report.deleted += removed;
            }
        }
        Ok(tables)
    }
}

fn delta_plan(check: &UpdateCheck) -> Result<(ApplyPlan, Option<String>), SyncError> {
    let upserts = CatalogRows::from_delta(check)?;
    let legacy = check
        .wrappers
        .as_ref()
        .map(|w| w.deletes.as_slice())
        .unwrap_or_default();
    let deletions = codec::deletions(&check.deletions, legacy)?;

    info!(
        upserts = upserts.len(),
        deletions = deletions.len(),
        new_version = check.new_version.as_deref().unwrap_or("<none>"),
        "delta patch normalized"
    );
    Ok((
        ApplyPlan::Delta { upserts, deletions },
        check.new_version.clone(),
    ))
}
