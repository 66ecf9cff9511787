//! The single version cursor of the mirror.

use sqlx::{Executor, Sqlite};

use crate::error::{ApplyOp, SyncError};

pub const VERSION_KEY: &str = "data_version";

/// Last successfully applied remote version, `None` before the first import.
pub async fn current_version<'e, E>(executor: E) -> Result<Option<String>, SyncError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let version: Option<String> =
        sqlx::query_scalar("SELECT setting_value FROM settings WHERE setting_key = ?")
            .bind(VERSION_KEY)
            .fetch_optional(executor)
            .await?;
    Ok(version)
}

/// Persists the cursor. Callers only do this as the last write of a pass.
pub async fn save_version<'e, E>(executor: E, version: &str) -> Result<(), SyncError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO settings (setting_key, setting_value)
        VALUES (?, ?)
        ON CONFLICT(setting_key) DO UPDATE SET setting_value = excluded.setting_value
        "#,
    )
    .bind(VERSION_KEY)
    .bind(version)
    .execute(executor)
    .await
    .map_err(SyncError::apply("settings", ApplyOp::SaveVersion))?;
    Ok(())
}
