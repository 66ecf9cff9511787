use std::fmt;

use thiserror::Error as ThisError;

use super::{FetchError, IsRetryable};

/// Which mutation an [`SyncError::Apply`] failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOp {
    Upsert,
    Delete,
    ReadKeys,
    SaveVersion,
    Journal,
}

impl fmt::Display for ApplyOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplyOp::Upsert => "upsert",
            ApplyOp::Delete => "delete",
            ApplyOp::ReadKeys => "read keys",
            ApplyOp::SaveVersion => "save version",
            ApplyOp::Journal => "journal",
        })
    }
}

#[derive(Debug, ThisError)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A remote record cannot be mapped onto the local schema.
    #[error("Malformed {entity} record: {reason}")]
    MalformedRecord { entity: &'static str, reason: String },

    /// Constraint violation or other database failure while mutating a table.
    #[error("Failed to {op} `{table}`: {source}")]
    Apply {
        table: &'static str,
        op: ApplyOp,
        #[source]
        source: sqlx::Error,
    },

    /// The version changed between the update check and the apply step.
    #[error("Version cursor moved: expected {expected:?}, found {found:?}")]
    CursorMoved {
        expected: Option<String>,
        found: Option<String>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ractor error: {0}")]
    Actor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn malformed(entity: &'static str, reason: impl Into<String>) -> Self {
        SyncError::MalformedRecord {
            entity,
            reason: reason.into(),
        }
    }

    pub fn apply(table: &'static str, op: ApplyOp) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| SyncError::Apply { table, op, source }
    }
}

/// `SQLITE_BUSY`/`SQLITE_LOCKED` and their extended codes.
fn is_busy(error: &sqlx::Error) -> bool {
    if matches!(error, sqlx::Error::PoolTimedOut) {
        return true;
    }
    error
        .as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| matches!(code.as_ref(), "5" | "6" | "261" | "517"))
}

impl IsRetryable for SyncError {
    fn is_retryable(&self) -> bool {
        match self {
            SyncError::Fetch(e) => e.is_retryable(),
            SyncError::CursorMoved { .. } => true,
            SyncError::Apply { source, .. } | SyncError::Database(source) => is_busy(source),
            _ => false,
        }
    }
}
