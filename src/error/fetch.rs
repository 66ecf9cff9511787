use reqwest::StatusCode;
use thiserror::Error as ThisError;

use super::IsRetryable;

/// Failures while talking to the export API. Raised before any local
/// mutation, so a pass that fails here can simply be re-run.
#[derive(Debug, ThisError)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, timeouts, etc).
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream error: status={status}, body={body:.200}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The bundle URL answered with a document instead of an archive.
    #[error("Bundle download rejected ({content_type}): {body:.200}")]
    BundleRejected { content_type: String, body: String },

    #[error("Bundle archive error: {0}")]
    Archive(String),
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(_) => true,
            FetchError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            FetchError::BundleRejected { .. } => true,
            FetchError::Decode(_) | FetchError::Archive(_) => false,
        }
    }
}
