mod api;
mod fetch;
mod sync;

pub use api::{ApiErrorBody, ApiErrorObject};
pub use fetch::FetchError;
pub use sync::{ApplyOp, SyncError};

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
