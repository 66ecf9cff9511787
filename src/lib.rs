pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod mirror;
pub mod remote;
pub mod server;
pub mod sync;
pub(crate) mod utils;

pub use error::{FetchError, SyncError};
pub use sync::{SyncEngine, SyncOutcome, SyncReport};
