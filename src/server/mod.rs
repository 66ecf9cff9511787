//! Read-only HTTP view over the mirror, plus a manual sync trigger.

pub mod handlers;
pub mod router;

pub use router::{AppState, mirror_router};
