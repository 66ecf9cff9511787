//! Wire types of the Zywrap SDK export API.
//!
//! Nothing in here touches the network or the database; the mirror crate
//! consumes these documents and normalizes them into table rows.

pub mod block_type;
pub mod bundle;
pub mod lenient;
pub mod record_set;
pub mod updates;

pub use block_type::{BlockType, UnknownBlockType};
pub use bundle::{BundleDocument, CatalogPayload};
pub use record_set::RecordSet;
pub use updates::{Deletion, DeletionKind, SyncMode, UnknownDeletionKind, UpdateCheck, WrappersSection};
