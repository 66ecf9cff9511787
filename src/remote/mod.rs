//! Access to the remote export API.

mod archive;
mod http;

pub use archive::decode_bundle;
pub use http::HttpRemote;

use async_trait::async_trait;
use zywrap_schema::{BundleDocument, UpdateCheck};

use crate::error::FetchError;

/// Characters of an upstream body kept in logs and errors.
pub(crate) const BODY_PREVIEW_CHARS: usize = 500;

/// Source of catalog data for a sync pass.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Asks which mode the next pass should run in, relative to
    /// `from_version` (`None` on a fresh store).
    async fn check_updates(&self, from_version: Option<&str>) -> Result<UpdateCheck, FetchError>;

    /// Downloads and decodes the full bundle. `None` uses the configured
    /// bundle endpoint.
    async fn fetch_bundle(&self, url: Option<&str>) -> Result<BundleDocument, FetchError>;
}
