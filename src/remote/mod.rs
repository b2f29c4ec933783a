//! Remote photo catalog
//!
//! The repository only talks to the catalog through [`RemoteSource`], so tests
//! can swap the HTTP client for a scripted fake.

pub mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::data::{Album, Photo};

pub use http::HttpRemoteSource;

/// Read-only access to the remote photo and album collections.
///
/// Implementations return the full lists verbatim and report failures as
/// `Error::Network` (transport) or `Error::Protocol` (unexpected payload).
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn photos(&self) -> Result<Vec<Photo>>;

    async fn albums(&self) -> Result<Vec<Album>>;

    /// Raw bytes of an image, for the detail view
    async fn image(&self, url: &str) -> Result<Vec<u8>>;
}
