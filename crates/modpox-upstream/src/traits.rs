//! Resolver traits.

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::types::Fetched;

/// A module data source.
///
/// Given a request key (the raw protocol path) it produces the payload and
/// status to return to the client, or an error. Policy answers such as a
/// blacklisted key are normal responses (403/404), not errors.
///
/// Any resolver may wrap any other; implementations must be thread-safe.
///
/// # Example
///
/// ```ignore
/// use modpox_upstream::{Upstream, UpstreamError};
///
/// async fn versions(chain: &dyn Upstream, module: &str) -> Result<String, UpstreamError> {
///     let fetched = chain.get(&format!("/{module}/@v/list")).await?;
///     Ok(String::from_utf8_lossy(&fetched.body).into_owned())
/// }
/// ```
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Resolves a request key.
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError>;
}

/// A resolver that can also accept values as an intermediate cache.
#[async_trait]
pub trait Backend: Upstream {
    /// Stores a value under `key`.
    ///
    /// Implementations treat secondary stores as best effort; the returned
    /// error only reports failures of the primary store.
    async fn put(&self, key: &str, value: Fetched) -> Result<(), UpstreamError>;
}

/// A secondary key → value store consulted before the live chain.
///
/// Stores have no TTL semantics of their own: once populated, an entry is
/// trusted as authoritative.
#[async_trait]
pub trait BackendStore: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Looks up a value. `Ok(None)` is a miss.
    async fn load(&self, key: &str) -> Result<Option<Fetched>, UpstreamError>;

    /// Persists a value.
    async fn store(&self, key: &str, value: &Fetched) -> Result<(), UpstreamError>;
}
