//! Read-through TTL caching resolver.

use std::sync::Arc;

use async_trait::async_trait;

use crate::DynUpstream;
use crate::cache::TtlCache;
use crate::error::{LayerExt, UpstreamError};
use crate::traits::{Backend, Upstream};
use crate::types::Fetched;

/// Serves live entries from a [`TtlCache`], otherwise delegates and stores
/// the result.
///
/// Every successful miss performs exactly one cache write. Errors are never
/// cached.
pub struct CachingUpstream {
    cache: Arc<TtlCache>,
    upstream: DynUpstream,
}

impl CachingUpstream {
    pub fn new(cache: Arc<TtlCache>, upstream: DynUpstream) -> Self {
        Self { cache, upstream }
    }
}

#[async_trait]
impl Upstream for CachingUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        if let Some(hit) = self.cache.get(key) {
            tracing::debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        let fetched = self.upstream.get(key).await.layer("caching upstream")?;
        self.cache.set(key, fetched.clone());
        Ok(fetched)
    }
}

#[async_trait]
impl Backend for CachingUpstream {
    async fn put(&self, key: &str, value: Fetched) -> Result<(), UpstreamError> {
        self.cache.set(key, value);
        Ok(())
    }
}
