//! Backend stores and the outermost fallback resolver.
//!
//! ## Lookup order
//!
//! ```text
//! get(key) → local TtlCache → BackendStore → upstream chain
//!                 hit ↩            hit ↩        ↓ ok
//!                            store if 200, always cache locally
//! ```
//!
//! Backend hits are trusted without TTL checks and are not promoted into the
//! local cache. A failing backend never blocks traffic: read errors fall
//! through to the upstream chain and write errors are only logged.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::TtlCache;
use crate::error::{LayerExt, UpstreamError};
use crate::traits::{Backend, BackendStore, Upstream};
use crate::types::Fetched;
use crate::{DynBackendStore, DynUpstream};

/// A store that never persists anything. Every load misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBackend;

#[async_trait]
impl BackendStore for NoopBackend {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn load(&self, _key: &str) -> Result<Option<Fetched>, UpstreamError> {
        Ok(None)
    }

    async fn store(&self, _key: &str, _value: &Fetched) -> Result<(), UpstreamError> {
        Ok(())
    }
}

/// Process-lifetime store without expiry.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Fetched>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl BackendStore for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, key: &str) -> Result<Option<Fetched>, UpstreamError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn store(&self, key: &str, value: &Fetched) -> Result<(), UpstreamError> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Layers a local cache and a backend store in front of the upstream chain.
pub struct BackendCacheUpstream {
    upstream: DynUpstream,
    backend: DynBackendStore,
    cache: Arc<TtlCache>,
}

impl BackendCacheUpstream {
    /// `cache` must be a different instance from the one used by the
    /// caching layer inside `upstream`.
    pub fn new(upstream: DynUpstream, backend: DynBackendStore, cache: Arc<TtlCache>) -> Self {
        Self {
            upstream,
            backend,
            cache,
        }
    }
}

#[async_trait]
impl Upstream for BackendCacheUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }

        match self.backend.load(key).await {
            Ok(Some(stored)) => {
                tracing::debug!(key = %key, backend = self.backend.name(), "backend hit");
                return Ok(stored);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    backend = self.backend.name(),
                    error = %e,
                    "backend error, falling back to upstream"
                );
            }
        }

        let fetched = self
            .upstream
            .get(key)
            .await
            .layer("backend cache upstream")?;

        if fetched.is_ok() {
            if let Err(e) = self.backend.store(key, &fetched).await {
                tracing::warn!(
                    key = %key,
                    backend = self.backend.name(),
                    error = %e,
                    "backend store failed"
                );
            }
        } else {
            tracing::debug!(
                key = %key,
                status = fetched.status.as_u16(),
                "not adding to backend for non-200 status"
            );
        }

        self.cache.set(key, fetched.clone());
        Ok(fetched)
    }
}

#[async_trait]
impl Backend for BackendCacheUpstream {
    async fn put(&self, key: &str, value: Fetched) -> Result<(), UpstreamError> {
        if let Err(e) = self.backend.store(key, &value).await {
            tracing::warn!(
                key = %key,
                backend = self.backend.name(),
                error = %e,
                "backend store failed"
            );
        }
        self.cache.set(key, value);
        Ok(())
    }
}
