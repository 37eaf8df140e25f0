//! Stub resolvers and stores for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;

use crate::error::UpstreamError;
use crate::traits::{BackendStore, Upstream};
use crate::types::Fetched;

/// Answers every key with a fixed response and counts calls.
pub struct StaticUpstream {
    response: Fetched,
    calls: AtomicUsize,
}

impl StaticUpstream {
    pub fn new(body: &'static str, status: StatusCode) -> Self {
        Self {
            response: Fetched::new(body, status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for StaticUpstream {
    async fn get(&self, _key: &str) -> Result<Fetched, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Fails every request and counts calls.
#[derive(Default)]
pub struct FailingUpstream {
    calls: AtomicUsize,
}

impl FailingUpstream {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for FailingUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(UpstreamError::invalid_key(key))
    }
}

/// Panics if consulted at all.
pub struct UnreachableUpstream;

#[async_trait]
impl Upstream for UnreachableUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        panic!("downstream resolver must not be called for {key}");
    }
}

/// A backend store whose reads always fail.
pub struct BrokenStore;

#[async_trait]
impl BackendStore for BrokenStore {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn load(&self, _key: &str) -> Result<Option<Fetched>, UpstreamError> {
        Err(UpstreamError::backend("connection refused"))
    }

    async fn store(&self, _key: &str, _value: &Fetched) -> Result<(), UpstreamError> {
        Err(UpstreamError::backend("connection refused"))
    }
}

/// Records every stored key.
#[derive(Default)]
pub struct RecordingStore {
    pub stored: DashMap<String, Fetched>,
}

#[async_trait]
impl BackendStore for RecordingStore {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn load(&self, key: &str) -> Result<Option<Fetched>, UpstreamError> {
        Ok(self.stored.get(key).map(|entry| entry.value().clone()))
    }

    async fn store(&self, key: &str, value: &Fetched) -> Result<(), UpstreamError> {
        self.stored.insert(key.to_string(), value.clone());
        Ok(())
    }
}
