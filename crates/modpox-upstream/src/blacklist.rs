use async_trait::async_trait;
use reqwest::StatusCode;

use crate::DynUpstream;
use crate::error::UpstreamError;
use crate::traits::Upstream;
use crate::types::Fetched;

/// Rejects keys starting with a blocked prefix with an empty 403.
pub struct BlacklistUpstream {
    prefixes: Vec<String>,
    upstream: DynUpstream,
}

impl BlacklistUpstream {
    pub fn new(prefixes: Vec<String>, upstream: DynUpstream) -> Self {
        Self { prefixes, upstream }
    }

    fn is_blocked(&self, key: &str) -> bool {
        self.prefixes.iter().any(|prefix| key.starts_with(prefix.as_str()))
    }
}

#[async_trait]
impl Upstream for BlacklistUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        if self.is_blocked(key) {
            tracing::info!(key = %key, "blocked by blacklist");
            return Ok(Fetched::empty(StatusCode::FORBIDDEN));
        }
        self.upstream.get(key).await
    }
}
