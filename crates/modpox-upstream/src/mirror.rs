use async_trait::async_trait;
use reqwest::Client;

use crate::error::{LayerExt, UpstreamError};
use crate::http::fetch_verbatim;
use crate::traits::Upstream;
use crate::types::Fetched;

/// Forwards every key to a fixed public module mirror.
pub struct MirrorUpstream {
    endpoint: String,
    client: Client,
}

impl MirrorUpstream {
    /// `endpoint` is the mirror origin, e.g. `https://proxy.golang.org`.
    pub fn new(endpoint: impl Into<String>, client: Client) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { endpoint, client }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}{}", self.endpoint, key)
    }
}

#[async_trait]
impl Upstream for MirrorUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        tracing::info!(upstream = %self.endpoint, key = %key, "query upstream");
        fetch_verbatim(&self.client, &self.url_for(key))
            .await
            .layer("mirror upstream")
    }
}
