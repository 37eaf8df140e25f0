//! Checksum database passthrough.
//!
//! Keys under `/sumdb/<host>/` are answered here; everything else falls
//! through. The `supported` probe tells the go command whether this proxy
//! fronts `<host>`; other paths are forwarded to `https://<host>/<rest>` and
//! returned verbatim without verification.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::DynUpstream;
use crate::error::{LayerExt, UpstreamError};
use crate::http::fetch_verbatim;
use crate::traits::Upstream;
use crate::types::Fetched;

const SUMDB_PREFIX: &str = "/sumdb/";

pub struct SumDbUpstream {
    allowed_hosts: HashSet<String>,
    client: Client,
    upstream: DynUpstream,
}

impl SumDbUpstream {
    pub fn new(
        allowed_hosts: impl IntoIterator<Item = String>,
        client: Client,
        upstream: DynUpstream,
    ) -> Self {
        Self {
            allowed_hosts: allowed_hosts.into_iter().collect(),
            client,
            upstream,
        }
    }

    fn is_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.contains(host)
    }
}

/// Splits `/sumdb/<host>/<rest>` into `(host, rest)`.
fn split_sumdb_key(key: &str) -> Result<(&str, &str), UpstreamError> {
    let remainder = key
        .strip_prefix(SUMDB_PREFIX)
        .ok_or_else(|| UpstreamError::invalid_key(key))?;
    match remainder.split_once('/') {
        Some((host, rest)) if !host.is_empty() => Ok((host, rest)),
        _ => Err(UpstreamError::invalid_key(key)),
    }
}

fn forward_url(host: &str, rest: &str) -> String {
    format!("https://{host}/{rest}")
}

#[async_trait]
impl Upstream for SumDbUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        if !key.starts_with(SUMDB_PREFIX) {
            return self.upstream.get(key).await;
        }

        let (host, rest) = split_sumdb_key(key).layer("sumdb upstream")?;
        if !self.is_allowed(host) {
            tracing::info!(key = %key, host = %host, "sumdb host not allowed");
            return Ok(Fetched::empty(StatusCode::NOT_FOUND));
        }
        if rest == "supported" {
            return Ok(Fetched::empty(StatusCode::OK));
        }

        tracing::info!(host = %host, key = %key, "query sumdb");
        fetch_verbatim(&self.client, &forward_url(host, rest))
            .await
            .layer("sumdb upstream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StaticUpstream, UnreachableUpstream};
    use std::sync::Arc;

    fn sumdb(upstream: DynUpstream) -> SumDbUpstream {
        SumDbUpstream::new(vec!["sum.golang.org".to_string()], Client::new(), upstream)
    }

    #[tokio::test]
    async fn test_supported_probe() {
        let layer = sumdb(Arc::new(UnreachableUpstream));

        let fetched = layer.get("/sumdb/sum.golang.org/supported").await.unwrap();
        assert_eq!(fetched, Fetched::empty(StatusCode::OK));

        let fetched = layer.get("/sumdb/sum.example.com/supported").await.unwrap();
        assert_eq!(fetched, Fetched::empty(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_unlisted_host_is_not_forwarded() {
        let layer = sumdb(Arc::new(UnreachableUpstream));
        let fetched = layer
            .get("/sumdb/sum.example.com/lookup/golang.org/x/text@v0.3.0")
            .await
            .unwrap();
        assert_eq!(fetched.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_sumdb_keys_delegate() {
        let stub = Arc::new(StaticUpstream::new("v0.3.0\n", StatusCode::OK));
        let layer = sumdb(stub.clone());

        layer.get("/golang.org/x/text/@v/list").await.unwrap();
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_key_is_an_error() {
        let layer = sumdb(Arc::new(UnreachableUpstream));
        let err = layer.get("/sumdb/sum.golang.org").await.unwrap_err();
        assert!(matches!(err.root_cause(), UpstreamError::InvalidKey { .. }));
    }

    #[test]
    fn test_forward_url_strips_namespace_and_host() {
        let (host, rest) =
            split_sumdb_key("/sumdb/sum.golang.org/lookup/golang.org/x/text@v0.3.0").unwrap();
        assert_eq!(host, "sum.golang.org");
        assert_eq!(
            forward_url(host, rest),
            "https://sum.golang.org/lookup/golang.org/x/text@v0.3.0"
        );

        let (host, rest) = split_sumdb_key("/sumdb/sum.golang.org/tile/8/0/x001/234").unwrap();
        assert_eq!(forward_url(host, rest), "https://sum.golang.org/tile/8/0/x001/234");
    }
}
