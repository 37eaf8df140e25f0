//! Outbound HTTP helpers shared by the fetching resolvers.

use std::time::Duration;

use reqwest::Client;

use crate::error::UpstreamError;
use crate::types::Fetched;

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = "modpox";

/// Per-call timeout for outbound requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds a client with the given user agent and per-request timeout.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, UpstreamError> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}

/// Builds a client with the default user agent and timeout.
pub fn default_client() -> Result<Client, UpstreamError> {
    build_client(USER_AGENT, DEFAULT_TIMEOUT)
}

/// GETs `url` and returns the body and status verbatim.
///
/// A non-200 status is logged but is not an error.
pub async fn fetch_verbatim(client: &Client, url: &str) -> Result<Fetched, UpstreamError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        tracing::warn!(url = %url, status = status.as_u16(), "unexpected status code");
    }
    let body = response.bytes().await?;
    Ok(Fetched { body, status })
}
