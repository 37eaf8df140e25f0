//! Credential-carrying transport for the private host.
//!
//! The token is attached only after the target URL passes the guard: the
//! scheme must be `https` and the authority must equal the configured host.
//! Anything else is refused before a connection is opened.

use bytes::Bytes;
use modpox_upstream::UpstreamError;
use reqwest::Client;
use url::Url;

pub struct TokenTransport {
    host: String,
    token: String,
    client: Client,
    /// Always `https` outside of tests.
    scheme: &'static str,
}

impl TokenTransport {
    /// `host` is the bare authority, e.g. `gitlab.example.com` or
    /// `gitlab.example.com:8443`.
    pub fn new(host: impl Into<String>, token: impl Into<String>, client: Client) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            client,
            scheme: "https",
        }
    }

    /// A transport that talks plain HTTP to a local mock server.
    #[cfg(test)]
    pub(crate) fn plaintext(
        host: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            scheme: "http",
            ..Self::new(host, token, client)
        }
    }

    /// Checks that `url` may receive the token.
    pub fn check(&self, url: &Url) -> Result<(), UpstreamError> {
        if url.scheme() != self.scheme {
            return Err(UpstreamError::InsecureTransport {
                scheme: url.scheme().to_string(),
            });
        }
        let authority = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        if authority != self.host {
            return Err(UpstreamError::ForeignHost { host: authority });
        }
        Ok(())
    }

    /// GETs `url` with the bearer token and returns the body of a 2xx response.
    pub async fn get(&self, url: Url) -> Result<Bytes, UpstreamError> {
        self.check(&url)?;
        tracing::debug!(url = %url, "private host api request");

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> TokenTransport {
        TokenTransport::new("gitlab.example.com", "secret", Client::new())
    }

    #[test]
    fn test_accepts_configured_https_host() {
        let url = Url::parse("https://gitlab.example.com/api/v4/projects").unwrap();
        assert!(transport().check(&url).is_ok());
    }

    #[test]
    fn test_refuses_plain_http() {
        let url = Url::parse("http://gitlab.example.com/api/v4/projects").unwrap();
        let err = transport().check(&url).unwrap_err();
        assert!(matches!(err, UpstreamError::InsecureTransport { ref scheme } if scheme == "http"));
    }

    #[test]
    fn test_refuses_foreign_host() {
        for target in [
            "https://evil.example.com/api/v4/projects",
            "https://gitlab.example.com.evil.net/api/v4/projects",
            "https://gitlab.example.com:8443/api/v4/projects",
        ] {
            let url = Url::parse(target).unwrap();
            let err = transport().check(&url).unwrap_err();
            assert!(matches!(err, UpstreamError::ForeignHost { .. }), "{target}");
        }
    }

    #[test]
    fn test_host_with_port() {
        let transport = TokenTransport::new("gitlab.example.com:8443", "secret", Client::new());
        let url = Url::parse("https://gitlab.example.com:8443/api/v4/projects").unwrap();
        assert!(transport.check(&url).is_ok());
    }

    mod wire {
        use super::*;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        async fn mock_transport(server: &MockServer) -> TokenTransport {
            TokenTransport::plaintext(server.address().to_string(), "secret", Client::new())
        }

        #[tokio::test]
        async fn test_sends_bearer_token() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/api/v4/projects"))
                .and(header("authorization", "Bearer secret"))
                .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
                .expect(1)
                .mount(&server)
                .await;

            let transport = mock_transport(&server).await;
            let url = Url::parse(&format!("{}/api/v4/projects", server.uri())).unwrap();
            let body = transport.get(url).await.unwrap();
            assert_eq!(body.as_ref(), b"[]");
        }

        #[tokio::test]
        async fn test_non_success_becomes_status_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"404"}"#))
                .mount(&server)
                .await;

            let transport = mock_transport(&server).await;
            let url = Url::parse(&format!("{}/api/v4/projects/7", server.uri())).unwrap();
            let err = transport.get(url).await.unwrap_err();
            match err {
                UpstreamError::Status { status, url } => {
                    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                    assert!(url.ends_with("/api/v4/projects/7"), "{url}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
