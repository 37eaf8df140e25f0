//! Error types for the resolver chain.
//!
//! Every layer tags the errors it observes with its own name (see
//! [`LayerExt::layer`]) while keeping the original cause as the error source,
//! so the outermost log line carries the full path of custody.

use std::fmt;

use reqwest::StatusCode;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while resolving a module proxy request.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// An error observed by a named layer of the chain.
    #[error("{layer}: {source}")]
    Layer {
        /// Name of the layer that observed the error.
        layer: &'static str,
        /// The wrapped cause.
        #[source]
        source: Box<UpstreamError>,
    },

    /// The outbound HTTP request failed (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The private host API answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status {
        /// Status returned by the API.
        status: StatusCode,
        /// The requested URL, without credentials.
        url: String,
    },

    /// The request key does not have the expected protocol shape.
    #[error("invalid request key: {key}")]
    InvalidKey {
        /// The offending key.
        key: String,
    },

    /// No project on the private host matches the requested path.
    #[error("project not found: {path}")]
    ProjectNotFound {
        /// The `namespace/project` path that was looked up.
        path: String,
    },

    /// The project has neither tags nor commits to derive a version from.
    #[error("no commits found for project: {path}")]
    NoCommits {
        /// The `namespace/project` path.
        path: String,
    },

    /// A load balancer was built without members.
    #[error("no upstreams configured")]
    NoUpstreams,

    /// The token transport refused a non-HTTPS URL.
    #[error("refusing to send credentials over insecure scheme: {scheme}")]
    InsecureTransport {
        /// The rejected scheme.
        scheme: String,
    },

    /// The token transport refused a host other than the configured one.
    #[error("refusing to send credentials to foreign host: {host}")]
    ForeignHost {
        /// The rejected host.
        host: String,
    },

    /// A response body could not be decoded as the expected JSON.
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// A source archive could not be read or rewritten.
    #[error("archive error: {0}")]
    Archive(#[source] BoxError),

    /// Encoded content (e.g. base64 file content) could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(#[source] BoxError),

    /// A backend store operation failed.
    #[error("backend error: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl UpstreamError {
    /// Wraps this error with the name of the layer that observed it.
    #[must_use]
    pub fn within(self, layer: &'static str) -> Self {
        Self::Layer {
            layer,
            source: Box::new(self),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a new `Archive` error from any error type.
    #[must_use]
    pub fn archive(err: impl Into<BoxError>) -> Self {
        Self::Archive(err.into())
    }

    /// Creates a new `Encoding` error from any error type.
    #[must_use]
    pub fn encoding(err: impl Into<BoxError>) -> Self {
        Self::Encoding(err.into())
    }

    /// Returns the innermost error, skipping layer tags.
    #[must_use]
    pub fn root_cause(&self) -> &UpstreamError {
        match self {
            Self::Layer { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self.root_cause() {
            Self::Request(_)
            | Self::Status { .. }
            | Self::ProjectNotFound { .. }
            | Self::NoCommits { .. }
            | Self::Json(_)
            | Self::Archive(_)
            | Self::Encoding(_) => ErrorCategory::Upstream,
            Self::InvalidKey { .. } => ErrorCategory::Protocol,
            Self::NoUpstreams => ErrorCategory::Configuration,
            Self::InsecureTransport { .. } | Self::ForeignHost { .. } => ErrorCategory::Security,
            Self::Backend { .. } => ErrorCategory::Backend,
            Self::Layer { .. } => unreachable!("root_cause never returns a layer"),
        }
    }
}

/// Extension trait for tagging errors with a layer name.
pub trait LayerExt<T> {
    /// Wraps the error, if any, with the given layer name.
    fn layer(self, layer: &'static str) -> Result<T, UpstreamError>;
}

impl<T, E> LayerExt<T> for Result<T, E>
where
    E: Into<UpstreamError>,
{
    fn layer(self, layer: &'static str) -> Result<T, UpstreamError> {
        self.map_err(|e| e.into().within(layer))
    }
}

/// Categories of resolver errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network, timeout or undecodable response from an upstream.
    Upstream,
    /// Request key did not match the protocol shape.
    Protocol,
    /// The chain was assembled from an invalid configuration.
    Configuration,
    /// The credential guard refused an outbound request.
    Security,
    /// Backend store failure.
    Backend,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Protocol => write!(f, "protocol"),
            Self::Configuration => write!(f, "configuration"),
            Self::Security => write!(f, "security"),
            Self::Backend => write!(f, "backend"),
        }
    }
}
