//! Value types shared by every resolver.

use bytes::Bytes;
use reqwest::StatusCode;

/// A resolved response: payload bytes plus the status to send to the client.
///
/// The body is `Bytes`, so cloning a cache hit is a reference count bump.
/// An empty body is a valid answer (e.g. the checksum database `supported`
/// probe, or a 403 from the blacklist).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: Bytes,
    pub status: StatusCode,
}

impl Fetched {
    /// Creates a response with the given body and status.
    pub fn new(body: impl Into<Bytes>, status: StatusCode) -> Self {
        Self {
            body: body.into(),
            status,
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(body, StatusCode::OK)
    }

    /// Creates a response with an empty body.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(Bytes::new(), status)
    }

    /// Returns `true` if the status is exactly `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}
