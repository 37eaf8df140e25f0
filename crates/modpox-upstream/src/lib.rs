//! # modpox-upstream
//!
//! The resolver chain behind the modpox Go module proxy.
//!
//! Every layer implements [`Upstream`]: given a request key (the raw
//! protocol path, e.g. `/golang.org/x/text/@v/list`) it either answers or
//! delegates to the resolver it wraps. Layers are assembled once at startup
//! into a fixed chain:
//!
//! ```text
//! BackendCacheUpstream → BlacklistUpstream → CachingUpstream
//!     → SumDbUpstream → RandomUpstream → MirrorUpstream …
//! ```
//!
//! Caching layers observe successful responses on the way back up and store
//! them. See [`cache`] for TTL classes and the sweeper lifecycle.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use modpox_upstream::{BlacklistUpstream, MirrorUpstream, Upstream};
//!
//! let mirror: Arc<dyn Upstream> =
//!     Arc::new(MirrorUpstream::new("https://proxy.golang.org", client));
//! let chain = BlacklistUpstream::new(vec!["/github.com/private/".into()], mirror);
//! let fetched = chain.get("/golang.org/x/text/@v/list").await?;
//! ```

mod backend;
mod balance;
mod blacklist;
pub mod cache;
mod caching;
mod error;
pub mod http;
mod mirror;
mod sumdb;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{BackendCacheUpstream, MemoryBackend, NoopBackend};
pub use balance::RandomUpstream;
pub use blacklist::BlacklistUpstream;
pub use cache::{Sweeper, TtlCache, TtlPolicy};
pub use caching::CachingUpstream;
pub use error::{ErrorCategory, LayerExt, UpstreamError};
pub use mirror::MirrorUpstream;
pub use sumdb::SumDbUpstream;
pub use traits::{Backend, BackendStore, Upstream};
pub use types::Fetched;

/// Re-exported so callers can build statuses without depending on `http` directly.
pub use reqwest::StatusCode;

/// Type alias for a shared resolver trait object.
pub type DynUpstream = std::sync::Arc<dyn Upstream>;

/// Type alias for a shared backend store trait object.
pub type DynBackendStore = std::sync::Arc<dyn BackendStore>;
