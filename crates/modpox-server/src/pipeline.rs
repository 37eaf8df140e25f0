//! Assembles the resolver chain from configuration.
//!
//! ```text
//! BackendCacheUpstream → BlacklistUpstream → CachingUpstream → SumDbUpstream
//!     → [GitLabUpstream →] RandomUpstream → MirrorUpstream …
//! ```

use std::sync::Arc;

use modpox_gitlab::{GitLabClient, GitLabUpstream};
use modpox_upstream::{
    BackendCacheUpstream, BlacklistUpstream, CachingUpstream, DynBackendStore, DynUpstream,
    Fetched, MemoryBackend, MirrorUpstream, NoopBackend, RandomUpstream, SumDbUpstream, Sweeper,
    TtlCache, UpstreamError, http,
};

use crate::config::{AppConfig, BackendKind};

/// The assembled chain plus the sweepers of its caches.
pub struct Pipeline {
    root: DynUpstream,
    sweepers: Vec<Sweeper>,
}

impl Pipeline {
    /// Builds the chain and starts one sweeper per cache. Must be called
    /// from within a tokio runtime.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, UpstreamError> {
        let client = http::build_client(&cfg.upstream.user_agent, cfg.upstream_timeout())?;

        let mirrors: Vec<DynUpstream> = cfg
            .upstream
            .mirrors
            .iter()
            .map(|endpoint| {
                Arc::new(MirrorUpstream::new(endpoint.as_str(), client.clone())) as DynUpstream
            })
            .collect();
        let mut chain: DynUpstream = Arc::new(RandomUpstream::new(mirrors));

        if let Some(ref gitlab) = cfg.gitlab {
            let api =
                GitLabClient::new(gitlab.host.as_str(), gitlab.token.as_str(), client.clone())?;
            tracing::info!(host = %gitlab.host, "private gitlab host enabled");
            chain = Arc::new(GitLabUpstream::new(gitlab.host.as_str(), Arc::new(api), chain));
        }

        chain = Arc::new(SumDbUpstream::new(
            cfg.sumdb.allowed_hosts.iter().cloned(),
            client,
            chain,
        ));

        let policy = cfg.cache.policy();
        let upstream_cache = Arc::new(TtlCache::new(policy));
        chain = Arc::new(CachingUpstream::new(upstream_cache.clone(), chain));

        chain = Arc::new(BlacklistUpstream::new(cfg.blacklist.prefixes.clone(), chain));

        let backend: DynBackendStore = match cfg.backend.kind {
            BackendKind::Noop => Arc::new(NoopBackend),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
        };
        let backend_cache = Arc::new(TtlCache::new(policy));
        let root: DynUpstream = Arc::new(BackendCacheUpstream::new(
            chain,
            backend,
            backend_cache.clone(),
        ));

        let period = cfg.sweep_interval();
        let sweepers = vec![
            backend_cache.start_sweeper(period),
            upstream_cache.start_sweeper(period),
        ];

        tracing::info!(
            mirrors = cfg.upstream.mirrors.len(),
            backend = %cfg.backend.kind,
            blacklisted = cfg.blacklist.prefixes.len(),
            "pipeline assembled"
        );

        Ok(Self { root, sweepers })
    }

    /// The outermost resolver.
    pub fn upstream(&self) -> DynUpstream {
        self.root.clone()
    }

    pub async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        self.root.get(key).await
    }

    /// Stops every cache sweeper and waits for them to finish.
    pub async fn shutdown(self) {
        for sweeper in self.sweepers {
            sweeper.stop().await;
        }
        tracing::debug!("cache sweepers stopped");
    }
}
