use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Public mirrors behind the load balancer
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub sumdb: SumDbConfig,
    #[serde(default)]
    pub blacklist: BlacklistConfig,
    /// Private GitLab host, translated instead of mirrored
    #[serde(default)]
    pub gitlab: Option<GitLabConfig>,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        // Upstream validations
        if self.upstream.mirrors.is_empty() {
            return Err("upstream.mirrors must list at least one mirror".into());
        }
        for mirror in &self.upstream.mirrors {
            match Url::parse(mirror) {
                Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
                _ => {
                    return Err(format!(
                        "upstream.mirrors entry {mirror:?} must be an absolute http(s) URL"
                    ));
                }
            }
        }
        if self.upstream.timeout_secs == 0 {
            return Err("upstream.timeout_secs must be > 0".into());
        }
        // Cache validations
        if self.cache.sweep_interval_secs == 0 {
            return Err("cache.sweep_interval_secs must be > 0".into());
        }
        if self.cache.short_ttl_secs == 0 || self.cache.long_ttl_secs == 0 {
            return Err("cache TTLs must be > 0".into());
        }
        if self.cache.short_ttl_secs > self.cache.long_ttl_secs {
            return Err("cache.short_ttl_secs must be <= cache.long_ttl_secs".into());
        }
        // GitLab validation
        if let Some(ref gitlab) = self.gitlab {
            if gitlab.host.trim().is_empty() {
                return Err("gitlab.host must not be empty".into());
            }
            if gitlab.token.is_empty() {
                return Err("gitlab.token must not be empty".into());
            }
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        SocketAddr::from((host, self.server.port))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Equivalent public mirror endpoints, picked uniformly at random
    #[serde(default = "default_mirrors")]
    pub mirrors: Vec<String>,
    /// Per-request timeout for every outbound call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_mirrors() -> Vec<String> {
    vec!["https://proxy.golang.org".into()]
}
fn default_timeout_secs() -> u64 {
    modpox_upstream::http::DEFAULT_TIMEOUT.as_secs()
}
fn default_user_agent() -> String {
    modpox_upstream::http::USER_AGENT.into()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            mirrors: default_mirrors(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SumDbConfig {
    #[serde(default = "default_sumdb_hosts")]
    pub allowed_hosts: Vec<String>,
}

fn default_sumdb_hosts() -> Vec<String> {
    vec!["sum.golang.org".into()]
}

impl Default for SumDbConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: default_sumdb_hosts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlacklistConfig {
    /// Key prefixes answered with 403, e.g. `/github.com/some-org/`
    #[serde(default)]
    pub prefixes: Vec<String>,
}

/// Private GitLab host configuration.
///
/// Prefer setting the token through `MODPOX__GITLAB__TOKEN` rather than the
/// config file.
#[derive(Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Bare authority, e.g. `gitlab.example.com`
    pub host: String,
    pub token: String,
}

impl std::fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// TTL for `@latest` and `@v/list`
    #[serde(default = "default_short_ttl_secs")]
    pub short_ttl_secs: u64,
    /// TTL for everything else
    #[serde(default = "default_long_ttl_secs")]
    pub long_ttl_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    modpox_upstream::cache::SWEEP_INTERVAL.as_secs()
}
fn default_short_ttl_secs() -> u64 {
    modpox_upstream::cache::SHORT_TTL.as_secs()
}
fn default_long_ttl_secs() -> u64 {
    modpox_upstream::cache::LONG_TTL.as_secs()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            short_ttl_secs: default_short_ttl_secs(),
            long_ttl_secs: default_long_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> modpox_upstream::TtlPolicy {
        modpox_upstream::TtlPolicy::new(
            Duration::from_secs(self.short_ttl_secs),
            Duration::from_secs(self.long_ttl_secs),
        )
    }
}

/// Which backend store sits behind the outermost resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Noop,
    Memory,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Noop => write!(f, "noop"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Default config file, relative to the working directory.
    pub const DEFAULT_PATH: &str = "modpox.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g. MODPOX__SERVER__PORT=9090 or
        // MODPOX__UPSTREAM__MIRRORS=https://a.example,https://b.example
        builder = builder.add_source(
            Environment::with_prefix("MODPOX")
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("upstream.mirrors")
                .with_list_parse_key("sumdb.allowed_hosts")
                .with_list_parse_key("blacklist.prefixes"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
