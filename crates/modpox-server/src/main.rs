use std::env;

use anyhow::{Context, anyhow};
use modpox_server::ServerBuilder;
use modpox_server::config::loader::{DEFAULT_PATH, load_config};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From MODPOX_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (modpox.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (MODPOX_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    modpox_server::observability::init_tracing();

    let (config_path, source) = resolve_config_path();

    let cfg = load_config(Some(&config_path))
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("loading configuration from {config_path}"))?;

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );

    modpox_server::observability::apply_logging_level(&cfg.logging.level);

    let server = ServerBuilder::new()
        .with_config(cfg)
        .build()
        .context("pipeline initialization failed")?;

    server.run().await
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: MODPOX_CONFIG
/// 3. Default: modpox.toml
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = env::var("MODPOX_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    (DEFAULT_PATH.to_string(), ConfigSource::Default)
}
