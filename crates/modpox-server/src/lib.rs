pub mod config;
pub mod handlers;
pub mod observability;
pub mod pipeline;
pub mod server;

pub use config::{
    AppConfig, BackendConfig, BackendKind, BlacklistConfig, CacheConfig, GitLabConfig,
    LoggingConfig, ServerConfig, SumDbConfig, UpstreamConfig,
};
pub use observability::{apply_logging_level, init_tracing};
pub use pipeline::Pipeline;
pub use server::{ModpoxServer, ServerBuilder, build_app};
