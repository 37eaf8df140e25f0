use std::net::SocketAddr;

use axum::Router;
use modpox_upstream::{DynUpstream, UpstreamError};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{config::AppConfig, handlers, pipeline::Pipeline};

pub struct ModpoxServer {
    addr: SocketAddr,
    app: Router,
    pipeline: Pipeline,
}

/// Every path is a module key, so the whole surface is one fallback route.
pub fn build_app(upstream: DynUpstream) -> Router {
    Router::new()
        .fallback(handlers::fetch)
        .with_state(upstream)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &axum::http::Request<_>| {
                        use tracing::field::Empty;
                        tracing::info_span!(
                            "http.request",
                            http.method = %req.method(),
                            http.target = %req.uri(),
                            http.status_code = Empty,
                        )
                    })
                    .on_response(
                        |res: &axum::http::Response<_>,
                         latency: std::time::Duration,
                         span: &tracing::Span| {
                            span.record(
                                "http.status_code",
                                tracing::field::display(res.status().as_u16()),
                            );
                            tracing::info!(
                                http.status = %res.status().as_u16(),
                                elapsed_ms = %latency.as_millis(),
                                "request handled"
                            );
                        },
                    ),
            ),
        )
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Assembles the pipeline. Must be called from within a tokio runtime.
    pub fn build(self) -> Result<ModpoxServer, UpstreamError> {
        let pipeline = Pipeline::from_config(&self.config)?;
        let app = build_app(pipeline.upstream());

        Ok(ModpoxServer {
            addr: self.addr,
            app,
            pipeline,
        })
    }
}

impl ModpoxServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        let served = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        self.pipeline.shutdown().await;
        served?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
