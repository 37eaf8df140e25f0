use std::sync::Arc;

use async_trait::async_trait;
use modpox_server::build_app;
use modpox_upstream::{DynUpstream, Fetched, StatusCode, Upstream, UpstreamError};
use tokio::task::JoinHandle;

/// Answers from a fixed table; unknown keys fail.
struct TableUpstream;

#[async_trait]
impl Upstream for TableUpstream {
    async fn get(&self, key: &str) -> Result<Fetched, UpstreamError> {
        match key {
            "/golang.org/x/text/@v/list" => Ok(Fetched::ok("v0.3.0\nv0.3.1\n")),
            "/golang.org/x/missing/@v/list" => Ok(Fetched::new("not found", StatusCode::NOT_FOUND)),
            "/healthz" => Ok(Fetched::empty(StatusCode::GONE)),
            _ => Err(UpstreamError::invalid_key(key).within("test upstream")),
        }
    }
}

async fn start_server(
    upstream: DynUpstream,
) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let app = build_app(upstream);

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), tx, server)
}

#[tokio::test]
async fn server_writes_status_and_payload_verbatim() {
    let (base, shutdown_tx, handle) = start_server(Arc::new(TableUpstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/golang.org/x/text/@v/list"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "v0.3.0\nv0.3.1\n");

    let resp = client
        .get(format!("{base}/golang.org/x/missing/@v/list"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.text().await.unwrap(), "not found");

    // Query strings are not part of the key
    let resp = client
        .get(format!("{base}/golang.org/x/text/@v/list?go-get=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // No path is special-cased
    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::GONE);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn server_maps_any_method_to_get() {
    let (base, shutdown_tx, handle) = start_server(Arc::new(TableUpstream)).await;
    let client = reqwest::Client::new();

    for method in [reqwest::Method::POST, reqwest::Method::PUT, reqwest::Method::DELETE] {
        let resp = client
            .request(method.clone(), format!("{base}/golang.org/x/text/@v/list"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{method}");
        assert_eq!(resp.text().await.unwrap(), "v0.3.0\nv0.3.1\n");
    }

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn server_hides_errors_behind_bare_500() {
    let (base, shutdown_tx, handle) = start_server(Arc::new(TableUpstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/unknown/module/@v/v1.0.0.info"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.bytes().await.unwrap().is_empty());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
