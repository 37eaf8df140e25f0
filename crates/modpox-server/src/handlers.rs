use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use modpox_upstream::DynUpstream;

/// Answers every request, whatever its method, by resolving the raw request
/// path through the pipeline and writing status and payload back verbatim.
///
/// Errors never reach the client: they are logged and turned into a bare 500.
pub async fn fetch(State(upstream): State<DynUpstream>, method: Method, uri: Uri) -> Response {
    let key = uri.path();
    match upstream.get(key).await {
        Ok(fetched) => (fetched.status, fetched.body).into_response(),
        Err(err) => {
            tracing::error!(
                key = %key,
                method = %method,
                category = %err.category(),
                error = %err,
                "request failed"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
