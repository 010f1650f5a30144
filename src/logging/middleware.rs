use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::{Duration, Instant};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

/// Requests slower than this are flagged in the completion log.
const SLOW_REQUEST: Duration = Duration::from_millis(500);

pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let req_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Probes hit every few seconds; keep them out of the info stream.
    let is_probe = path.starts_with("/health");
    if !is_probe {
        tracing::debug!(request_id = %req_id, method = %method, path = %path, "incoming request");
    }

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status();
    let slow = elapsed > SLOW_REQUEST;

    match classify(status) {
        Outcome::ServerError => tracing::error!(
            request_id = %req_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %elapsed.as_millis(),
            slow,
            "request failed"
        ),
        Outcome::ClientError => tracing::warn!(
            request_id = %req_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %elapsed.as_millis(),
            slow,
            "request rejected"
        ),
        Outcome::Success if is_probe => tracing::trace!(
            request_id = %req_id,
            path = %path,
            status = %status,
            "probe"
        ),
        Outcome::Success => tracing::info!(
            request_id = %req_id,
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %elapsed.as_millis(),
            slow,
            "request completed"
        ),
    }

    response
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Success,
    ClientError,
    ServerError,
}

fn classify(status: StatusCode) -> Outcome {
    if status.is_server_error() {
        Outcome::ServerError
    } else if status.is_client_error() {
        Outcome::ClientError
    } else {
        Outcome::Success
    }
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}
