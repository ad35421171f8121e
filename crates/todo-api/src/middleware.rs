use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

/// リクエストごとにメソッド・パス・ステータス・処理時間を記録する
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if status >= 400 {
        warn!(%method, path = %path, status, latency_ms, "Request failed");
    } else {
        info!(%method, path = %path, status, latency_ms, "Request completed");
    }

    response
}
