use axum::{
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// 请求ID头部名称
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 超过该耗时（毫秒）的请求以 warn 级别记录
const SLOW_REQUEST_MS: u128 = 1000;

/// 请求追踪中间件
/// 复用或生成 x-request-id，在其 span 内处理请求，并回写到响应头
pub async fn request_tracking_middleware<B>(request: Request<B>, next: Next<B>) -> Response {
    let start_time = Instant::now();
    let request_id = extract_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!("request", request_id = %request_id, method = %method, uri = %uri);
    let mut response = next.run(request).instrument(span.clone()).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let status = response.status();
    let duration_ms = start_time.elapsed().as_millis();
    let _entered = span.enter();
    if status.is_server_error() || duration_ms > SLOW_REQUEST_MS {
        warn!(status = status.as_u16(), duration_ms = %duration_ms, "Request completed");
    } else {
        info!(status = status.as_u16(), duration_ms = %duration_ms, "Request completed");
    }

    response
}

/// 从请求头中提取请求ID
pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
