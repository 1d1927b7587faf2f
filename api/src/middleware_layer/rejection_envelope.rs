use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};

use crate::core::http::response_envelope::ApiResponse;

/// Wraps axum's plain-text extractor rejections (bad path segment, missing
/// query parameter, ...) in the JSON envelope. JSON responses pass through.
pub async fn rejection_envelope(req: Request, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    let code = match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        _ => return res,
    };
    if is_json(&res) {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes: Bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let original = String::from_utf8_lossy(&bytes);

    let hint = if original.contains("missing field") {
        Some("A required query parameter is missing.".to_string())
    } else if original.contains("Cannot parse") {
        Some("A path segment has the wrong type (user ids are integers).".to_string())
    } else {
        None
    };
    let message = if original.trim().is_empty() {
        status.canonical_reason().unwrap_or("request rejected").to_string()
    } else {
        original.trim().to_string()
    };

    let body = match serde_json::to_vec(&ApiResponse::<()>::error(code, message, hint)) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(body))
}

fn is_json(res: &Response) -> bool {
    res.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
