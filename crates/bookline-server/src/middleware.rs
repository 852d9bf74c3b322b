//! Request-scoped middleware.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Tags every request with an `X-Request-Id` and echoes it back on the
/// response. A client-supplied id is kept as-is so callers can stitch
/// their own traces together; absent one, a fresh UUID is minted.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = req.headers().get(&REQUEST_ID).cloned().unwrap_or_else(|| {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
    });

    // The trace span reads the id back out of the extensions.
    req.extensions_mut().insert(id.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID, id);
    res
}
