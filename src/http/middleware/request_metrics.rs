//! Request counting middleware.

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::observability::metrics;

/// Count every request by method and final status.
pub async fn request_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16());
    response
}
