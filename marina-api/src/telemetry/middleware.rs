//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in an `http_request` span, tags it with an
//! `x-request-id`, records Prometheus metrics, and logs completion.

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::metrics;

const REQUEST_ID: &str = "x-request-id";

/// Route label for requests that reached the fallback.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Route template for metrics/spans, e.g. `/boats/:id/loads/:load_id`.
///
/// Only templates registered on the router can appear, so label
/// cardinality stays bounded whatever paths clients send.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Observability middleware for Axum.
pub async fn observability_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);

    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(HeaderName::from_static(REQUEST_ID), value);
    }

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
        request_id = %request_id,
    );

    let mut response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Some(metrics) = metrics() {
        metrics.record_http_request(
            method.as_str(),
            &route,
            status.as_u16(),
            duration.as_secs_f64(),
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(HeaderName::from_static(REQUEST_ID), value);
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn, routing::get, Router};
    use prometheus::Encoder;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/boats/:id/loads/:load_id", get(|| async { "ok" }))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(from_fn(observability_middleware))
    }

    fn requests_seen(route: &str, status: &str) -> f64 {
        metrics()
            .map(|m| {
                m.http_requests_total
                    .with_label_values(&["GET", route, status])
                    .get()
            })
            .unwrap_or_default()
    }

    async fn get_path(path: &str) -> Response {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        app().oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_matched_route_is_the_template() {
        let before = requests_seen("/boats/:id/loads/:load_id", "200");
        let response = get_path("/boats/7/loads/9").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(requests_seen("/boats/:id/loads/:load_id", "200") >= before + 1.0);
    }

    #[tokio::test]
    async fn test_unknown_paths_share_one_label() {
        let before = requests_seen(UNMATCHED_ROUTE, "404");
        for path in ["/x1", "/x2", "/x3/deeper"] {
            assert_eq!(get_path(path).await.status(), StatusCode::NOT_FOUND);
        }
        assert!(requests_seen(UNMATCHED_ROUTE, "404") >= before + 3.0);

        let mut buffer = Vec::new();
        prometheus::TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .unwrap();
        let exposition = String::from_utf8(buffer).unwrap();
        assert!(!exposition.contains("path=\"/x"));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed_or_generated() {
        let request = Request::builder()
            .uri("/boats/1/loads/2")
            .header(REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.headers()[REQUEST_ID], "abc-123");

        let response = get_path("/boats/1/loads/2").await;
        assert!(response.headers().contains_key(REQUEST_ID));
    }
}
