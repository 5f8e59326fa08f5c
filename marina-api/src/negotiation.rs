//! Content negotiation.
//!
//! Resource routes only speak JSON. `require_json_accept` turns away callers
//! whose `Accept` header rules JSON out (406), and `JsonBody` refuses bodies
//! not labelled `application/json` (415) and reports undecodable ones as
//! validation failures (400).

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{header::ACCEPT, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

const ACCEPTABLE: [&str; 3] = ["application/json", "application/*", "*/*"];

/// Whether the `Accept` header admits a JSON response. A missing header
/// accepts anything.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let values: Vec<_> = headers.get_all(ACCEPT).iter().collect();
    if values.is_empty() {
        return true;
    }
    values
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|range| {
            range
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
        .any(|range| ACCEPTABLE.contains(&range.as_str()))
}

/// Reject requests that cannot accept `application/json` with 406.
pub async fn require_json_accept(request: Request, next: Next) -> Response {
    if !accepts_json(request.headers()) {
        tracing::debug!(
            accept = ?request.headers().get(ACCEPT),
            "Rejecting request that does not accept JSON"
        );
        return ApiError::not_acceptable().into_response();
    }
    next.run(request).await
}

/// JSON request body with the API's error mapping.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(ApiError::unsupported_media_type()),
            Err(rejection) => Err(ApiError::validation_failed(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    fn headers(accept: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(accept) = accept {
            headers.insert(ACCEPT, accept.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_accepts_json() {
        assert!(accepts_json(&headers(None)));
        assert!(accepts_json(&headers(Some("application/json"))));
        assert!(accepts_json(&headers(Some("text/html, application/*;q=0.8"))));
        assert!(accepts_json(&headers(Some("*/*"))));
        assert!(!accepts_json(&headers(Some("text/html"))));
        assert!(!accepts_json(&headers(Some("application/xml"))));
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Payload {
        #[allow(dead_code)]
        name: Option<String>,
    }

    fn app() -> Router {
        async fn handler(JsonBody(_payload): JsonBody<Payload>) -> StatusCode {
            StatusCode::CREATED
        }
        Router::new()
            .route("/things", post(handler))
            .layer(middleware::from_fn(require_json_accept))
    }

    fn request(content_type: Option<&str>, accept: Option<&str>, body: &str) -> Request {
        let mut builder = Request::builder().method("POST").uri("/things");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        if let Some(accept) = accept {
            builder = builder.header("accept", accept);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_json_body_accepted() {
        let response = app()
            .oneshot(request(Some("application/json"), None, r#"{"name":"Orca"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_415() {
        let response = app()
            .oneshot(request(Some("text/plain"), None, r#"{"name":"Orca"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_unknown_attribute_is_400() {
        let response = app()
            .oneshot(request(Some("application/json"), None, r#"{"id":1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_html_only_client_is_406() {
        let response = app()
            .oneshot(request(Some("application/json"), Some("text/html"), "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }
}
