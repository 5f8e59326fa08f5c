//! Extractor producing the absolute-URL builder for the current request.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::HOST, request::Parts},
};

use crate::config::ApiConfig;
use crate::types::links::LinkBuilder;

/// Absolute URLs use `MARINA_PUBLIC_BASE_URL` when configured, otherwise the
/// request's `Host` header with the configured scheme.
#[derive(Debug, Clone)]
pub struct RequestLinks(pub LinkBuilder);

#[async_trait]
impl<S> FromRequestParts<S> for RequestLinks
where
    S: Send + Sync,
    Arc<ApiConfig>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<ApiConfig>::from_ref(state);
        Ok(RequestLinks(links_for(&config, parts)))
    }
}

fn links_for(config: &ApiConfig, parts: &Parts) -> LinkBuilder {
    if let Some(base) = &config.public_base_url {
        return LinkBuilder::new(base.clone());
    }
    let host = parts
        .headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    LinkBuilder::new(format!("{}://{}", config.url_scheme, host))
}
