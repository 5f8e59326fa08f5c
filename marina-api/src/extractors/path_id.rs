//! Path extractors for typed entity ids.
//!
//! A path segment that does not parse as an id cannot name a stored entity,
//! so extraction failures are reported as 404 for the entity kind rather than
//! as a malformed request.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use marina_core::EntityIdType;

use crate::error::{ApiError, ApiResult};

/// Extractor for a single typed id from the path.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_boat(PathId(boat_id): PathId<BoatId>) -> ApiResult<impl IntoResponse> {
///     // boat_id is BoatId, not String
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathId<T: EntityIdType>(pub T);

/// Parse one path segment into a typed id, mapping failures to 404.
pub fn parse_path_id<T: EntityIdType>(segment: &str) -> ApiResult<T> {
    T::parse(segment).map_err(|e| {
        tracing::debug!(error = %e, "Unparsable path id");
        ApiError::not_found(T::KIND)
    })
}

#[async_trait]
impl<S, T> FromRequestParts<S> for PathId<T>
where
    S: Send + Sync,
    T: EntityIdType,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(segment): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal_error(format!("Missing path parameter: {}", e)))?;
        parse_path_id(&segment).map(PathId)
    }
}

/// Extractor for two typed ids, e.g. `/boats/:id/loads/:load_id`.
#[derive(Debug, Clone)]
pub struct PathIds<T>(pub T);

#[async_trait]
impl<S, T1, T2> FromRequestParts<S> for PathIds<(T1, T2)>
where
    S: Send + Sync,
    T1: EntityIdType,
    T2: EntityIdType,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path((first, second)): Path<(String, String)> =
            Path::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    ApiError::internal_error(format!("Missing path parameters: {}", e))
                })?;
        Ok(PathIds((parse_path_id(&first)?, parse_path_id(&second)?)))
    }
}
