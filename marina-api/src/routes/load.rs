//! Load REST API Routes

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use marina_core::{EntityKind, LoadId};

use crate::{
    error::{ApiResult, ErrorBody},
    extractors::{PathId, RequestLinks},
    negotiation::JsonBody,
    services::PageRequest,
    state::AppState,
    types::{LoadListResponse, LoadRequest, LoadResponse},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /loads - List loads
#[utoipa::path(
    get,
    path = "/loads",
    tag = "Loads",
    params(PageRequest),
    responses(
        (status = 200, description = "One page of loads", body = LoadListResponse),
        (status = 406, description = "Client does not accept JSON", body = ErrorBody),
    ),
)]
pub async fn list_loads(
    State(state): State<AppState>,
    RequestLinks(links): RequestLinks,
    Query(params): Query<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let loads = state
        .loads
        .list(params.window(state.config.page_size_max))
        .await?;
    let items = loads
        .into_iter()
        .map(|load| LoadResponse::new(load, &links))
        .collect();
    let page = params.page(items, &links.collection(EntityKind::Load));
    Ok(Json(LoadListResponse::from(page)))
}

/// POST /loads - Create an unassigned load
#[utoipa::path(
    post,
    path = "/loads",
    tag = "Loads",
    request_body = LoadRequest,
    responses(
        (status = 201, description = "Load created", body = LoadResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 415, description = "Body is not JSON", body = ErrorBody),
    ),
)]
pub async fn create_load(
    State(state): State<AppState>,
    RequestLinks(links): RequestLinks,
    JsonBody(req): JsonBody<LoadRequest>,
) -> ApiResult<impl IntoResponse> {
    let load = state.loads.create(req.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(LoadResponse::new(load, &links))))
}

/// GET /loads/{id} - Get a load
#[utoipa::path(
    get,
    path = "/loads/{id}",
    tag = "Loads",
    params(("id" = u64, Path, description = "Load ID")),
    responses(
        (status = 200, description = "Load details", body = LoadResponse),
        (status = 404, description = "Load not found", body = ErrorBody),
    ),
)]
pub async fn get_load(
    State(state): State<AppState>,
    RequestLinks(links): RequestLinks,
    PathId(id): PathId<LoadId>,
) -> ApiResult<impl IntoResponse> {
    let load = state.loads.get(id).await?;
    Ok(Json(LoadResponse::new(load, &links)))
}

/// PUT /loads/{id} - Replace a load's attributes
///
/// The boat it is on, if any, is kept. Responds 303 with the load's URL in
/// `Location`.
#[utoipa::path(
    put,
    path = "/loads/{id}",
    tag = "Loads",
    params(("id" = u64, Path, description = "Load ID")),
    request_body = LoadRequest,
    responses(
        (status = 303, description = "Load replaced; see Location"),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 404, description = "Load not found", body = ErrorBody),
    ),
)]
pub async fn replace_load(
    State(state): State<AppState>,
    RequestLinks(links): RequestLinks,
    PathId(id): PathId<LoadId>,
    JsonBody(req): JsonBody<LoadRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .relationships
        .edit_load(id, move |_| req.into_input())
        .await?;
    Ok((StatusCode::SEE_OTHER, [(header::LOCATION, links.entity(id))]))
}

/// PATCH /loads/{id} - Update some of a load's attributes
#[utoipa::path(
    patch,
    path = "/loads/{id}",
    tag = "Loads",
    params(("id" = u64, Path, description = "Load ID")),
    request_body = LoadRequest,
    responses(
        (status = 200, description = "Load updated", body = LoadResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 404, description = "Load not found", body = ErrorBody),
    ),
)]
pub async fn update_load(
    State(state): State<AppState>,
    RequestLinks(links): RequestLinks,
    PathId(id): PathId<LoadId>,
    JsonBody(req): JsonBody<LoadRequest>,
) -> ApiResult<impl IntoResponse> {
    let updated = state
        .relationships
        .edit_load(id, move |current| req.into_changes()?.merge(current))
        .await?;
    Ok(Json(LoadResponse::new(updated, &links)))
}

/// DELETE /loads/{id} - Delete a load, taking it off its boat first
#[utoipa::path(
    delete,
    path = "/loads/{id}",
    tag = "Loads",
    params(("id" = u64, Path, description = "Load ID")),
    responses(
        (status = 204, description = "Load deleted"),
        (status = 404, description = "Load not found", body = ErrorBody),
    ),
)]
pub async fn delete_load(
    State(state): State<AppState>,
    PathId(id): PathId<LoadId>,
) -> ApiResult<StatusCode> {
    state.relationships.delete_load(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_loads)
                .post(create_load)
                .put(super::collection_method_not_allowed)
                .patch(super::collection_method_not_allowed)
                .delete(super::collection_method_not_allowed),
        )
        .route(
            "/:id",
            get(get_load)
                .put(replace_load)
                .patch(update_load)
                .delete(delete_load),
        )
}
