//! Boat REST API Routes
//!
//! Boats are owned by the identity subject that created them. Mutations
//! require the owner; reads of a private boat require the owner too.
//! Existence is always checked before ownership.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use marina_core::{Boat, BoatId, EntityKind, LoadId};

use crate::{
    error::{ApiError, ApiResult, ErrorBody},
    extractors::{PathId, PathIds, RequestLinks},
    middleware::{AuthExtractor, MaybeAuth},
    negotiation::JsonBody,
    services::PageRequest,
    state::AppState,
    types::{BoatListResponse, BoatLoadsResponse, BoatRequest, BoatResponse, LoadResponse},
};

/// Owner-only operations.
fn require_owner(boat: &Boat, subject: &str) -> ApiResult<()> {
    if boat.is_owned_by(subject) {
        Ok(())
    } else {
        Err(ApiError::not_owner())
    }
}

/// Public boats are visible to anyone, private ones to their owner only.
fn require_visible(boat: &Boat, auth: &MaybeAuth) -> ApiResult<()> {
    if boat.public {
        return Ok(());
    }
    match auth.subject() {
        Some(subject) => require_owner(boat, subject),
        None => Err(ApiError::unauthorized("Missing or invalid bearer token")),
    }
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /boats - The caller's boats, or every public boat for anonymous callers
#[utoipa::path(
    get,
    path = "/boats",
    tag = "Boats",
    params(PageRequest),
    responses(
        (status = 200, description = "One page of boats", body = BoatListResponse),
        (status = 406, description = "Client does not accept JSON", body = ErrorBody),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn list_boats(
    State(state): State<AppState>,
    auth: MaybeAuth,
    RequestLinks(links): RequestLinks,
    Query(params): Query<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let window = params.window(state.config.page_size_max);
    let boats = match auth.subject() {
        Some(subject) => state.boats.list_by_owner(subject, window).await?,
        None => state.boats.list_public(window).await?,
    };

    let items = boats
        .into_iter()
        .map(|boat| BoatResponse::new(boat, &links))
        .collect();
    let page = params.page(items, &links.collection(EntityKind::Boat));
    Ok(Json(BoatListResponse::from(page)))
}

/// POST /boats - Create a boat owned by the caller
#[utoipa::path(
    post,
    path = "/boats",
    tag = "Boats",
    request_body = BoatRequest,
    responses(
        (status = 201, description = "Boat created", body = BoatResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Name already taken", body = ErrorBody),
        (status = 415, description = "Body is not JSON", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_boat(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    RequestLinks(links): RequestLinks,
    JsonBody(req): JsonBody<BoatRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = req.into_input()?;
    let boat = state.boats.create(input, &auth.subject).await?;
    Ok((StatusCode::CREATED, Json(BoatResponse::new(boat, &links))))
}

/// GET /boats/{id} - Get a boat
#[utoipa::path(
    get,
    path = "/boats/{id}",
    tag = "Boats",
    params(("id" = u64, Path, description = "Boat ID")),
    responses(
        (status = 200, description = "Boat details", body = BoatResponse),
        (status = 401, description = "Private boat of another owner", body = ErrorBody),
        (status = 404, description = "Boat not found", body = ErrorBody),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn get_boat(
    State(state): State<AppState>,
    auth: MaybeAuth,
    RequestLinks(links): RequestLinks,
    PathId(id): PathId<BoatId>,
) -> ApiResult<impl IntoResponse> {
    let boat = state.boats.get(id).await?;
    require_visible(&boat, &auth)?;
    Ok(Json(BoatResponse::new(boat, &links)))
}

/// PUT /boats/{id} - Replace a boat's attributes
///
/// Responds 303 with the boat's URL in `Location`.
#[utoipa::path(
    put,
    path = "/boats/{id}",
    tag = "Boats",
    params(("id" = u64, Path, description = "Boat ID")),
    request_body = BoatRequest,
    responses(
        (status = 303, description = "Boat replaced; see Location"),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Not the owner", body = ErrorBody),
        (status = 403, description = "Name already taken", body = ErrorBody),
        (status = 404, description = "Boat not found", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn replace_boat(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    RequestLinks(links): RequestLinks,
    PathId(id): PathId<BoatId>,
    JsonBody(req): JsonBody<BoatRequest>,
) -> ApiResult<impl IntoResponse> {
    let boat = state.boats.get(id).await?;
    require_owner(&boat, &auth.subject)?;

    let input = req.into_input()?;
    // Carries the loads read above; a concurrent assign in between is lost.
    state.boats.replace(id, input, boat.loads, boat.owner).await?;

    Ok((StatusCode::SEE_OTHER, [(header::LOCATION, links.entity(id))]))
}

/// PATCH /boats/{id} - Update some of a boat's attributes
#[utoipa::path(
    patch,
    path = "/boats/{id}",
    tag = "Boats",
    params(("id" = u64, Path, description = "Boat ID")),
    request_body = BoatRequest,
    responses(
        (status = 200, description = "Boat updated", body = BoatResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 401, description = "Not the owner", body = ErrorBody),
        (status = 403, description = "Name already taken", body = ErrorBody),
        (status = 404, description = "Boat not found", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_boat(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    RequestLinks(links): RequestLinks,
    PathId(id): PathId<BoatId>,
    JsonBody(req): JsonBody<BoatRequest>,
) -> ApiResult<impl IntoResponse> {
    let boat = state.boats.get(id).await?;
    require_owner(&boat, &auth.subject)?;

    let input = req.into_changes()?.merge(&boat)?;
    let updated = state.boats.replace(id, input, boat.loads, boat.owner).await?;
    Ok(Json(BoatResponse::new(updated, &links)))
}

/// DELETE /boats/{id} - Delete a boat, unloading everything it carries
#[utoipa::path(
    delete,
    path = "/boats/{id}",
    tag = "Boats",
    params(("id" = u64, Path, description = "Boat ID")),
    responses(
        (status = 204, description = "Boat deleted"),
        (status = 401, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Boat not found", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_boat(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    PathId(id): PathId<BoatId>,
) -> ApiResult<StatusCode> {
    let boat = state.boats.get(id).await?;
    require_owner(&boat, &auth.subject)?;

    let report = state.boats.delete(id, &state.relationships).await?;
    if !report.is_clean() {
        tracing::warn!(
            boat_id = %id,
            failed = ?report.failed,
            "Boat deleted with loads still pointing at it"
        );
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /boats/{id}/loads - Loads carried by a boat
#[utoipa::path(
    get,
    path = "/boats/{id}/loads",
    tag = "Boats",
    params(("id" = u64, Path, description = "Boat ID")),
    responses(
        (status = 200, description = "Loads on the boat", body = BoatLoadsResponse),
        (status = 401, description = "Private boat of another owner", body = ErrorBody),
        (status = 404, description = "Boat not found", body = ErrorBody),
    ),
    security((), ("bearer_auth" = []))
)]
pub async fn list_boat_loads(
    State(state): State<AppState>,
    auth: MaybeAuth,
    RequestLinks(links): RequestLinks,
    PathId(id): PathId<BoatId>,
) -> ApiResult<impl IntoResponse> {
    let boat = state.boats.get(id).await?;
    require_visible(&boat, &auth)?;

    let loads = state
        .relationships
        .loads_on(&boat)
        .await?
        .into_iter()
        .map(|load| LoadResponse::new(load, &links))
        .collect();
    Ok(Json(BoatLoadsResponse {
        loads,
        self_link: links.boat_loads(id),
    }))
}

/// PUT /boats/{id}/loads/{load_id} - Put a load on a boat
#[utoipa::path(
    put,
    path = "/boats/{id}/loads/{load_id}",
    tag = "Boats",
    params(
        ("id" = u64, Path, description = "Boat ID"),
        ("load_id" = u64, Path, description = "Load ID"),
    ),
    responses(
        (status = 204, description = "Load assigned"),
        (status = 401, description = "Not the owner", body = ErrorBody),
        (status = 403, description = "Load is already on a boat", body = ErrorBody),
        (status = 404, description = "Boat or load not found", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_load(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    RequestLinks(links): RequestLinks,
    PathIds((boat_id, load_id)): PathIds<(BoatId, LoadId)>,
) -> ApiResult<StatusCode> {
    let boat = state.boats.get(boat_id).await?;
    state.loads.get(load_id).await?;
    require_owner(&boat, &auth.subject)?;

    state.relationships.assign(boat_id, load_id, &links).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /boats/{id}/loads/{load_id} - Take a load off a boat
#[utoipa::path(
    delete,
    path = "/boats/{id}/loads/{load_id}",
    tag = "Boats",
    params(
        ("id" = u64, Path, description = "Boat ID"),
        ("load_id" = u64, Path, description = "Load ID"),
    ),
    responses(
        (status = 204, description = "Load unassigned"),
        (status = 401, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Boat or load not found, or load not on this boat", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn unassign_load(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    PathIds((boat_id, load_id)): PathIds<(BoatId, LoadId)>,
) -> ApiResult<StatusCode> {
    let boat = state.boats.get(boat_id).await?;
    state.loads.get(load_id).await?;
    require_owner(&boat, &auth.subject)?;

    state.relationships.unassign(boat_id, load_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_boats)
                .post(create_boat)
                .put(super::collection_method_not_allowed)
                .patch(super::collection_method_not_allowed)
                .delete(super::collection_method_not_allowed),
        )
        .route(
            "/:id",
            get(get_boat)
                .put(replace_boat)
                .patch(update_boat)
                .delete(delete_boat),
        )
        .route("/:id/loads", get(list_boat_loads))
        .route("/:id/loads/:load_id", put(assign_load).delete(unassign_load))
}
