//! User REST API Routes
//!
//! `POST /users` registers the authenticated caller. Registering twice
//! returns the existing record with 200 instead of 201.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use marina_core::{EntityKind, UserId};

use crate::{
    error::{ApiResult, ErrorBody},
    extractors::{PathId, RequestLinks},
    middleware::AuthExtractor,
    services::PageRequest,
    state::AppState,
    types::{UserListResponse, UserResponse},
};

/// GET /users - List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(PageRequest),
    responses(
        (status = 200, description = "One page of users", body = UserListResponse),
    ),
)]
pub async fn list_users(
    State(state): State<AppState>,
    RequestLinks(links): RequestLinks,
    Query(params): Query<PageRequest>,
) -> ApiResult<impl IntoResponse> {
    let users = state
        .users
        .list(params.window(state.config.page_size_max))
        .await?;
    let items = users
        .into_iter()
        .map(|user| UserResponse::new(user, &links))
        .collect();
    let page = params.page(items, &links.collection(EntityKind::User));
    Ok(Json(UserListResponse::from(page)))
}

/// POST /users - Register the caller
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 200, description = "Caller was already registered", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
    ),
    security(("bearer_auth" = []))
)]
pub async fn register_user(
    State(state): State<AppState>,
    AuthExtractor(auth): AuthExtractor,
    RequestLinks(links): RequestLinks,
) -> ApiResult<impl IntoResponse> {
    let (user, created) = state.users.register(&auth.subject).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(UserResponse::new(user, &links))))
}

/// GET /users/{id} - Get a user
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
)]
pub async fn get_user(
    State(state): State<AppState>,
    RequestLinks(links): RequestLinks,
    PathId(id): PathId<UserId>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.get(id).await?;
    Ok(Json(UserResponse::new(user, &links)))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_users)
                .post(register_user)
                .put(super::collection_method_not_allowed)
                .patch(super::collection_method_not_allowed)
                .delete(super::collection_method_not_allowed),
        )
        .route("/:id", get(get_user))
}
