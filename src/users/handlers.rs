use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{debug, instrument};

use crate::{
    error::ApiError,
    response::ApiResponse,
    state::AppState,
    users::{
        dto::{CreatedUser, UpdatedUser},
        extractors::RequestFields,
        repo_types::User,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    let users = services::list_users(&state).await?;
    debug!(count = users.len(), "users listed");
    Ok(ApiResponse::ok(users, "Users retrieved successfully"))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = services::get_user(&state, &id).await?;
    Ok(ApiResponse::ok(user, "User retrieved successfully"))
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    RequestFields(body): RequestFields,
) -> Result<ApiResponse<CreatedUser>, ApiError> {
    let id = services::create_user(&state, body).await?;
    Ok(ApiResponse::created(
        CreatedUser { id },
        "User created successfully",
    ))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RequestFields(body): RequestFields,
) -> Result<ApiResponse<UpdatedUser>, ApiError> {
    let updated = services::update_user(&state, &id, body).await?;
    Ok(ApiResponse::ok(updated, "User updated successfully"))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    services::delete_user(&state, &id).await?;
    Ok(ApiResponse::message_only(
        StatusCode::OK,
        "User deleted successfully",
    ))
}
