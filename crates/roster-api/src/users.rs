use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use roster_types::api::{ChangeUserRequest, CreateUserRequest, SubscriptionRequest};
use roster_types::models::User;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.registry.list_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.registry.user(id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.registry.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Returns the deleted user; the cascade has fully landed by the time the
/// response goes out.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.registry.delete_user(id).await?))
}

pub async fn change_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeUserRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.registry.change_user(id, req).await?))
}

/// POST /users/{id}/subscribeTo — the path user starts following the body
/// user; responds with the (target) user whose list changed.
pub async fn subscribe_to(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.registry.subscribe(id, req.user_id).await?))
}

pub async fn unsubscribe_from(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubscriptionRequest>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.registry.unsubscribe(id, req.user_id).await?))
}
