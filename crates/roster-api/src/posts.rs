use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use roster_types::api::{ChangePostRequest, CreatePostRequest};
use roster_types::models::Post;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(state.registry.list_posts().await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.registry.post(id).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.registry.create_post(req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn change_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangePostRequest>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.registry.change_post(id, req).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.registry.delete_post(id).await?))
}
