use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use roster_types::api::{ChangeProfileRequest, CreateProfileRequest};
use roster_types::models::Profile;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list_profiles(State(state): State<AppState>) -> Result<Json<Vec<Profile>>, ApiError> {
    Ok(Json(state.registry.list_profiles().await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.registry.profile(id).await?))
}

pub async fn create_profile(
    State(state): State<AppState>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.registry.create_profile(req).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn change_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.registry.change_profile(id, req).await?))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.registry.delete_profile(id).await?))
}
