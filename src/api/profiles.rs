use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CurrentUser};
use crate::models::{ProfileUpdate, PublicProfile, PublicProfileView};
use crate::services::ProfileError;

impl From<ProfileError> for ApiError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(who) => Self::not_found("Profile", who),
            ProfileError::Validation(msg) => Self::ValidationError(msg),
            ProfileError::Conflict(msg) => Self::Conflict(msg),
            ProfileError::Database(msg) => Self::DatabaseError(msg),
            ProfileError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// GET /profile
pub async fn get_own_profile(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<PublicProfile>>, ApiError> {
    let profile = state.profile_service().get_or_create(current.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /profile
pub async fn update_own_profile(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(patch): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<PublicProfile>>, ApiError> {
    let profile = state
        .profile_service()
        .update_profile(current.id, patch)
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// GET /u/{nickname}
///
/// Hidden and unknown profiles both answer 404.
pub async fn public_profile(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
) -> Result<Json<ApiResponse<PublicProfileView>>, ApiError> {
    let view = state.profile_service().public_profile(&nickname).await?;
    Ok(Json(ApiResponse::success(view)))
}
