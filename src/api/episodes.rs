use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CurrentUser};
use crate::api::validation::validate_id;
use crate::domain::MediaId;
use crate::models::{WatchProgress, WatchedEpisode};
use crate::services::{EpisodeError, ShowWatchState};

impl From<EpisodeError> for ApiError {
    fn from(err: EpisodeError) -> Self {
        match err {
            EpisodeError::NotFound(id) => Self::not_found("Media", id),
            EpisodeError::Validation(msg) => Self::ValidationError(msg),
            EpisodeError::Database(msg) => Self::DatabaseError(msg),
            EpisodeError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

#[derive(Serialize)]
pub struct MarkResponse {
    pub episode: WatchedEpisode,
    pub progress: WatchProgress,
}

#[derive(Serialize)]
pub struct UnmarkResponse {
    pub removed: bool,
    pub progress: WatchProgress,
}

/// GET /media/{id}/episodes
pub async fn list_watched(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ShowWatchState>>, ApiError> {
    let show_id = MediaId::new(validate_id("media", id)?);
    let watched = state
        .episode_service()
        .watched_episodes(current.id, show_id)
        .await?;
    Ok(Json(ApiResponse::success(watched)))
}

/// POST /media/{id}/episodes/{season}/{episode}
pub async fn mark_watched(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((id, season, episode)): Path<(i32, i32, i32)>,
) -> Result<Json<ApiResponse<MarkResponse>>, ApiError> {
    let show_id = MediaId::new(validate_id("media", id)?);
    let service = state.episode_service();

    let episode = service
        .mark_watched(current.id, show_id, season, episode)
        .await?;
    let progress = service.progress(current.id, show_id).await?;

    Ok(Json(ApiResponse::success(MarkResponse { episode, progress })))
}

/// DELETE /media/{id}/episodes/{season}/{episode}
pub async fn unmark_watched(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((id, season, episode)): Path<(i32, i32, i32)>,
) -> Result<Json<ApiResponse<UnmarkResponse>>, ApiError> {
    let show_id = MediaId::new(validate_id("media", id)?);
    let service = state.episode_service();

    let removed = service
        .unmark_watched(current.id, show_id, season, episode)
        .await?;
    let progress = service.progress(current.id, show_id).await?;

    Ok(Json(ApiResponse::success(UnmarkResponse { removed, progress })))
}
