use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CurrentUser};
use crate::api::validation::{
    parse_kind_filter, validate_id, validate_search_query, validate_tmdb_id,
};
use crate::domain::{BrowseSort, MediaId};
use crate::models::{Media, MediaPayload, ProviderDetails};
use crate::services::{MediaError, MediaFactory, RefreshSummary, SearchOutcome};

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Validation(msg) => Self::ValidationError(msg),
            MediaError::ProviderUnavailable(msg) => Self::ProviderUnavailable(msg),
            MediaError::NotFound(id) => Self::not_found("Media", id),
            MediaError::Conflict(msg) => Self::Conflict(msg),
            MediaError::Database(msg) => Self::DatabaseError(msg),
            MediaError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
}

#[derive(Deserialize)]
pub struct BrowseQuery {
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub sort: Option<String>,
}

#[derive(Deserialize)]
pub struct ImportRequest {
    pub tmdb_id: i64,
    pub media_type: String,
}

/// Manual entry: the discriminator plus any payload fields.
#[derive(Deserialize)]
pub struct CreateMediaRequest {
    pub media_type: String,
    #[serde(flatten)]
    pub payload: MediaPayload,
}

/// GET /media
pub async fn browse_media(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<ApiResponse<Vec<Media>>>, ApiError> {
    let kind = parse_kind_filter(query.media_type.as_deref())?;
    let sort = BrowseSort::parse_lenient(query.sort.as_deref());

    let media = state
        .media_service()
        .browse(current.id, kind, sort)
        .await?;
    Ok(Json(ApiResponse::success(media)))
}

/// POST /media
pub async fn create_media(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateMediaRequest>,
) -> Result<Json<ApiResponse<Media>>, ApiError> {
    let kind = MediaFactory::parse_kind(&payload.media_type)?;
    let media = state
        .media_service()
        .create_manual(kind, payload.payload)
        .await?;
    Ok(Json(ApiResponse::success(media)))
}

/// GET /media/search
pub async fn search_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchOutcome>>, ApiError> {
    let q = validate_search_query(&query.q)?;
    let kind = parse_kind_filter(query.media_type.as_deref())?;

    let outcome = state.media_service().search(q, kind).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /media/import
pub async fn import_media(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ApiResponse<Media>>, ApiError> {
    let tmdb_id = validate_tmdb_id(payload.tmdb_id)?;
    let kind = MediaFactory::parse_kind(&payload.media_type)?;

    let media = state.media_service().import(tmdb_id, kind).await?;
    Ok(Json(ApiResponse::success(media)))
}

/// GET /media/details/{kind}/{tmdb_id}
pub async fn provider_details(
    State(state): State<Arc<AppState>>,
    Path((kind, tmdb_id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<ProviderDetails>>, ApiError> {
    let kind = MediaFactory::parse_kind(&kind)?;
    let tmdb_id = validate_tmdb_id(tmdb_id)?;

    let details = state.media_service().provider_details(kind, tmdb_id).await?;
    Ok(Json(ApiResponse::success(details)))
}

/// POST /media/refresh
pub async fn refresh_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RefreshSummary>>, ApiError> {
    let summary = state.media_service().refresh_all().await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// GET /media/{id}
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Media>>, ApiError> {
    let id = MediaId::new(validate_id("media", id)?);
    let media = state.media_service().get(id).await?;
    Ok(Json(ApiResponse::success(media)))
}

/// POST /media/{id}/refresh
pub async fn refresh_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Media>>, ApiError> {
    let id = MediaId::new(validate_id("media", id)?);
    let media = state.media_service().refresh_metadata(id).await?;
    Ok(Json(ApiResponse::success(media)))
}
