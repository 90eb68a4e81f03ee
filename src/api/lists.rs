use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CurrentUser, MessageResponse};
use crate::api::validation::validate_id;
use crate::domain::{ListId, ListItemId, MediaId};
use crate::models::{ListItem, ListItemView, ListUpdate, MediaList};
use crate::services::ListError;

impl From<ListError> for ApiError {
    fn from(err: ListError) -> Self {
        match err {
            ListError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            ListError::NotOwner => Self::Forbidden("You do not own this list".to_string()),
            ListError::Validation(msg) => Self::ValidationError(msg),
            ListError::Conflict(msg) => Self::Conflict(msg),
            ListError::Database(msg) => Self::DatabaseError(msg),
            ListError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

#[derive(Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub media_id: i32,
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub item_ids: Vec<i32>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    pub target_list_id: i32,
    /// Zero-based slot in the target list; omitted means append.
    pub position: Option<usize>,
}

#[derive(Serialize)]
pub struct RemoveResponse {
    pub removed: bool,
}

fn list_id(id: i32) -> Result<ListId, ApiError> {
    Ok(ListId::new(validate_id("list", id)?))
}

fn item_id(id: i32) -> Result<ListItemId, ApiError> {
    Ok(ListItemId::new(validate_id("list item", id)?))
}

/// GET /lists
pub async fn user_lists(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<MediaList>>>, ApiError> {
    let lists = state.list_service().user_lists(current.id, true).await?;
    Ok(Json(ApiResponse::success(lists)))
}

/// POST /lists
pub async fn create_list(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateListRequest>,
) -> Result<Json<ApiResponse<MediaList>>, ApiError> {
    let list = state
        .list_service()
        .create_list(current.id, &payload.name, payload.is_public)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// GET /lists/{id}
pub async fn get_list(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MediaList>>, ApiError> {
    let list = state
        .list_service()
        .get_list(Some(current.id), list_id(id)?)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// PUT /lists/{id}
pub async fn update_list(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateListRequest>,
) -> Result<Json<ApiResponse<MediaList>>, ApiError> {
    let update = ListUpdate {
        name: payload.name,
        is_public: payload.is_public,
    };
    let list = state
        .list_service()
        .update_list(current.id, list_id(id)?, update)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// DELETE /lists/{id}
pub async fn delete_list(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .list_service()
        .delete_list(current.id, list_id(id)?)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("List deleted"))))
}

/// GET /lists/{id}/items
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ListItemView>>>, ApiError> {
    let items = state
        .list_service()
        .list_items(Some(current.id), list_id(id)?)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /lists/{id}/items
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<ApiResponse<ListItem>>, ApiError> {
    let media_id = MediaId::new(validate_id("media", payload.media_id)?);
    let item = state
        .list_service()
        .add_media(current.id, list_id(id)?, media_id)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// DELETE /lists/{id}/items/{media_id}
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((id, media_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<RemoveResponse>>, ApiError> {
    let media_id = MediaId::new(validate_id("media", media_id)?);
    let removed = state
        .list_service()
        .remove_media(current.id, list_id(id)?, media_id)
        .await?;
    Ok(Json(ApiResponse::success(RemoveResponse { removed })))
}

/// POST /lists/{id}/reorder
pub async fn reorder_items(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<ApiResponse<Vec<ListItem>>>, ApiError> {
    let item_ids: Vec<ListItemId> = payload.item_ids.into_iter().map(ListItemId::new).collect();
    let items = state
        .list_service()
        .reorder_items(current.id, list_id(id)?, &item_ids)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /lists/item/{id}/status
pub async fn update_item_status(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<ApiResponse<ListItem>>, ApiError> {
    let item = state
        .list_service()
        .update_item_status(current.id, item_id(id)?, &payload.status)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// POST /lists/item/{id}/move
pub async fn move_item(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<ApiResponse<ListItem>>, ApiError> {
    let target = list_id(payload.target_list_id)?;
    let item = state
        .list_service()
        .move_item(current.id, item_id(id)?, target, payload.position)
        .await?;
    Ok(Json(ApiResponse::success(item)))
}
