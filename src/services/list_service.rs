//! Domain service for user-owned lists and their ordered items.

use thiserror::Error;

use crate::domain::{ListId, ListItemId, MediaId, UserId};
use crate::models::{DashboardStats, ListItem, ListItemView, ListUpdate, MediaList};

#[derive(Debug, Error)]
pub enum ListError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("You do not own this list")]
    NotOwner,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ListError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ListError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait ListService: Send + Sync {
    async fn create_list(
        &self,
        owner: UserId,
        name: &str,
        is_public: bool,
    ) -> Result<MediaList, ListError>;

    async fn update_list(
        &self,
        user_id: UserId,
        list_id: ListId,
        update: ListUpdate,
    ) -> Result<MediaList, ListError>;

    async fn delete_list(&self, user_id: UserId, list_id: ListId) -> Result<(), ListError>;

    /// Owners always see their lists; others only public ones.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::NotFound`] for a private list of another user.
    async fn get_list(&self, viewer: Option<UserId>, list_id: ListId)
    -> Result<MediaList, ListError>;

    async fn user_lists(
        &self,
        owner: UserId,
        include_private: bool,
    ) -> Result<Vec<MediaList>, ListError>;

    /// Items in display order, each with a media summary.
    async fn list_items(
        &self,
        viewer: Option<UserId>,
        list_id: ListId,
    ) -> Result<Vec<ListItemView>, ListError>;

    /// Appends media with status PLANNED.
    async fn add_media(
        &self,
        user_id: UserId,
        list_id: ListId,
        media_id: MediaId,
    ) -> Result<ListItem, ListError>;

    async fn remove_media(
        &self,
        user_id: UserId,
        list_id: ListId,
        media_id: MediaId,
    ) -> Result<bool, ListError>;

    /// Moves an item to `target` (same list repositions). Both lists stay
    /// dense.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::NotOwner`] unless the user owns both lists.
    async fn move_item(
        &self,
        user_id: UserId,
        item_id: ListItemId,
        target: ListId,
        new_position: Option<usize>,
    ) -> Result<ListItem, ListError>;

    async fn reorder_items(
        &self,
        user_id: UserId,
        list_id: ListId,
        item_ids: &[ListItemId],
    ) -> Result<Vec<ListItem>, ListError>;

    async fn update_item_status(
        &self,
        user_id: UserId,
        item_id: ListItemId,
        status: &str,
    ) -> Result<ListItem, ListError>;

    async fn dashboard(&self, user_id: UserId) -> Result<DashboardStats, ListError>;
}
