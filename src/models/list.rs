use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{ListId, ListItemId, MediaId, MediaKind, UserId, WatchStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaList {
    pub id: ListId,
    pub owner_id: UserId,
    pub name: String,
    pub is_public: bool,
    pub item_count: u64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub id: ListItemId,
    pub list_id: ListId,
    pub media_id: MediaId,
    pub position: i32,
    pub status: WatchStatus,
    pub added_at: String,
    pub updated_at: String,
}

/// Just enough media to render a list row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaCard {
    pub id: MediaId,
    pub media_type: MediaKind,
    pub title: String,
    pub poster_path: String,
    pub release_date: Option<NaiveDate>,
    pub vote_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItemView {
    #[serde(flatten)]
    pub item: ListItem,
    pub media: MediaCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListUpdate {
    pub name: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_lists: u64,
    pub total_items: u64,
    pub total_watched: u64,
    pub recent_lists: Vec<MediaList>,
}
