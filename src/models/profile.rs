use serde::{Deserialize, Serialize};

use crate::domain::UserId;
use crate::models::episode::RecentEpisode;
use crate::models::list::MediaList;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfile {
    pub user_id: UserId,
    pub bio: String,
    pub avatar_url: String,
    pub is_visible: bool,
    pub show_watched_episodes: bool,
    pub show_lists: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_visible: Option<bool>,
    pub show_watched_episodes: Option<bool>,
    pub show_lists: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub total_lists: u64,
    pub total_watched: u64,
}

/// What anonymous visitors see at `/u/{nickname}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProfileView {
    pub nickname: String,
    pub bio: String,
    pub avatar_url: String,
    pub member_since: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lists: Option<Vec<MediaList>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_episodes: Option<Vec<RecentEpisode>>,
    pub stats: ProfileStats,
}
