//! Domain service for episode watch tracking.
//!
//! Marks are idempotent facts keyed by (user, show, season, episode); progress
//! and history are computed on read.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{MediaId, UserId};
use crate::models::{HistoryEntry, WatchProgress, WatchedEpisode};

#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error("Media {0} not found")]
    NotFound(MediaId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for EpisodeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for EpisodeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Watched marks of one show together with the derived progress.
#[derive(Debug, Clone, Serialize)]
pub struct ShowWatchState {
    pub media_id: MediaId,
    pub title: String,
    pub episodes: Vec<WatchedEpisode>,
    pub progress: WatchProgress,
}

#[async_trait::async_trait]
pub trait EpisodeTrackingService: Send + Sync {
    /// Records a watched episode. Marking twice keeps one row.
    ///
    /// # Errors
    ///
    /// - [`EpisodeError::Validation`] for out-of-range numbers or a movie id
    /// - [`EpisodeError::NotFound`] if the show does not exist
    async fn mark_watched(
        &self,
        user_id: UserId,
        show_id: MediaId,
        season: i32,
        episode: i32,
    ) -> Result<WatchedEpisode, EpisodeError>;

    /// Removes a mark. Returns `false` when there was nothing to remove.
    async fn unmark_watched(
        &self,
        user_id: UserId,
        show_id: MediaId,
        season: i32,
        episode: i32,
    ) -> Result<bool, EpisodeError>;

    async fn watched_episodes(
        &self,
        user_id: UserId,
        show_id: MediaId,
    ) -> Result<ShowWatchState, EpisodeError>;

    async fn progress(
        &self,
        user_id: UserId,
        show_id: MediaId,
    ) -> Result<WatchProgress, EpisodeError>;

    /// Watched episodes and watched movies, newest first.
    async fn history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, EpisodeError>;
}
