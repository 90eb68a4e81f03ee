//! Domain service for media search, import and metadata refresh.

use serde::Serialize;
use thiserror::Error;

use crate::clients::TmdbError;
use crate::domain::{BrowseSort, MediaId, MediaKind, UserId};
use crate::models::{Media, MediaPayload, MediaSummary, ProviderDetails};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Metadata provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Media {0} not found")]
    NotFound(MediaId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for MediaError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for MediaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TmdbError> for MediaError {
    fn from(err: TmdbError) -> Self {
        Self::ProviderUnavailable(err.to_string())
    }
}

/// Provider hits plus local matches. `degraded` is set when the provider
/// could not be reached and `results` is therefore empty.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<MediaSummary>,
    pub local_matches: Vec<Media>,
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[async_trait::async_trait]
pub trait MediaService: Send + Sync {
    /// Searches the provider and the local catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Validation`] for a blank query. Provider failures
    /// never surface here; they set `degraded` instead.
    async fn search(
        &self,
        query: &str,
        kind: Option<MediaKind>,
    ) -> Result<SearchOutcome, MediaError>;

    /// Imports a provider record, or returns the row already stored for it.
    async fn import(&self, tmdb_id: i64, kind: MediaKind) -> Result<Media, MediaError>;

    /// Creates a media row without a provider id.
    async fn create_manual(
        &self,
        kind: MediaKind,
        payload: MediaPayload,
    ) -> Result<Media, MediaError>;

    async fn get(&self, id: MediaId) -> Result<Media, MediaError>;

    /// Full provider record with best-effort credits.
    async fn provider_details(
        &self,
        kind: MediaKind,
        tmdb_id: i64,
    ) -> Result<ProviderDetails, MediaError>;

    /// Media present in any of the user's lists.
    async fn browse(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
        sort: BrowseSort,
    ) -> Result<Vec<Media>, MediaError>;

    /// Re-fetches metadata for one row. Manual rows are returned unchanged.
    async fn refresh_metadata(&self, id: MediaId) -> Result<Media, MediaError>;

    /// Refreshes every row that has a provider id.
    async fn refresh_all(&self) -> Result<RefreshSummary, MediaError>;
}
