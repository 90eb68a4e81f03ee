//! Domain service for public profiles.
//!
//! A profile is hidden until its owner turns visibility on; hidden and
//! missing profiles look the same to visitors.

use thiserror::Error;

use crate::domain::UserId;
use crate::models::{ProfileUpdate, PublicProfile, PublicProfileView};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ProfileError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ProfileError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait ProfileService: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ProfileError::Conflict`] if the user already has a profile.
    async fn create_profile(&self, user_id: UserId) -> Result<PublicProfile, ProfileError>;

    async fn get_or_create(&self, user_id: UserId) -> Result<PublicProfile, ProfileError>;

    async fn update_profile(
        &self,
        user_id: UserId,
        patch: ProfileUpdate,
    ) -> Result<PublicProfile, ProfileError>;

    /// The visitor-facing view of a visible profile.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] when the user or profile is missing
    /// or the profile is hidden.
    async fn public_profile(&self, nickname: &str) -> Result<PublicProfileView, ProfileError>;
}
