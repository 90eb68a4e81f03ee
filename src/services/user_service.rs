//! Domain service for accounts: registration, login and contact details.

use serde::Deserialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::UserId;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} is already taken")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub password: String,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates an account and its hidden profile.
    ///
    /// # Errors
    ///
    /// - [`UserError::Validation`] for malformed fields
    /// - [`UserError::Conflict`] naming the first duplicated field
    async fn register(&self, registration: Registration) -> Result<User, UserError>;

    /// `login` may be a username or an email. `None` on unknown user or wrong
    /// password.
    async fn authenticate(&self, login: &str, password: &str) -> Result<Option<User>, UserError>;

    async fn update_user(
        &self,
        user_id: UserId,
        email: Option<String>,
        nickname: Option<String>,
    ) -> Result<User, UserError>;

    async fn enable_2fa(&self, user_id: UserId) -> Result<User, UserError>;

    async fn disable_2fa(&self, user_id: UserId) -> Result<User, UserError>;

    async fn get_by_api_key(&self, api_key: &str) -> Result<Option<User>, UserError>;

    async fn get(&self, user_id: UserId) -> Result<User, UserError>;
}
