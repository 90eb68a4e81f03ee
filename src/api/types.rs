use serde::Serialize;

use crate::db::User;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Account as shown to its owner. The API key is only included right after
/// login or registration.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub is_2fa_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserDto {
    #[must_use]
    pub fn from_user(user: User, include_api_key: bool) -> Self {
        Self {
            id: user.id.value(),
            username: user.username,
            email: user.email,
            nickname: user.nickname,
            is_2fa_enabled: user.is_2fa_enabled,
            api_key: include_api_key.then_some(user.api_key),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub tmdb_configured: bool,
    pub version: &'static str,
    pub uptime_seconds: u64,
}
