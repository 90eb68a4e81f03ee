use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::domain::UserId;
use crate::services::{Registration, UserError};

const SESSION_USER_KEY: &str = "user_id";

/// Authenticated caller, inserted as a request extension by
/// [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: UserId,
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            UserError::NotFound => Self::NotFound("User not found".to_string()),
            UserError::Validation(msg) => Self::ValidationError(msg),
            UserError::Conflict(field) => Self::Conflict(format!("{field} is already taken")),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "email", alias = "login")]
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub nickname: Option<String>,
}

/// Accepts, in order:
/// 1. Session cookie (from login or register)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = match session.get::<i32>(SESSION_USER_KEY).await {
        Ok(Some(id)) => Some(UserId::new(id)),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session");
            None
        }
    };

    let user_id = match user_id {
        Some(id) => Some(id),
        None => match extract_api_key(&headers) {
            Some(key) => state
                .user_service()
                .get_by_api_key(&key)
                .await?
                .map(|user| user.id),
            None => None,
        },
    };

    let Some(id) = user_id else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    tracing::Span::current().record("user_id", id.value());
    request.extensions_mut().insert(CurrentUser { id });
    Ok(next.run(request).await)
}

fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

async fn open_session(session: &Session, user_id: UserId) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to rotate session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, user_id.value())
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<Registration>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service().register(payload).await?;
    open_session(&session, user.id).await?;

    Ok(Json(ApiResponse::success(UserDto::from_user(user, true))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .user_service()
        .authenticate(&payload.username, &payload.password)
        .await?
        .ok_or(UserError::InvalidCredentials)?;

    open_session(&session, user.id).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::success(UserDto::from_user(user, true))))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush session");
    }
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service().get(current.id).await?;
    Ok(Json(ApiResponse::success(UserDto::from_user(user, false))))
}

/// PUT /auth/me
pub async fn update_current_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .user_service()
        .update_user(current.id, payload.email, payload.nickname)
        .await?;
    Ok(Json(ApiResponse::success(UserDto::from_user(user, false))))
}

/// POST /auth/2fa/enable
pub async fn enable_2fa(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service().enable_2fa(current.id).await?;
    Ok(Json(ApiResponse::success(UserDto::from_user(user, false))))
}

/// POST /auth/2fa/disable
pub async fn disable_2fa(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.user_service().disable_2fa(current.id).await?;
    Ok(Json(ApiResponse::success(UserDto::from_user(user, false))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn api_key_from_header_or_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_api_key(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("abc123"));

        headers.insert("X-Api-Key", HeaderValue::from_static("xyz"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn basic_scheme_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(extract_api_key(&headers), None);
    }
}
