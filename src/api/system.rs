//! Health, dashboard and watch history endpoints.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CurrentUser, HealthResponse};
use crate::api::validation::validate_limit;
use crate::models::{DashboardStats, HistoryEntry};

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// `GET /api/health`
///
/// Answers 503 when the database ping fails so load balancers can drain the
/// instance.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check database ping failed");
            false
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        tmdb_configured: state.shared.tmdb.is_configured(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    (status, Json(ApiResponse::success(body)))
}

/// `GET /api/dashboard`
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    let stats = state.list_service().dashboard(current.id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// `GET /api/history`
///
/// Watched episodes and watched movies merged newest first. `limit` trims the
/// merged result.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let limit = query.limit.map(validate_limit).transpose()?;

    let mut entries = state.episode_service().history(current.id).await?;
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    Ok(Json(ApiResponse::success(entries)))
}
