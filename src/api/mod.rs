use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod episodes;
mod error;
mod lists;
mod media;
mod observability;
mod profiles;
mod system;
mod types;
mod validation;

pub use auth::CurrentUser;
pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{
    EpisodeTrackingService, ListService, MediaService, ProfileService, UserService,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn media_service(&self) -> &Arc<dyn MediaService> {
        &self.shared.media_service
    }

    #[must_use]
    pub fn episode_service(&self) -> &Arc<dyn EpisodeTrackingService> {
        &self.shared.episode_service
    }

    #[must_use]
    pub fn list_service(&self) -> &Arc<dyn ListService> {
        &self.shared.list_service
    }

    #[must_use]
    pub fn profile_service(&self) -> &Arc<dyn ProfileService> {
        &self.shared.profile_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, session_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies && !config.server.debug,
            config.server.session_minutes.max(1),
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(session_minutes)));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/health", get(system::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/u/{nickname}", get(profiles::public_profile))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn_with_state(
            state,
            observability::allowed_hosts_middleware,
        ))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/auth/me",
            get(auth::get_current_user).put(auth::update_current_user),
        )
        .route("/auth/2fa/enable", post(auth::enable_2fa))
        .route("/auth/2fa/disable", post(auth::disable_2fa))
        .route("/media", get(media::browse_media).post(media::create_media))
        .route("/media/search", get(media::search_media))
        .route("/media/import", post(media::import_media))
        .route(
            "/media/details/{kind}/{tmdb_id}",
            get(media::provider_details),
        )
        .route("/media/refresh", post(media::refresh_all))
        .route("/media/{id}", get(media::get_media))
        .route("/media/{id}/refresh", post(media::refresh_media))
        .route("/media/{id}/episodes", get(episodes::list_watched))
        .route(
            "/media/{id}/episodes/{season}/{episode}",
            post(episodes::mark_watched).delete(episodes::unmark_watched),
        )
        .route("/history", get(system::history))
        .route("/dashboard", get(system::dashboard))
        .route("/lists", get(lists::user_lists).post(lists::create_list))
        .route(
            "/lists/{id}",
            get(lists::get_list)
                .put(lists::update_list)
                .delete(lists::delete_list),
        )
        .route(
            "/lists/{id}/items",
            get(lists::list_items).post(lists::add_item),
        )
        .route("/lists/{id}/items/{media_id}", delete(lists::remove_item))
        .route("/lists/{id}/reorder", post(lists::reorder_items))
        .route("/lists/item/{id}/status", post(lists::update_item_status))
        .route("/lists/item/{id}/move", post(lists::move_item))
        .route(
            "/profile",
            get(profiles::get_own_profile).put(profiles::update_own_profile),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
