use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::TmdbClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    EpisodeTrackingService, ListService, MediaService, ProfileService, SeaOrmEpisodeTrackingService,
    SeaOrmListService, SeaOrmMediaService, SeaOrmProfileService, SeaOrmUserService, UserService,
};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused by every provider client so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("ReelTrack/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub tmdb: Arc<TmdbClient>,

    pub media_service: Arc<dyn MediaService>,

    pub episode_service: Arc<dyn EpisodeTrackingService>,

    pub list_service: Arc<dyn ListService>,

    pub profile_service: Arc<dyn ProfileService>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.tmdb.timeout_seconds)?;
        let tmdb = Arc::new(TmdbClient::new(http_client, &config.tmdb));

        let media_service = Arc::new(SeaOrmMediaService::new(
            store.clone(),
            tmdb.clone(),
            config.scheduler.refresh_concurrency,
            config.tmdb.enrich_concurrency,
        )) as Arc<dyn MediaService + Send + Sync + 'static>;

        let episode_service = Arc::new(SeaOrmEpisodeTrackingService::new(store.clone()))
            as Arc<dyn EpisodeTrackingService + Send + Sync + 'static>;

        let list_service = Arc::new(SeaOrmListService::new(store.clone()))
            as Arc<dyn ListService + Send + Sync + 'static>;

        let profile_service = Arc::new(SeaOrmProfileService::new(store.clone()))
            as Arc<dyn ProfileService + Send + Sync + 'static>;

        let user_service = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn UserService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            tmdb,
            media_service,
            episode_service,
            list_service,
            profile_service,
            user_service,
        })
    }
}
