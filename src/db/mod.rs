use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{BrowseSort, ListId, ListItemId, MediaId, MediaKind, UserId, WatchStatus};
use crate::models::{
    ListItem, ListUpdate, Media, MediaCard, MediaList, NewMedia, ProfileUpdate, PublicProfile,
    RecentEpisode, WatchedEpisode,
};

pub mod migrator;
pub mod repositories;

pub use repositories::episode::EpisodeKey;
pub use repositories::list::MoveOutcome;
pub use repositories::user::{NewUser, UniqueField, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn profile_repo(&self) -> repositories::profile::ProfileRepository {
        repositories::profile::ProfileRepository::new(self.conn.clone())
    }

    fn media_repo(&self) -> repositories::media::MediaRepository {
        repositories::media::MediaRepository::new(self.conn.clone())
    }

    fn episode_repo(&self) -> repositories::episode::WatchedEpisodeRepository {
        repositories::episode::WatchedEpisodeRepository::new(self.conn.clone())
    }

    fn list_repo(&self) -> repositories::list::ListRepository {
        repositories::list::ListRepository::new(self.conn.clone())
    }

    // Users

    pub async fn create_user(&self, user: NewUser<'_>, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(user, security).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        self.user_repo().get_by_nickname(nickname).await
    }

    pub async fn find_user_conflict(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        nickname: Option<&str>,
        exclude: Option<UserId>,
    ) -> Result<Option<UniqueField>> {
        self.user_repo()
            .find_conflict(username, email, nickname, exclude)
            .await
    }

    pub async fn verify_user_password(&self, login: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(login, password).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn update_user_contact(
        &self,
        id: UserId,
        email: Option<String>,
        nickname: Option<String>,
    ) -> Result<User> {
        self.user_repo().update_contact(id, email, nickname).await
    }

    pub async fn set_user_2fa(&self, id: UserId, enabled: bool) -> Result<User> {
        self.user_repo().set_2fa(id, enabled).await
    }

    // Profiles

    pub async fn get_profile(&self, user_id: UserId) -> Result<Option<PublicProfile>> {
        self.profile_repo().get(user_id).await
    }

    pub async fn insert_profile(&self, user_id: UserId) -> Result<PublicProfile> {
        self.profile_repo().insert(user_id).await
    }

    pub async fn update_profile(
        &self,
        user_id: UserId,
        patch: ProfileUpdate,
    ) -> Result<PublicProfile> {
        self.profile_repo().update(user_id, patch).await
    }

    // Media

    pub async fn insert_media(&self, media: NewMedia) -> Result<Media> {
        self.media_repo().insert(media).await
    }

    pub async fn get_media(&self, id: MediaId) -> Result<Option<Media>> {
        self.media_repo().get(id).await
    }

    pub async fn get_media_by_tmdb(&self, tmdb_id: i64, kind: MediaKind) -> Result<Option<Media>> {
        self.media_repo().get_by_tmdb(tmdb_id, kind).await
    }

    pub async fn search_media_titles(
        &self,
        query: &str,
        kind: Option<MediaKind>,
        limit: u64,
    ) -> Result<Vec<Media>> {
        self.media_repo().search_title(query, kind, limit).await
    }

    pub async fn update_media_metadata(&self, id: MediaId, fresh: NewMedia) -> Result<Media> {
        self.media_repo().update_metadata(id, fresh).await
    }

    pub async fn refreshable_media_ids(&self) -> Result<Vec<MediaId>> {
        self.media_repo().refreshable_ids().await
    }

    pub async fn browse_media(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
        sort: BrowseSort,
        limit: u64,
    ) -> Result<Vec<Media>> {
        self.media_repo()
            .browse_for_user(user_id, kind, sort, limit)
            .await
    }

    pub async fn media_cards(&self, ids: Vec<i32>) -> Result<HashMap<i32, MediaCard>> {
        self.media_repo().cards(ids).await
    }

    // Watched episodes

    pub async fn mark_episode(&self, key: EpisodeKey) -> Result<WatchedEpisode> {
        self.episode_repo().mark(key).await
    }

    pub async fn unmark_episode(&self, key: EpisodeKey) -> Result<bool> {
        self.episode_repo().unmark(key).await
    }

    pub async fn watched_episodes_for_show(
        &self,
        user_id: UserId,
        show_id: MediaId,
    ) -> Result<Vec<WatchedEpisode>> {
        self.episode_repo().for_show(user_id, show_id).await
    }

    pub async fn count_watched_for_show(&self, user_id: UserId, show_id: MediaId) -> Result<u64> {
        self.episode_repo().count_for_show(user_id, show_id).await
    }

    pub async fn count_watched_episodes(&self, user_id: UserId) -> Result<u64> {
        self.episode_repo().count_for_user(user_id).await
    }

    pub async fn recent_episodes(&self, user_id: UserId, limit: u64) -> Result<Vec<RecentEpisode>> {
        self.episode_repo().recent_for_user(user_id, limit).await
    }

    // Lists

    pub async fn create_list(&self, owner: UserId, name: &str, is_public: bool) -> Result<MediaList> {
        self.list_repo().create(owner, name, is_public).await
    }

    pub async fn get_list(&self, id: ListId) -> Result<Option<MediaList>> {
        self.list_repo().get(id).await
    }

    pub async fn update_list(&self, id: ListId, update: ListUpdate) -> Result<MediaList> {
        self.list_repo().update(id, update).await
    }

    pub async fn delete_list(&self, id: ListId) -> Result<bool> {
        self.list_repo().delete(id).await
    }

    pub async fn lists_for_user(
        &self,
        owner: UserId,
        include_private: bool,
        limit: Option<u64>,
    ) -> Result<Vec<MediaList>> {
        self.list_repo()
            .for_user(owner, include_private, limit)
            .await
    }

    pub async fn count_lists(&self, owner: UserId, public_only: bool) -> Result<u64> {
        self.list_repo().count_for_user(owner, public_only).await
    }

    pub async fn count_list_items(
        &self,
        owner: UserId,
        status: Option<WatchStatus>,
    ) -> Result<u64> {
        self.list_repo().count_items_for_user(owner, status).await
    }

    pub async fn list_items(&self, list_id: ListId) -> Result<Vec<ListItem>> {
        self.list_repo().items(list_id).await
    }

    pub async fn get_list_item(&self, id: ListItemId) -> Result<Option<ListItem>> {
        self.list_repo().get_item(id).await
    }

    pub async fn find_list_item(
        &self,
        list_id: ListId,
        media_id: MediaId,
    ) -> Result<Option<ListItem>> {
        self.list_repo().find_item(list_id, media_id).await
    }

    pub async fn add_list_item(&self, list_id: ListId, media_id: MediaId) -> Result<Option<ListItem>> {
        self.list_repo().add_item(list_id, media_id).await
    }

    pub async fn remove_list_media(&self, list_id: ListId, media_id: MediaId) -> Result<bool> {
        self.list_repo().remove_media(list_id, media_id).await
    }

    pub async fn move_list_item(
        &self,
        item_id: ListItemId,
        source: ListId,
        target: ListId,
        new_position: Option<usize>,
    ) -> Result<MoveOutcome> {
        self.list_repo()
            .move_item(item_id, source, target, new_position)
            .await
    }

    pub async fn reorder_list(
        &self,
        list_id: ListId,
        order: &[ListItemId],
    ) -> Result<Result<Vec<ListItem>, Vec<i32>>> {
        self.list_repo().reorder(list_id, order).await
    }

    pub async fn set_list_item_status(
        &self,
        item_id: ListItemId,
        status: WatchStatus,
    ) -> Result<ListItem> {
        self.list_repo().set_status(item_id, status).await
    }

    pub async fn watched_movies(
        &self,
        owner: UserId,
        limit: u64,
    ) -> Result<Vec<(i32, String, i32, String)>> {
        self.list_repo().watched_movies_for_user(owner, limit).await
    }
}
