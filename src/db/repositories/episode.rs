use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};

use crate::domain::{MediaId, UserId};
use crate::entities::{media, watched_episodes};
use crate::models::{RecentEpisode, WatchedEpisode};

impl From<watched_episodes::Model> for WatchedEpisode {
    fn from(model: watched_episodes::Model) -> Self {
        Self {
            id: model.id,
            user_id: UserId::new(model.user_id),
            tv_show_id: MediaId::new(model.tv_show_id),
            season_number: model.season_number,
            episode_number: model.episode_number,
            watched_at: model.watched_at,
        }
    }
}

/// Identifies one episode of one show for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeKey {
    pub user_id: UserId,
    pub show_id: MediaId,
    pub season: i32,
    pub episode: i32,
}

pub struct WatchedEpisodeRepository {
    conn: DatabaseConnection,
}

impl WatchedEpisodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the mark unless it already exists, then returns the stored row.
    /// The first `watched_at` wins.
    pub async fn mark(&self, key: EpisodeKey) -> Result<WatchedEpisode> {
        let active = watched_episodes::ActiveModel {
            user_id: Set(key.user_id.value()),
            tv_show_id: Set(key.show_id.value()),
            season_number: Set(key.season),
            episode_number: Set(key.episode),
            watched_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        watched_episodes::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    watched_episodes::Column::UserId,
                    watched_episodes::Column::TvShowId,
                    watched_episodes::Column::SeasonNumber,
                    watched_episodes::Column::EpisodeNumber,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to mark episode watched")?;

        self.find(key)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Watched episode missing right after insert"))
    }

    /// Returns whether a row was removed.
    pub async fn unmark(&self, key: EpisodeKey) -> Result<bool> {
        let result = watched_episodes::Entity::delete_many()
            .filter(watched_episodes::Column::UserId.eq(key.user_id.value()))
            .filter(watched_episodes::Column::TvShowId.eq(key.show_id.value()))
            .filter(watched_episodes::Column::SeasonNumber.eq(key.season))
            .filter(watched_episodes::Column::EpisodeNumber.eq(key.episode))
            .exec(&self.conn)
            .await
            .context("Failed to unmark episode")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn find(&self, key: EpisodeKey) -> Result<Option<WatchedEpisode>> {
        let row = watched_episodes::Entity::find()
            .filter(watched_episodes::Column::UserId.eq(key.user_id.value()))
            .filter(watched_episodes::Column::TvShowId.eq(key.show_id.value()))
            .filter(watched_episodes::Column::SeasonNumber.eq(key.season))
            .filter(watched_episodes::Column::EpisodeNumber.eq(key.episode))
            .one(&self.conn)
            .await
            .context("Failed to query watched episode")?;

        Ok(row.map(WatchedEpisode::from))
    }

    pub async fn for_show(&self, user_id: UserId, show_id: MediaId) -> Result<Vec<WatchedEpisode>> {
        let rows = watched_episodes::Entity::find()
            .filter(watched_episodes::Column::UserId.eq(user_id.value()))
            .filter(watched_episodes::Column::TvShowId.eq(show_id.value()))
            .order_by_asc(watched_episodes::Column::SeasonNumber)
            .order_by_asc(watched_episodes::Column::EpisodeNumber)
            .all(&self.conn)
            .await
            .context("Failed to list watched episodes")?;

        Ok(rows.into_iter().map(WatchedEpisode::from).collect())
    }

    /// Distinct (season, episode) pairs; the unique index makes a plain count
    /// exact.
    pub async fn count_for_show(&self, user_id: UserId, show_id: MediaId) -> Result<u64> {
        watched_episodes::Entity::find()
            .filter(watched_episodes::Column::UserId.eq(user_id.value()))
            .filter(watched_episodes::Column::TvShowId.eq(show_id.value()))
            .count(&self.conn)
            .await
            .context("Failed to count watched episodes")
    }

    pub async fn count_for_user(&self, user_id: UserId) -> Result<u64> {
        watched_episodes::Entity::find()
            .filter(watched_episodes::Column::UserId.eq(user_id.value()))
            .count(&self.conn)
            .await
            .context("Failed to count watched episodes")
    }

    /// Newest first, joined with the show title.
    pub async fn recent_for_user(&self, user_id: UserId, limit: u64) -> Result<Vec<RecentEpisode>> {
        let rows: Vec<(i32, String, i32, i32, String)> = watched_episodes::Entity::find()
            .select_only()
            .column(watched_episodes::Column::TvShowId)
            .column(media::Column::Title)
            .column(watched_episodes::Column::SeasonNumber)
            .column(watched_episodes::Column::EpisodeNumber)
            .column(watched_episodes::Column::WatchedAt)
            .inner_join(media::Entity)
            .filter(watched_episodes::Column::UserId.eq(user_id.value()))
            .order_by_desc(watched_episodes::Column::WatchedAt)
            .order_by_desc(watched_episodes::Column::Id)
            .limit(limit)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to load recent episodes")?;

        Ok(rows
            .into_iter()
            .map(
                |(show_id, show_title, season_number, episode_number, watched_at)| RecentEpisode {
                    media_id: MediaId::new(show_id),
                    show_title,
                    season_number,
                    episode_number,
                    watched_at,
                },
            )
            .collect())
    }
}
