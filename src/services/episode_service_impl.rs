//! `SeaORM` implementation of the `EpisodeTrackingService` trait.

use async_trait::async_trait;
use tracing::debug;

use crate::constants::episodes::{MAX_NUMBER, MIN_NUMBER};
use crate::constants::limits::HISTORY_PER_SOURCE;
use crate::db::{EpisodeKey, Store};
use crate::domain::{ListId, MediaId, MediaKind, UserId};
use crate::models::{HistoryEntry, Media, RecentEpisode, WatchProgress, WatchedEpisode};
use crate::services::episode_service::{EpisodeError, EpisodeTrackingService, ShowWatchState};

pub struct SeaOrmEpisodeTrackingService {
    store: Store,
}

impl SeaOrmEpisodeTrackingService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn validate_numbers(season: i32, episode: i32) -> Result<(), EpisodeError> {
        let range = MIN_NUMBER..=MAX_NUMBER;
        if !range.contains(&season) {
            return Err(EpisodeError::Validation(format!(
                "Season number must be between {MIN_NUMBER} and {MAX_NUMBER}"
            )));
        }
        if !range.contains(&episode) {
            return Err(EpisodeError::Validation(format!(
                "Episode number must be between {MIN_NUMBER} and {MAX_NUMBER}"
            )));
        }
        Ok(())
    }

    async fn require_show(&self, show_id: MediaId) -> Result<Media, EpisodeError> {
        let media = self
            .store
            .get_media(show_id)
            .await?
            .ok_or(EpisodeError::NotFound(show_id))?;

        if media.kind() != MediaKind::TvShow {
            return Err(EpisodeError::Validation(format!(
                "Media {show_id} is a movie and has no episodes"
            )));
        }

        Ok(media)
    }

    async fn compute_progress(
        &self,
        user_id: UserId,
        show: &Media,
    ) -> Result<WatchProgress, EpisodeError> {
        let watched = self.store.count_watched_for_show(user_id, show.id).await?;
        let total = show
            .total_episodes()
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0);
        Ok(WatchProgress::compute(watched, total))
    }
}

/// Interleaves both sources newest first and keeps `limit` entries.
fn merge_history(
    episodes: Vec<RecentEpisode>,
    movies: Vec<(i32, String, i32, String)>,
    limit: usize,
) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = episodes
        .into_iter()
        .map(|e| HistoryEntry::Episode {
            media_id: e.media_id,
            title: e.show_title,
            season_number: e.season_number,
            episode_number: e.episode_number,
            watched_at: e.watched_at,
        })
        .chain(
            movies
                .into_iter()
                .map(|(media_id, title, list_id, watched_at)| HistoryEntry::Movie {
                    media_id: MediaId::new(media_id),
                    title,
                    list_id: ListId::new(list_id),
                    watched_at,
                }),
        )
        .collect();

    entries.sort_by(|a, b| b.watched_at().cmp(a.watched_at()));
    entries.truncate(limit);
    entries
}

#[async_trait]
impl EpisodeTrackingService for SeaOrmEpisodeTrackingService {
    async fn mark_watched(
        &self,
        user_id: UserId,
        show_id: MediaId,
        season: i32,
        episode: i32,
    ) -> Result<WatchedEpisode, EpisodeError> {
        Self::validate_numbers(season, episode)?;
        self.require_show(show_id).await?;

        let mark = self
            .store
            .mark_episode(EpisodeKey {
                user_id,
                show_id,
                season,
                episode,
            })
            .await?;

        debug!(user_id = %user_id, show_id = %show_id, season, episode, "Episode marked watched");
        Ok(mark)
    }

    async fn unmark_watched(
        &self,
        user_id: UserId,
        show_id: MediaId,
        season: i32,
        episode: i32,
    ) -> Result<bool, EpisodeError> {
        Self::validate_numbers(season, episode)?;
        self.require_show(show_id).await?;

        Ok(self
            .store
            .unmark_episode(EpisodeKey {
                user_id,
                show_id,
                season,
                episode,
            })
            .await?)
    }

    async fn watched_episodes(
        &self,
        user_id: UserId,
        show_id: MediaId,
    ) -> Result<ShowWatchState, EpisodeError> {
        let show = self.require_show(show_id).await?;
        let episodes = self
            .store
            .watched_episodes_for_show(user_id, show_id)
            .await?;
        let progress = self.compute_progress(user_id, &show).await?;

        Ok(ShowWatchState {
            media_id: show.id,
            title: show.info.title,
            episodes,
            progress,
        })
    }

    async fn progress(
        &self,
        user_id: UserId,
        show_id: MediaId,
    ) -> Result<WatchProgress, EpisodeError> {
        let show = self.require_show(show_id).await?;
        self.compute_progress(user_id, &show).await
    }

    async fn history(&self, user_id: UserId) -> Result<Vec<HistoryEntry>, EpisodeError> {
        let episodes = self
            .store
            .recent_episodes(user_id, HISTORY_PER_SOURCE)
            .await?;
        let movies = self.store.watched_movies(user_id, HISTORY_PER_SOURCE).await?;

        #[allow(clippy::cast_possible_truncation)]
        let limit = (HISTORY_PER_SOURCE * 2) as usize;
        Ok(merge_history(episodes, movies, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_outside_range_are_rejected() {
        assert!(SeaOrmEpisodeTrackingService::validate_numbers(1, 1).is_ok());
        assert!(SeaOrmEpisodeTrackingService::validate_numbers(1000, 1000).is_ok());
        assert!(matches!(
            SeaOrmEpisodeTrackingService::validate_numbers(0, 1),
            Err(EpisodeError::Validation(_))
        ));
        assert!(matches!(
            SeaOrmEpisodeTrackingService::validate_numbers(1, 1001),
            Err(EpisodeError::Validation(_))
        ));
    }

    #[test]
    fn history_interleaves_newest_first() {
        let episodes = vec![
            RecentEpisode {
                media_id: MediaId::new(1),
                show_title: "Dark".to_string(),
                season_number: 1,
                episode_number: 2,
                watched_at: "2024-03-03T10:00:00+00:00".to_string(),
            },
            RecentEpisode {
                media_id: MediaId::new(1),
                show_title: "Dark".to_string(),
                season_number: 1,
                episode_number: 1,
                watched_at: "2024-03-01T10:00:00+00:00".to_string(),
            },
        ];
        let movies = vec![(
            7,
            "Heat".to_string(),
            3,
            "2024-03-02T10:00:00+00:00".to_string(),
        )];

        let history = merge_history(episodes, movies, 10);
        let stamps: Vec<&str> = history.iter().map(HistoryEntry::watched_at).collect();
        assert_eq!(
            stamps,
            vec![
                "2024-03-03T10:00:00+00:00",
                "2024-03-02T10:00:00+00:00",
                "2024-03-01T10:00:00+00:00",
            ]
        );
        assert!(matches!(history[1], HistoryEntry::Movie { .. }));

        assert_eq!(merge_history(Vec::new(), Vec::new(), 10), Vec::new());
    }
}
