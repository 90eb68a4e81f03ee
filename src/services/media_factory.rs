//! Builds movie and show rows from a flat [`MediaPayload`].
//!
//! The kind tag selects the variant; fields that belong to the other kind are
//! dropped and missing optional fields keep their defaults.

use crate::db::Store;
use crate::domain::MediaKind;
use crate::models::{
    Media, MediaDetails, MediaInfo, MediaPayload, MovieDetails, NewMedia, TvShowDetails,
};
use crate::services::media_service::MediaError;

pub struct MediaFactory {
    store: Store,
}

impl MediaFactory {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Parses a user or provider supplied kind string.
    pub fn parse_kind(raw: &str) -> Result<MediaKind, MediaError> {
        raw.parse::<MediaKind>()
            .map_err(|e| MediaError::Validation(e.to_string()))
    }

    /// Validates the payload and builds the unsaved row for `kind`.
    pub fn build(kind: MediaKind, payload: MediaPayload) -> Result<NewMedia, MediaError> {
        let mut title = payload.title.trim().to_string();
        let original_title = payload.original_title.trim().to_string();
        if title.is_empty() {
            title.clone_from(&original_title);
        }
        if title.is_empty() {
            return Err(MediaError::Validation("Title is required".to_string()));
        }

        if payload.vote_count < 0 {
            return Err(MediaError::Validation(
                "Vote count cannot be negative".to_string(),
            ));
        }
        if !(0.0..=10.0).contains(&payload.vote_average) {
            return Err(MediaError::Validation(
                "Vote average must be between 0 and 10".to_string(),
            ));
        }

        let info = MediaInfo {
            tmdb_id: payload.tmdb_id,
            original_title: if original_title.is_empty() {
                title.clone()
            } else {
                original_title
            },
            title,
            overview: payload.overview,
            poster_path: payload.poster_path,
            backdrop_path: payload.backdrop_path,
            release_date: payload.release_date,
            popularity: payload.popularity.max(0.0),
            vote_average: payload.vote_average,
            vote_count: payload.vote_count,
            original_language: payload.original_language,
        };

        let details = match kind {
            MediaKind::Movie => {
                if payload.runtime.is_some_and(|r| r < 0) {
                    return Err(MediaError::Validation(
                        "Runtime cannot be negative".to_string(),
                    ));
                }
                MediaDetails::Movie(MovieDetails {
                    runtime: payload.runtime,
                    budget: payload.budget,
                    revenue: payload.revenue,
                })
            }
            MediaKind::TvShow => {
                if payload.number_of_seasons < 0 || payload.number_of_episodes < 0 {
                    return Err(MediaError::Validation(
                        "Season and episode counts cannot be negative".to_string(),
                    ));
                }
                MediaDetails::TvShow(TvShowDetails {
                    number_of_seasons: payload.number_of_seasons,
                    number_of_episodes: payload.number_of_episodes,
                    episode_run_time: payload.episode_run_time,
                    status: payload.status,
                    first_air_date: payload.first_air_date.or(payload.release_date),
                    last_air_date: payload.last_air_date,
                })
            }
        };

        Ok(NewMedia { info, details })
    }

    /// Builds and persists in one step.
    pub async fn create(&self, kind: MediaKind, payload: MediaPayload) -> Result<Media, MediaError> {
        let new_media = Self::build(kind, payload)?;
        Ok(self.store.insert_media(new_media).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload() -> MediaPayload {
        MediaPayload {
            tmdb_id: Some(603),
            title: "The Matrix".to_string(),
            vote_average: 8.2,
            vote_count: 1000,
            runtime: Some(136),
            budget: 63_000_000,
            revenue: 463_517_383,
            number_of_seasons: 3,
            number_of_episodes: 30,
            status: "Ended".to_string(),
            ..MediaPayload::default()
        }
    }

    #[test]
    fn movie_takes_movie_fields_only() {
        let media = MediaFactory::build(MediaKind::Movie, payload()).unwrap();

        assert_eq!(media.kind(), MediaKind::Movie);
        assert_eq!(
            media.details,
            MediaDetails::Movie(MovieDetails {
                runtime: Some(136),
                budget: 63_000_000,
                revenue: 463_517_383,
            })
        );
        assert_eq!(media.info.original_title, "The Matrix");
    }

    #[test]
    fn show_takes_show_fields_and_falls_back_to_release_date() {
        let mut input = payload();
        input.release_date = NaiveDate::from_ymd_opt(2019, 1, 1);
        let media = MediaFactory::build(MediaKind::TvShow, input).unwrap();

        let MediaDetails::TvShow(show) = media.details else {
            panic!("expected a show");
        };
        assert_eq!(show.number_of_seasons, 3);
        assert_eq!(show.number_of_episodes, 30);
        assert_eq!(show.status, "Ended");
        assert_eq!(show.episode_run_time, None);
        assert_eq!(show.first_air_date, NaiveDate::from_ymd_opt(2019, 1, 1));
    }

    #[test]
    fn blank_title_uses_original_title() {
        let mut input = payload();
        input.title = "  ".to_string();
        input.original_title = "Matrix".to_string();

        let media = MediaFactory::build(MediaKind::Movie, input).unwrap();
        assert_eq!(media.info.title, "Matrix");
    }

    #[test]
    fn missing_title_is_rejected() {
        let mut input = payload();
        input.title = String::new();

        assert!(matches!(
            MediaFactory::build(MediaKind::Movie, input),
            Err(MediaError::Validation(_))
        ));
    }

    #[test]
    fn negative_counts_are_rejected() {
        let mut input = payload();
        input.number_of_episodes = -1;

        assert!(matches!(
            MediaFactory::build(MediaKind::TvShow, input),
            Err(MediaError::Validation(_))
        ));
    }

    #[test]
    fn unknown_kind_is_a_validation_error() {
        assert_eq!(MediaFactory::parse_kind("TV_SHOW").unwrap(), MediaKind::TvShow);
        assert!(matches!(
            MediaFactory::parse_kind("podcast"),
            Err(MediaError::Validation(_))
        ));
    }
}
