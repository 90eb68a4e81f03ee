use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TmdbConfig;
use crate::constants::limits::{MAX_CAST, MAX_DIRECTORS};
use crate::domain::MediaKind;
use crate::models::media::parse_date;
use crate::models::{CastMember, MediaPayload, MediaSummary, SeasonSummary};

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("TMDb API key is not configured")]
    MissingApiKey,

    #[error("TMDb request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("TMDb returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode TMDb response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TmdbError {
    /// Transport failures, rate limiting and server errors are worth another
    /// attempt. Client errors and bad payloads are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            Self::MissingApiKey | Self::Decode(_) => false,
        }
    }

    const fn outcome(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_key",
            Self::Request(_) => "transport",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Movie hits carry `title`, show hits carry `name`; never both.
#[derive(Debug, Deserialize)]
struct SearchHit {
    id: i64,
    #[serde(default, alias = "name")]
    title: Option<String>,
    #[serde(default, alias = "original_name")]
    original_title: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default, alias = "first_air_date")]
    release_date: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    popularity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDetails {
    id: i64,
    title: Option<String>,
    name: Option<String>,
    original_title: Option<String>,
    original_name: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    popularity: Option<f64>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
    original_language: Option<String>,

    runtime: Option<i32>,
    budget: Option<i64>,
    revenue: Option<i64>,

    number_of_seasons: Option<i32>,
    number_of_episodes: Option<i32>,
    episode_run_time: Vec<i32>,
    status: Option<String>,
    first_air_date: Option<String>,
    last_air_date: Option<String>,
    seasons: Vec<RawSeason>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSeason {
    season_number: i32,
    episode_count: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCredits {
    cast: Vec<RawCast>,
    crew: Vec<RawCrew>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCast {
    name: String,
    character: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCrew {
    name: String,
    job: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExternalIds {
    imdb_id: Option<String>,
}

/// Directors and top-billed cast for one title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credits {
    pub directors: Vec<String>,
    pub cast: Vec<CastMember>,
}

fn summary_from_hit(hit: SearchHit, kind: MediaKind) -> MediaSummary {
    MediaSummary {
        tmdb_id: hit.id,
        media_type: kind,
        title: hit.title.unwrap_or_default(),
        original_title: hit.original_title.unwrap_or_default(),
        overview: hit.overview.unwrap_or_default(),
        poster_path: hit.poster_path.unwrap_or_default(),
        release_date: hit.release_date.as_deref().and_then(parse_date),
        vote_average: hit.vote_average.unwrap_or_default(),
        popularity: hit.popularity.unwrap_or_default(),
        directors: Vec::new(),
        cast: Vec::new(),
    }
}

fn seasons_from_raw(raw: &[RawSeason]) -> Vec<SeasonSummary> {
    let mut seasons: Vec<SeasonSummary> = raw
        .iter()
        .filter(|s| s.season_number > 0)
        .map(|s| SeasonSummary {
            season_number: s.season_number,
            episode_count: s.episode_count.unwrap_or_default().max(0),
        })
        .collect();
    seasons.sort_by_key(|s| s.season_number);
    seasons
}

/// Flattens a movie or show detail record into the shared payload shape.
fn normalize_details(raw: RawDetails, kind: MediaKind) -> MediaPayload {
    let first_air_date = raw.first_air_date.as_deref().and_then(parse_date);
    let release_date = raw
        .release_date
        .as_deref()
        .and_then(parse_date)
        .or(first_air_date);

    let mut payload = MediaPayload {
        tmdb_id: Some(raw.id),
        title: raw.title.or(raw.name).unwrap_or_default(),
        original_title: raw.original_title.or(raw.original_name).unwrap_or_default(),
        overview: raw.overview.unwrap_or_default(),
        poster_path: raw.poster_path.unwrap_or_default(),
        backdrop_path: raw.backdrop_path.unwrap_or_default(),
        release_date,
        popularity: raw.popularity.unwrap_or_default(),
        vote_average: raw.vote_average.unwrap_or_default(),
        vote_count: raw
            .vote_count
            .map_or(0, |n| i32::try_from(n).unwrap_or(i32::MAX)),
        original_language: raw.original_language.unwrap_or_default(),
        ..MediaPayload::default()
    };

    match kind {
        MediaKind::Movie => {
            payload.runtime = raw.runtime;
            payload.budget = raw.budget.unwrap_or_default();
            payload.revenue = raw.revenue.unwrap_or_default();
        }
        MediaKind::TvShow => {
            payload.number_of_seasons = raw.number_of_seasons.unwrap_or_default();
            payload.number_of_episodes = raw.number_of_episodes.unwrap_or_default();
            payload.episode_run_time = raw.episode_run_time.first().copied();
            payload.status = raw.status.unwrap_or_default();
            payload.first_air_date = first_air_date;
            payload.last_air_date = raw.last_air_date.as_deref().and_then(parse_date);
        }
    }

    payload
}

fn credits_from_raw(raw: RawCredits) -> Credits {
    Credits {
        directors: raw
            .crew
            .into_iter()
            .filter(|c| c.job.as_deref() == Some("Director"))
            .map(|c| c.name)
            .take(MAX_DIRECTORS)
            .collect(),
        cast: raw
            .cast
            .into_iter()
            .take(MAX_CAST)
            .map(|c| CastMember {
                name: c.name,
                character: c.character.unwrap_or_default(),
            })
            .collect(),
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl TmdbClient {
    #[must_use]
    pub fn new(client: Client, config: &TmdbConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Searches movies, shows or both. Both kinds are queried concurrently
    /// and concatenated movies first.
    pub async fn search(
        &self,
        query: &str,
        kind: Option<MediaKind>,
    ) -> Result<Vec<MediaSummary>, TmdbError> {
        match kind {
            Some(kind) => self.search_kind(query, kind).await,
            None => {
                let (mut movies, shows) = tokio::try_join!(
                    self.search_kind(query, MediaKind::Movie),
                    self.search_kind(query, MediaKind::TvShow)
                )?;
                movies.extend(shows);
                Ok(movies)
            }
        }
    }

    async fn search_kind(
        &self,
        query: &str,
        kind: MediaKind,
    ) -> Result<Vec<MediaSummary>, TmdbError> {
        let path = format!("search/{}", kind.provider_path());
        let page: SearchPage = self
            .get_json(&path, &[("query", query), ("include_adult", "false")])
            .await?;

        Ok(page
            .results
            .into_iter()
            .map(|hit| summary_from_hit(hit, kind))
            .collect())
    }

    /// Full detail record normalised into a [`MediaPayload`].
    pub async fn fetch(&self, tmdb_id: i64, kind: MediaKind) -> Result<MediaPayload, TmdbError> {
        Ok(self.fetch_with_seasons(tmdb_id, kind).await?.0)
    }

    /// Like [`Self::fetch`], plus the season breakdown shows carry.
    pub async fn fetch_with_seasons(
        &self,
        tmdb_id: i64,
        kind: MediaKind,
    ) -> Result<(MediaPayload, Vec<SeasonSummary>), TmdbError> {
        let path = format!("{}/{tmdb_id}", kind.provider_path());
        let raw: RawDetails = self.get_json(&path, &[]).await?;
        let seasons = match kind {
            MediaKind::TvShow => seasons_from_raw(&raw.seasons),
            MediaKind::Movie => Vec::new(),
        };
        Ok((normalize_details(raw, kind), seasons))
    }

    pub async fn credits(&self, tmdb_id: i64, kind: MediaKind) -> Result<Credits, TmdbError> {
        let path = format!("{}/{tmdb_id}/credits", kind.provider_path());
        let raw: RawCredits = self.get_json(&path, &[]).await?;
        Ok(credits_from_raw(raw))
    }

    pub async fn imdb_id(&self, tmdb_id: i64, kind: MediaKind) -> Result<Option<String>, TmdbError> {
        let path = format!("{}/{tmdb_id}/external_ids", kind.provider_path());
        let ids: ExternalIds = self.get_json(&path, &[]).await?;
        Ok(ids.imdb_id.filter(|id| !id.is_empty()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, TmdbError> {
        if self.api_key.is_empty() {
            metrics::counter!("tmdb_requests_total", "outcome" => "missing_key").increment(1);
            return Err(TmdbError::MissingApiKey);
        }

        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut attempt: u32 = 0;

        loop {
            debug!(url = %url, attempt, "TMDb request");

            match self.send_once(&url, params).await {
                Ok(body) => {
                    metrics::counter!("tmdb_requests_total", "outcome" => "success").increment(1);
                    return serde_json::from_str(&body).map_err(|e| {
                        metrics::counter!("tmdb_requests_total", "outcome" => "decode")
                            .increment(1);
                        TmdbError::Decode(e)
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.retry_delay * 2u32.saturating_pow(attempt);
                    warn!(url = %url, attempt, error = %e, delay_ms = delay.as_millis(), "TMDb request failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    metrics::counter!("tmdb_requests_total", "outcome" => e.outcome())
                        .increment(1);
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TmdbError> {
        let response = self
            .client
            .get(url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TmdbError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn show_details_use_name_and_first_runtime() {
        let raw: RawDetails = serde_json::from_value(serde_json::json!({
            "id": 1396,
            "name": "Breaking Bad",
            "original_name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "last_air_date": "2013-09-29",
            "episode_run_time": [45, 47],
            "number_of_seasons": 5,
            "number_of_episodes": 62,
            "status": "Ended",
            "poster_path": null
        }))
        .unwrap();

        let payload = normalize_details(raw, MediaKind::TvShow);
        assert_eq!(payload.tmdb_id, Some(1396));
        assert_eq!(payload.title, "Breaking Bad");
        assert_eq!(payload.episode_run_time, Some(45));
        assert_eq!(payload.number_of_episodes, 62);
        assert_eq!(payload.release_date, NaiveDate::from_ymd_opt(2008, 1, 20));
        assert_eq!(payload.last_air_date, NaiveDate::from_ymd_opt(2013, 9, 29));
        assert_eq!(payload.poster_path, "");
    }

    #[test]
    fn movie_details_tolerate_bad_dates_and_missing_fields() {
        let raw: RawDetails = serde_json::from_value(serde_json::json!({
            "id": 27205,
            "title": "Inception",
            "release_date": "",
            "runtime": 148,
            "vote_count": 35000
        }))
        .unwrap();

        let payload = normalize_details(raw, MediaKind::Movie);
        assert_eq!(payload.title, "Inception");
        assert_eq!(payload.release_date, None);
        assert_eq!(payload.runtime, Some(148));
        assert_eq!(payload.vote_count, 35000);
        assert_eq!(payload.number_of_episodes, 0);
    }

    #[test]
    fn search_hits_accept_show_field_names() {
        let page: SearchPage = serde_json::from_value(serde_json::json!({
            "results": [
                {"id": 1, "name": "Dark", "original_name": "Dark", "first_air_date": "2017-12-01"}
            ]
        }))
        .unwrap();

        let hits: Vec<MediaSummary> = page
            .results
            .into_iter()
            .map(|hit| summary_from_hit(hit, MediaKind::TvShow))
            .collect();
        assert_eq!(hits[0].title, "Dark");
        assert_eq!(hits[0].media_type, MediaKind::TvShow);
        assert_eq!(hits[0].release_date, NaiveDate::from_ymd_opt(2017, 12, 1));
    }

    #[test]
    fn seasons_skip_specials_and_sort() {
        let raw: RawDetails = serde_json::from_value(serde_json::json!({
            "id": 1399,
            "name": "Game of Thrones",
            "seasons": [
                {"season_number": 2, "episode_count": 10},
                {"season_number": 0, "episode_count": 14},
                {"season_number": 1},
            ]
        }))
        .unwrap();

        let seasons = seasons_from_raw(&raw.seasons);
        assert_eq!(
            seasons,
            vec![
                SeasonSummary { season_number: 1, episode_count: 0 },
                SeasonSummary { season_number: 2, episode_count: 10 },
            ]
        );
    }

    #[test]
    fn credits_keep_two_directors_and_five_cast() {
        let raw: RawCredits = serde_json::from_value(serde_json::json!({
            "crew": [
                {"name": "A", "job": "Director"},
                {"name": "B", "job": "Producer"},
                {"name": "C", "job": "Director"},
                {"name": "D", "job": "Director"}
            ],
            "cast": (0..8).map(|i| serde_json::json!({"name": format!("Actor {i}")})).collect::<Vec<_>>()
        }))
        .unwrap();

        let credits = credits_from_raw(raw);
        assert_eq!(credits.directors, vec!["A", "C"]);
        assert_eq!(credits.cast.len(), 5);
        assert_eq!(credits.cast[0].character, "");
    }

    #[test]
    fn only_transient_failures_are_retried() {
        let status = |status| TmdbError::Status {
            status,
            body: String::new(),
        };
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!TmdbError::MissingApiKey.is_retryable());
    }
}
