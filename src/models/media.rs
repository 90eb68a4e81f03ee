use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{MediaId, MediaKind};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date. Anything else (including "") is `None`.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Accepts a date string, null or a missing field. Unparsable strings map to
/// `None` instead of failing the whole payload.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

/// Metadata shared by movies and shows.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MediaInfo {
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub release_date: Option<NaiveDate>,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i32,
    pub original_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MovieDetails {
    pub runtime: Option<i32>,
    pub budget: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TvShowDetails {
    pub number_of_seasons: i32,
    pub number_of_episodes: i32,
    pub episode_run_time: Option<i32>,
    pub status: String,
    pub first_air_date: Option<NaiveDate>,
    pub last_air_date: Option<NaiveDate>,
}

/// Kind-specific fields. The variant is the media kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "media_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaDetails {
    Movie(MovieDetails),
    TvShow(TvShowDetails),
}

impl MediaDetails {
    #[must_use]
    pub const fn kind(&self) -> MediaKind {
        match self {
            Self::Movie(_) => MediaKind::Movie,
            Self::TvShow(_) => MediaKind::TvShow,
        }
    }

    #[must_use]
    pub const fn as_tv_show(&self) -> Option<&TvShowDetails> {
        match self {
            Self::TvShow(show) => Some(show),
            Self::Movie(_) => None,
        }
    }
}

/// A media row that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMedia {
    #[serde(flatten)]
    pub info: MediaInfo,
    #[serde(flatten)]
    pub details: MediaDetails,
}

impl NewMedia {
    #[must_use]
    pub const fn kind(&self) -> MediaKind {
        self.details.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Media {
    pub id: MediaId,
    #[serde(flatten)]
    pub info: MediaInfo,
    #[serde(flatten)]
    pub details: MediaDetails,
    pub created_at: String,
    pub updated_at: String,
}

impl Media {
    #[must_use]
    pub const fn kind(&self) -> MediaKind {
        self.details.kind()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.info.title
    }

    /// Manually entered media has no provider id and is never refreshed.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        self.info.tmdb_id.is_none()
    }

    /// Declared episode count for shows, `None` for movies.
    #[must_use]
    pub fn total_episodes(&self) -> Option<i32> {
        self.details.as_tv_show().map(|s| s.number_of_episodes)
    }
}

/// Flat, kind-agnostic metadata as produced by the provider client or posted
/// by a user for manual entry. Fields that don't apply to the target kind
/// are ignored when the factory builds the row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPayload {
    pub tmdb_id: Option<i64>,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub poster_path: String,
    pub backdrop_path: String,
    #[serde(deserialize_with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i32,
    pub original_language: String,

    pub runtime: Option<i32>,
    pub budget: i64,
    pub revenue: i64,

    pub number_of_seasons: i32,
    pub number_of_episodes: i32,
    pub episode_run_time: Option<i32>,
    pub status: String,
    #[serde(deserialize_with = "lenient_date")]
    pub first_air_date: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub last_air_date: Option<NaiveDate>,
}

/// Lightweight search hit from the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSummary {
    pub tmdb_id: i64,
    pub media_type: MediaKind,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub poster_path: String,
    pub release_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub popularity: f64,
    /// Filled in by search enrichment; empty when credits were unavailable.
    pub directors: Vec<String>,
    pub cast: Vec<String>,
}

/// One season as the provider reports it. Specials (season 0) are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeasonSummary {
    pub season_number: i32,
    pub episode_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastMember {
    pub name: String,
    pub character: String,
}

/// Full provider record for the detail page. Credits and external ids are
/// best-effort and may be empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderDetails {
    pub media_type: MediaKind,
    #[serde(flatten)]
    pub payload: MediaPayload,
    pub directors: Vec<String>,
    pub cast: Vec<CastMember>,
    pub imdb_id: Option<String>,
    /// Per-season episode counts for shows, empty for movies.
    pub seasons: Vec<SeasonSummary>,
    /// Local row already imported from this provider id, if any.
    pub local_id: Option<MediaId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_is_lenient() {
        assert_eq!(parse_date("2010-07-16"), NaiveDate::from_ymd_opt(2010, 7, 16));
        assert_eq!(parse_date(" 2010-07-16 "), NaiveDate::from_ymd_opt(2010, 7, 16));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("16/07/2010"), None);
    }

    #[test]
    fn payload_ignores_unknown_fields_and_bad_dates() {
        let payload: MediaPayload = serde_json::from_value(serde_json::json!({
            "title": "Inception",
            "release_date": "not-a-date",
            "first_air_date": null,
            "genres": ["Sci-Fi"],
        }))
        .unwrap();

        assert_eq!(payload.title, "Inception");
        assert_eq!(payload.release_date, None);
        assert_eq!(payload.runtime, None);
        assert_eq!(payload.vote_count, 0);
    }

    #[test]
    fn media_serializes_kind_tag_flat() {
        let media = Media {
            id: MediaId::new(1),
            info: MediaInfo {
                title: "Dark".to_string(),
                ..MediaInfo::default()
            },
            details: MediaDetails::TvShow(TvShowDetails {
                number_of_episodes: 26,
                ..TvShowDetails::default()
            }),
            created_at: String::new(),
            updated_at: String::new(),
        };

        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["media_type"], "TV_SHOW");
        assert_eq!(json["title"], "Dark");
        assert_eq!(json["number_of_episodes"], 26);
        assert_eq!(media.total_episodes(), Some(26));
        assert!(media.is_manual());
    }
}
