//! Domain primitives for media tracking.
//!
//! Ids are newtypes so a list id can never be passed where a media id is
//! expected. Kind and status enums carry their persisted spelling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

entity_id!(
    /// Primary key of a registered account.
    UserId
);
entity_id!(
    /// Primary key of a movie or TV show row.
    MediaId
);
entity_id!(ListId);
entity_id!(ListItemId);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {what}: '{value}'")]
pub struct ParseEnumError {
    what: &'static str,
    value: String,
}

/// Discriminates the two media variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    TvShow,
}

impl MediaKind {
    /// Persisted spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "MOVIE",
            Self::TvShow => "TV_SHOW",
        }
    }

    /// Path segment used by TMDb (`movie`, `tv`).
    #[must_use]
    pub const fn provider_path(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::TvShow => "tv",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "movie" | "movies" | "film" => Ok(Self::Movie),
            "tv" | "tv_show" | "tvshow" | "show" | "series" => Ok(Self::TvShow),
            _ => Err(ParseEnumError {
                what: "media kind",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for MediaKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MediaKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Status of a list item. Any transition is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WatchStatus {
    #[default]
    Planned,
    InProgress,
    Watched,
}

impl WatchStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Watched => "WATCHED",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "PLANNED" => Ok(Self::Planned),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "WATCHED" => Ok(Self::Watched),
            _ => Err(ParseEnumError {
                what: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for WatchStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Ordering for the "my media" browse view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseSort {
    TitleAsc,
    TitleDesc,
    RatingAsc,
    RatingDesc,
    #[default]
    Newest,
}

impl BrowseSort {
    /// Lenient parse: unknown values fall back to newest-first.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("title") => Self::TitleAsc,
            Some("-title") => Self::TitleDesc,
            Some("rating") => Self::RatingAsc,
            Some("-rating") => Self::RatingDesc,
            _ => Self::Newest,
        }
    }
}
