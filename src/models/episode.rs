use serde::Serialize;

use crate::domain::{ListId, MediaId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchedEpisode {
    pub id: i32,
    pub user_id: UserId,
    pub tv_show_id: MediaId,
    pub season_number: i32,
    pub episode_number: i32,
    pub watched_at: String,
}

/// Watch progress of one user on one show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WatchProgress {
    pub watched_episodes: u64,
    pub total_episodes: u64,
    /// `0.0..=1.0`
    pub fraction: f64,
    pub progress_percentage: u8,
}

impl WatchProgress {
    /// Zero when the show declares no episodes. Clamped to 1.0 when more
    /// episodes are marked than declared.
    #[must_use]
    pub fn compute(watched: u64, total: u64) -> Self {
        let fraction = if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let raw = watched as f64 / total as f64;
            raw.min(1.0)
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let progress_percentage = (fraction * 100.0).floor() as u8;

        Self {
            watched_episodes: watched,
            total_episodes: total,
            fraction,
            progress_percentage,
        }
    }
}

/// One line of the watch history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    Episode {
        media_id: MediaId,
        title: String,
        season_number: i32,
        episode_number: i32,
        watched_at: String,
    },
    Movie {
        media_id: MediaId,
        title: String,
        list_id: ListId,
        watched_at: String,
    },
}

impl HistoryEntry {
    #[must_use]
    pub fn watched_at(&self) -> &str {
        match self {
            Self::Episode { watched_at, .. } | Self::Movie { watched_at, .. } => watched_at,
        }
    }
}

/// Recent episode shown on a public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentEpisode {
    pub media_id: MediaId,
    pub show_title: String,
    pub season_number: i32,
    pub episode_number: i32,
    pub watched_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_zero_without_declared_episodes() {
        let progress = WatchProgress::compute(3, 0);
        assert!(progress.fraction.abs() < f64::EPSILON);
        assert_eq!(progress.progress_percentage, 0);
    }

    #[test]
    fn progress_fraction_and_percentage() {
        let progress = WatchProgress::compute(1, 3);
        assert!((progress.fraction - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(progress.progress_percentage, 33);

        let done = WatchProgress::compute(10, 10);
        assert_eq!(done.progress_percentage, 100);
    }

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let mut last = 0.0;
        for watched in 0..=12 {
            let progress = WatchProgress::compute(watched, 10);
            assert!(progress.fraction >= last);
            assert!(progress.fraction <= 1.0);
            last = progress.fraction;
        }
    }
}
