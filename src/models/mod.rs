pub mod episode;
pub mod list;
pub mod media;
pub mod profile;

pub use episode::{HistoryEntry, RecentEpisode, WatchProgress, WatchedEpisode};
pub use list::{DashboardStats, ListItem, ListItemView, ListUpdate, MediaCard, MediaList};
pub use media::{
    CastMember, Media, MediaDetails, MediaInfo, MediaPayload, MediaSummary, MovieDetails,
    NewMedia, ProviderDetails, SeasonSummary, TvShowDetails,
};
pub use profile::{ProfileStats, ProfileUpdate, PublicProfile, PublicProfileView};
