pub use super::list_items::Entity as ListItems;
pub use super::lists::Entity as Lists;
pub use super::media::Entity as Media;
pub use super::movies::Entity as Movies;
pub use super::public_profiles::Entity as PublicProfiles;
pub use super::tv_shows::Entity as TvShows;
pub use super::users::Entity as Users;
pub use super::watched_episodes::Entity as WatchedEpisodes;
