pub mod prelude;

pub mod list_items;
pub mod lists;
pub mod media;
pub mod movies;
pub mod public_profiles;
pub mod tv_shows;
pub mod users;
pub mod watched_episodes;
