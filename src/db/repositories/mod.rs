pub mod episode;
pub mod list;
pub mod media;
pub mod profile;
pub mod user;
