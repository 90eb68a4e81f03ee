pub mod tmdb;

pub use tmdb::{Credits, TmdbClient, TmdbError};
