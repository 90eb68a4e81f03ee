use sea_orm::entity::prelude::*;

/// Columns shared by every media kind. Kind-specific columns live in
/// `movies` and `tv_shows`, keyed by `media_id`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "media")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// TMDb id; absent for manual entries.
    pub tmdb_id: Option<i64>,
    /// `MOVIE` or `TV_SHOW`. Never changes after insert.
    pub media_type: String,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub poster_path: String,
    pub backdrop_path: String,
    /// `YYYY-MM-DD`
    pub release_date: Option<String>,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: i32,
    pub original_language: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::movies::Entity")]
    Movies,
    #[sea_orm(has_one = "super::tv_shows::Entity")]
    TvShows,
    #[sea_orm(has_many = "super::list_items::Entity")]
    ListItems,
    #[sea_orm(has_many = "super::watched_episodes::Entity")]
    WatchedEpisodes,
}

impl Related<super::movies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movies.def()
    }
}

impl Related<super::tv_shows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TvShows.def()
    }
}

impl Related<super::list_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListItems.def()
    }
}

impl Related<super::watched_episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WatchedEpisodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
