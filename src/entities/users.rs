use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Public handle used in profile URLs.
    #[sea_orm(unique)]
    pub nickname: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Random API key (64-char hex string)
    #[sea_orm(unique)]
    pub api_key: String,

    pub is_2fa_enabled: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::lists::Entity")]
    Lists,
    #[sea_orm(has_many = "super::watched_episodes::Entity")]
    WatchedEpisodes,
    #[sea_orm(has_one = "super::public_profiles::Entity")]
    PublicProfiles,
}

impl Related<super::lists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lists.def()
    }
}

impl Related<super::watched_episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WatchedEpisodes.def()
    }
}

impl Related<super::public_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PublicProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
