use crate::entities::prelude::*;
use crate::entities::{list_items, media, watched_episodes};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Parents before children so foreign keys resolve.
        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PublicProfiles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Media)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Movies)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TvShows)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(WatchedEpisodes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Lists)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ListItems)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // NULL tmdb ids (manual entries) never collide.
        manager
            .create_index(
                Index::create()
                    .name("idx_media_tmdb_kind_unique")
                    .table(Media)
                    .col(media::Column::TmdbId)
                    .col(media::Column::MediaType)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_media_title")
                    .table(Media)
                    .col(media::Column::Title)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watched_episode_unique")
                    .table(WatchedEpisodes)
                    .col(watched_episodes::Column::UserId)
                    .col(watched_episodes::Column::TvShowId)
                    .col(watched_episodes::Column::SeasonNumber)
                    .col(watched_episodes::Column::EpisodeNumber)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_list_item_media_unique")
                    .table(ListItems)
                    .col(list_items::Column::ListId)
                    .col(list_items::Column::MediaId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_list_item_position")
                    .table(ListItems)
                    .col(list_items::Column::ListId)
                    .col(list_items::Column::Position)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ListItems).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lists).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WatchedEpisodes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TvShows).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movies).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Media).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PublicProfiles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
