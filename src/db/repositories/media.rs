use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::{BrowseSort, MediaId, MediaKind, UserId};
use crate::entities::{list_items, lists, media, movies, tv_shows};
use crate::models::media::{format_date, parse_date};
use crate::models::{
    Media, MediaCard, MediaDetails, MediaInfo, MovieDetails, NewMedia, TvShowDetails,
};

const LIKE_ESCAPE: char = '!';

/// Escapes the LIKE wildcards (and the escape character) in `query`.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// `%query%` with wildcards in `query` matched literally.
fn contains_pattern(query: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(query))).escape(LIKE_ESCAPE)
}

fn info_from_model(model: &media::Model) -> MediaInfo {
    MediaInfo {
        tmdb_id: model.tmdb_id,
        title: model.title.clone(),
        original_title: model.original_title.clone(),
        overview: model.overview.clone(),
        poster_path: model.poster_path.clone(),
        backdrop_path: model.backdrop_path.clone(),
        release_date: model.release_date.as_deref().and_then(parse_date),
        popularity: model.popularity,
        vote_average: model.vote_average,
        vote_count: model.vote_count,
        original_language: model.original_language.clone(),
    }
}

fn movie_details(row: Option<movies::Model>) -> MovieDetails {
    row.map(|m| MovieDetails {
        runtime: m.runtime,
        budget: m.budget,
        revenue: m.revenue,
    })
    .unwrap_or_default()
}

fn tv_details(row: Option<tv_shows::Model>) -> TvShowDetails {
    row.map(|s| TvShowDetails {
        number_of_seasons: s.number_of_seasons,
        number_of_episodes: s.number_of_episodes,
        episode_run_time: s.episode_run_time,
        status: s.status,
        first_air_date: s.first_air_date.as_deref().and_then(parse_date),
        last_air_date: s.last_air_date.as_deref().and_then(parse_date),
    })
    .unwrap_or_default()
}

fn stored_kind(model: &media::Model) -> Result<MediaKind> {
    model
        .media_type
        .parse()
        .with_context(|| format!("Media {} has a corrupt media_type", model.id))
}

/// Writes the metadata columns shared by insert and refresh. `tmdb_id` and
/// `media_type` are left to the caller.
fn apply_info(active: &mut media::ActiveModel, info: &MediaInfo) {
    active.title = Set(info.title.clone());
    active.original_title = Set(info.original_title.clone());
    active.overview = Set(info.overview.clone());
    active.poster_path = Set(info.poster_path.clone());
    active.backdrop_path = Set(info.backdrop_path.clone());
    active.release_date = Set(info.release_date.map(format_date));
    active.popularity = Set(info.popularity);
    active.vote_average = Set(info.vote_average);
    active.vote_count = Set(info.vote_count);
    active.original_language = Set(info.original_language.clone());
}

fn movie_active(media_id: i32, details: &MovieDetails) -> movies::ActiveModel {
    movies::ActiveModel {
        media_id: Set(media_id),
        runtime: Set(details.runtime),
        budget: Set(details.budget),
        revenue: Set(details.revenue),
    }
}

fn tv_active(media_id: i32, details: &TvShowDetails) -> tv_shows::ActiveModel {
    tv_shows::ActiveModel {
        media_id: Set(media_id),
        number_of_seasons: Set(details.number_of_seasons),
        number_of_episodes: Set(details.number_of_episodes),
        episode_run_time: Set(details.episode_run_time),
        status: Set(details.status.clone()),
        first_air_date: Set(details.first_air_date.map(format_date)),
        last_air_date: Set(details.last_air_date.map(format_date)),
    }
}

/// Loads kind-specific rows for a batch of media rows in two queries.
async fn assemble<C: ConnectionTrait>(conn: &C, models: Vec<media::Model>) -> Result<Vec<Media>> {
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut movie_rows: HashMap<i32, movies::Model> = movies::Entity::find()
        .filter(movies::Column::MediaId.is_in(ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.media_id, m))
        .collect();

    let mut tv_rows: HashMap<i32, tv_shows::Model> = tv_shows::Entity::find()
        .filter(tv_shows::Column::MediaId.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.media_id, s))
        .collect();

    models
        .into_iter()
        .map(|model| {
            let details = match stored_kind(&model)? {
                MediaKind::Movie => MediaDetails::Movie(movie_details(movie_rows.remove(&model.id))),
                MediaKind::TvShow => MediaDetails::TvShow(tv_details(tv_rows.remove(&model.id))),
            };

            Ok(Media {
                id: MediaId::new(model.id),
                info: info_from_model(&model),
                details,
                created_at: model.created_at,
                updated_at: model.updated_at,
            })
        })
        .collect()
}

pub struct MediaRepository {
    conn: DatabaseConnection,
}

impl MediaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts the shared row and its kind row in one transaction.
    pub async fn insert(&self, new_media: NewMedia) -> Result<Media> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let mut active = media::ActiveModel {
            tmdb_id: Set(new_media.info.tmdb_id),
            media_type: Set(new_media.kind().as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        apply_info(&mut active, &new_media.info);
        let model = active
            .insert(&txn)
            .await
            .context("Failed to insert media")?;

        match &new_media.details {
            MediaDetails::Movie(details) => {
                movies::Entity::insert(movie_active(model.id, details))
                    .exec(&txn)
                    .await?;
            }
            MediaDetails::TvShow(details) => {
                tv_shows::Entity::insert(tv_active(model.id, details))
                    .exec(&txn)
                    .await?;
            }
        }

        txn.commit().await?;

        Ok(Media {
            id: MediaId::new(model.id),
            info: info_from_model(&model),
            details: new_media.details,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    pub async fn get(&self, id: MediaId) -> Result<Option<Media>> {
        let Some(model) = media::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query media")?
        else {
            return Ok(None);
        };

        Ok(assemble(&self.conn, vec![model]).await?.pop())
    }

    pub async fn get_by_tmdb(&self, tmdb_id: i64, kind: MediaKind) -> Result<Option<Media>> {
        let Some(model) = media::Entity::find()
            .filter(media::Column::TmdbId.eq(tmdb_id))
            .filter(media::Column::MediaType.eq(kind.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query media by TMDb id")?
        else {
            return Ok(None);
        };

        Ok(assemble(&self.conn, vec![model]).await?.pop())
    }

    /// Case-insensitive substring match on title or original title.
    pub async fn search_title(
        &self,
        query: &str,
        kind: Option<MediaKind>,
        limit: u64,
    ) -> Result<Vec<Media>> {
        let mut select = media::Entity::find().filter(
            Condition::any()
                .add(media::Column::Title.like(contains_pattern(query)))
                .add(media::Column::OriginalTitle.like(contains_pattern(query))),
        );
        if let Some(kind) = kind {
            select = select.filter(media::Column::MediaType.eq(kind.as_str()));
        }

        let models = select
            .order_by_desc(media::Column::Popularity)
            .order_by_asc(media::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to search local media")?;

        assemble(&self.conn, models).await
    }

    /// Overwrites mutable metadata. The stored kind and provider id are kept;
    /// a payload of a different kind is rejected.
    pub async fn update_metadata(&self, id: MediaId, fresh: NewMedia) -> Result<Media> {
        let txn = self.conn.begin().await?;

        // Write before reading so concurrent refreshes queue on the lock.
        media::Entity::update_many()
            .col_expr(
                media::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(media::Column::Id.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to lock media row")?;

        let model = media::Entity::find_by_id(id.value())
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Media not found: {id}"))?;

        let kind = stored_kind(&model)?;
        if kind != fresh.kind() {
            anyhow::bail!(
                "Refusing to change media {id} from {kind} to {}",
                fresh.kind()
            );
        }

        let mut active: media::ActiveModel = model.into();
        apply_info(&mut active, &fresh.info);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active.update(&txn).await?;

        match &fresh.details {
            MediaDetails::Movie(details) => {
                movies::Entity::insert(movie_active(id.value(), details))
                    .on_conflict(
                        sea_orm::sea_query::OnConflict::column(movies::Column::MediaId)
                            .update_columns([
                                movies::Column::Runtime,
                                movies::Column::Budget,
                                movies::Column::Revenue,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&txn)
                    .await?;
            }
            MediaDetails::TvShow(details) => {
                tv_shows::Entity::insert(tv_active(id.value(), details))
                    .on_conflict(
                        sea_orm::sea_query::OnConflict::column(tv_shows::Column::MediaId)
                            .update_columns([
                                tv_shows::Column::NumberOfSeasons,
                                tv_shows::Column::NumberOfEpisodes,
                                tv_shows::Column::EpisodeRunTime,
                                tv_shows::Column::Status,
                                tv_shows::Column::FirstAirDate,
                                tv_shows::Column::LastAirDate,
                            ])
                            .to_owned(),
                    )
                    .exec_without_returning(&txn)
                    .await?;
            }
        }

        let media = assemble(&txn, vec![model])
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Media {id} vanished during refresh"))?;

        txn.commit().await?;
        Ok(media)
    }

    /// Ids of every row that came from the provider.
    pub async fn refreshable_ids(&self) -> Result<Vec<MediaId>> {
        let ids: Vec<i32> = media::Entity::find()
            .select_only()
            .column(media::Column::Id)
            .filter(media::Column::TmdbId.is_not_null())
            .order_by_asc(media::Column::Id)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list refreshable media")?;

        Ok(ids.into_iter().map(MediaId::new).collect())
    }

    /// Distinct media found in any of the user's lists.
    pub async fn browse_for_user(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
        sort: BrowseSort,
        limit: u64,
    ) -> Result<Vec<Media>> {
        let media_ids: Vec<i32> = list_items::Entity::find()
            .select_only()
            .column(list_items::Column::MediaId)
            .distinct()
            .inner_join(lists::Entity)
            .filter(lists::Column::UserId.eq(user_id.value()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to collect user media ids")?;

        if media_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut select = media::Entity::find().filter(media::Column::Id.is_in(media_ids));
        if let Some(kind) = kind {
            select = select.filter(media::Column::MediaType.eq(kind.as_str()));
        }

        select = match sort {
            BrowseSort::TitleAsc => select.order_by_asc(media::Column::Title),
            BrowseSort::TitleDesc => select.order_by_desc(media::Column::Title),
            BrowseSort::RatingAsc => select.order_by_asc(media::Column::VoteAverage),
            BrowseSort::RatingDesc => select.order_by_desc(media::Column::VoteAverage),
            BrowseSort::Newest => select.order_by_desc(media::Column::CreatedAt),
        };

        let models = select
            .order_by_desc(media::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to browse user media")?;

        assemble(&self.conn, models).await
    }

    /// Compact rows keyed by media id for list rendering.
    pub async fn cards(&self, ids: Vec<i32>) -> Result<HashMap<i32, MediaCard>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = media::Entity::find()
            .filter(media::Column::Id.is_in(ids))
            .all(&self.conn)
            .await
            .context("Failed to load media cards")?;

        models
            .into_iter()
            .map(|model| {
                let kind = stored_kind(&model)?;
                Ok((
                    model.id,
                    MediaCard {
                        id: MediaId::new(model.id),
                        media_type: kind,
                        release_date: model.release_date.as_deref().and_then(parse_date),
                        title: model.title,
                        poster_path: model.poster_path,
                        vote_average: model.vote_average,
                    },
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_quotes_wildcards() {
        assert_eq!(escape_like("thing"), "thing");
        assert_eq!(escape_like("100%_done"), "100!%!_done");
        assert_eq!(escape_like("wow!"), "wow!!");
    }
}
