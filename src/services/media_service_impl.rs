//! `SeaORM` implementation of the `MediaService` trait.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tracing::{debug, info, warn};

use crate::clients::TmdbClient;
use crate::constants::limits::{MAX_BROWSE_RESULTS, MAX_LOCAL_SEARCH_RESULTS};
use crate::db::Store;
use crate::domain::{BrowseSort, MediaId, MediaKind, UserId};
use crate::models::{Media, MediaPayload, MediaSummary, ProviderDetails};
use crate::services::media_factory::MediaFactory;
use crate::services::media_service::{MediaError, MediaService, RefreshSummary, SearchOutcome};

pub struct SeaOrmMediaService {
    store: Store,
    tmdb: Arc<TmdbClient>,
    factory: MediaFactory,
    refresh_concurrency: usize,
    enrich_concurrency: usize,
}

enum RefreshOutcome {
    Refreshed,
    Skipped,
}

impl SeaOrmMediaService {
    #[must_use]
    pub fn new(
        store: Store,
        tmdb: Arc<TmdbClient>,
        refresh_concurrency: usize,
        enrich_concurrency: usize,
    ) -> Self {
        Self {
            factory: MediaFactory::new(store.clone()),
            store,
            tmdb,
            refresh_concurrency: refresh_concurrency.max(1),
            enrich_concurrency,
        }
    }

    /// Adds directors and top cast to each hit. A hit whose credits can't be
    /// loaded is returned as is. Order is preserved.
    async fn enrich(&self, hits: Vec<MediaSummary>) -> Vec<MediaSummary> {
        if self.enrich_concurrency == 0 {
            return hits;
        }

        stream::iter(hits)
            .map(|mut hit| async move {
                match self.tmdb.credits(hit.tmdb_id, hit.media_type).await {
                    Ok(credits) => {
                        hit.directors = credits.directors;
                        hit.cast = credits.cast.into_iter().map(|c| c.name).collect();
                    }
                    Err(e) => {
                        debug!(tmdb_id = hit.tmdb_id, error = %e, "Search hit left without credits");
                    }
                }
                hit
            })
            .buffered(self.enrich_concurrency)
            .collect()
            .await
    }

    async fn refresh_one(&self, id: MediaId) -> Result<(Media, RefreshOutcome), MediaError> {
        let media = self
            .store
            .get_media(id)
            .await?
            .ok_or(MediaError::NotFound(id))?;

        let Some(tmdb_id) = media.info.tmdb_id else {
            return Ok((media, RefreshOutcome::Skipped));
        };

        let kind = media.kind();
        let payload = self.tmdb.fetch(tmdb_id, kind).await?;
        let fresh = MediaFactory::build(kind, payload)?;
        let updated = self.store.update_media_metadata(id, fresh).await?;

        Ok((updated, RefreshOutcome::Refreshed))
    }
}

#[async_trait]
impl MediaService for SeaOrmMediaService {
    async fn search(
        &self,
        query: &str,
        kind: Option<MediaKind>,
    ) -> Result<SearchOutcome, MediaError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MediaError::Validation(
                "Search query cannot be empty".to_string(),
            ));
        }

        let (results, degraded) = match self.tmdb.search(query, kind).await {
            Ok(results) => (self.enrich(results).await, false),
            Err(e) => {
                warn!(query, error = %e, "Metadata provider unavailable, search degraded");
                (Vec::new(), true)
            }
        };

        let local_matches = self
            .store
            .search_media_titles(query, kind, MAX_LOCAL_SEARCH_RESULTS)
            .await?;

        Ok(SearchOutcome {
            query: query.to_string(),
            results,
            local_matches,
            degraded,
        })
    }

    async fn import(&self, tmdb_id: i64, kind: MediaKind) -> Result<Media, MediaError> {
        if tmdb_id <= 0 {
            return Err(MediaError::Validation(format!("Invalid TMDb id: {tmdb_id}")));
        }

        if let Some(existing) = self.store.get_media_by_tmdb(tmdb_id, kind).await? {
            return Ok(existing);
        }

        let payload = self.tmdb.fetch(tmdb_id, kind).await?;
        let media = self.factory.create(kind, payload).await?;

        info!(media_id = %media.id, tmdb_id, kind = %kind, title = %media.title(), "Imported media");
        Ok(media)
    }

    async fn create_manual(
        &self,
        kind: MediaKind,
        mut payload: MediaPayload,
    ) -> Result<Media, MediaError> {
        payload.tmdb_id = None;
        if payload.original_language.trim().is_empty() {
            payload.original_language = "en".to_string();
        }

        let media = self.factory.create(kind, payload).await?;
        info!(media_id = %media.id, kind = %kind, title = %media.title(), "Created manual media");
        Ok(media)
    }

    async fn get(&self, id: MediaId) -> Result<Media, MediaError> {
        self.store
            .get_media(id)
            .await?
            .ok_or(MediaError::NotFound(id))
    }

    async fn provider_details(
        &self,
        kind: MediaKind,
        tmdb_id: i64,
    ) -> Result<ProviderDetails, MediaError> {
        let (payload, seasons) = self.tmdb.fetch_with_seasons(tmdb_id, kind).await?;

        let (credits, imdb_id) = tokio::join!(
            self.tmdb.credits(tmdb_id, kind),
            self.tmdb.imdb_id(tmdb_id, kind)
        );
        let credits = credits.unwrap_or_else(|e| {
            warn!(tmdb_id, error = %e, "Failed to load credits");
            crate::clients::Credits::default()
        });
        let imdb_id = imdb_id.unwrap_or_else(|e| {
            warn!(tmdb_id, error = %e, "Failed to load external ids");
            None
        });

        let local_id = self
            .store
            .get_media_by_tmdb(tmdb_id, kind)
            .await?
            .map(|m| m.id);

        Ok(ProviderDetails {
            media_type: kind,
            payload,
            directors: credits.directors,
            cast: credits.cast,
            imdb_id,
            seasons,
            local_id,
        })
    }

    async fn browse(
        &self,
        user_id: UserId,
        kind: Option<MediaKind>,
        sort: BrowseSort,
    ) -> Result<Vec<Media>, MediaError> {
        Ok(self
            .store
            .browse_media(user_id, kind, sort, MAX_BROWSE_RESULTS)
            .await?)
    }

    async fn refresh_metadata(&self, id: MediaId) -> Result<Media, MediaError> {
        let (media, outcome) = self.refresh_one(id).await?;
        let label = match outcome {
            RefreshOutcome::Refreshed => "refreshed",
            RefreshOutcome::Skipped => "skipped",
        };
        metrics::counter!("media_refresh_total", "outcome" => label).increment(1);
        Ok(media)
    }

    async fn refresh_all(&self) -> Result<RefreshSummary, MediaError> {
        let start = Instant::now();
        let ids = self.store.refreshable_media_ids().await?;
        info!(event = "job_started", job = "metadata_refresh", candidates = ids.len());

        let results: Vec<(MediaId, Result<RefreshOutcome, MediaError>)> = stream::iter(ids)
            .map(|id| async move { (id, self.refresh_one(id).await.map(|(_, o)| o)) })
            .buffer_unordered(self.refresh_concurrency)
            .collect()
            .await;

        let mut summary = RefreshSummary::default();
        for (id, result) in results {
            match result {
                Ok(RefreshOutcome::Refreshed) => summary.refreshed += 1,
                Ok(RefreshOutcome::Skipped) | Err(MediaError::NotFound(_)) => summary.skipped += 1,
                Err(e) => {
                    warn!(media_id = %id, error = %e, "Metadata refresh failed");
                    summary.failed += 1;
                }
            }
        }

        metrics::counter!("media_refresh_total", "outcome" => "refreshed")
            .increment(summary.refreshed as u64);
        metrics::counter!("media_refresh_total", "outcome" => "skipped")
            .increment(summary.skipped as u64);
        metrics::counter!("media_refresh_total", "outcome" => "failed")
            .increment(summary.failed as u64);

        info!(
            event = "job_finished",
            job = "metadata_refresh",
            refreshed = summary.refreshed,
            skipped = summary.skipped,
            failed = summary.failed,
            duration_ms = start.elapsed().as_millis() as u64,
        );

        Ok(summary)
    }
}
