//! `SeaORM` implementation of the `ListService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::constants::limits::{DASHBOARD_RECENT_LISTS, MAX_LIST_NAME_CHARS};
use crate::db::{MoveOutcome, Store};
use crate::domain::{ListId, ListItemId, MediaId, UserId, WatchStatus};
use crate::models::{DashboardStats, ListItem, ListItemView, ListUpdate, MediaList};
use crate::services::list_service::{ListError, ListService};

pub struct SeaOrmListService {
    store: Store,
}

impl SeaOrmListService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn validate_name(name: &str) -> Result<String, ListError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ListError::Validation("List name is required".to_string()));
        }
        if name.chars().count() > MAX_LIST_NAME_CHARS {
            return Err(ListError::Validation(format!(
                "List name must be at most {MAX_LIST_NAME_CHARS} characters"
            )));
        }
        Ok(name.to_string())
    }

    async fn load_list(&self, list_id: ListId) -> Result<MediaList, ListError> {
        self.store
            .get_list(list_id)
            .await?
            .ok_or_else(|| ListError::NotFound(format!("List {list_id}")))
    }

    async fn owned_list(&self, user_id: UserId, list_id: ListId) -> Result<MediaList, ListError> {
        let list = self.load_list(list_id).await?;
        if list.owner_id != user_id {
            return Err(ListError::NotOwner);
        }
        Ok(list)
    }

    async fn owned_item(
        &self,
        user_id: UserId,
        item_id: ListItemId,
    ) -> Result<ListItem, ListError> {
        let item = self
            .store
            .get_list_item(item_id)
            .await?
            .ok_or_else(|| ListError::NotFound(format!("List item {item_id}")))?;
        self.owned_list(user_id, item.list_id).await?;
        Ok(item)
    }
}

#[async_trait]
impl ListService for SeaOrmListService {
    async fn create_list(
        &self,
        owner: UserId,
        name: &str,
        is_public: bool,
    ) -> Result<MediaList, ListError> {
        let name = Self::validate_name(name)?;
        let list = self.store.create_list(owner, &name, is_public).await?;
        info!(list_id = %list.id, owner = %owner, "Created list");
        Ok(list)
    }

    async fn update_list(
        &self,
        user_id: UserId,
        list_id: ListId,
        mut update: ListUpdate,
    ) -> Result<MediaList, ListError> {
        self.owned_list(user_id, list_id).await?;
        if let Some(name) = update.name.as_deref() {
            update.name = Some(Self::validate_name(name)?);
        }
        Ok(self.store.update_list(list_id, update).await?)
    }

    async fn delete_list(&self, user_id: UserId, list_id: ListId) -> Result<(), ListError> {
        self.owned_list(user_id, list_id).await?;
        self.store.delete_list(list_id).await?;
        info!(list_id = %list_id, "Deleted list");
        Ok(())
    }

    async fn get_list(
        &self,
        viewer: Option<UserId>,
        list_id: ListId,
    ) -> Result<MediaList, ListError> {
        let list = self.load_list(list_id).await?;
        if list.is_public || viewer == Some(list.owner_id) {
            Ok(list)
        } else {
            Err(ListError::NotFound(format!("List {list_id}")))
        }
    }

    async fn user_lists(
        &self,
        owner: UserId,
        include_private: bool,
    ) -> Result<Vec<MediaList>, ListError> {
        Ok(self.store.lists_for_user(owner, include_private, None).await?)
    }

    async fn list_items(
        &self,
        viewer: Option<UserId>,
        list_id: ListId,
    ) -> Result<Vec<ListItemView>, ListError> {
        self.get_list(viewer, list_id).await?;

        let items = self.store.list_items(list_id).await?;
        let mut cards = self
            .store
            .media_cards(items.iter().map(|i| i.media_id.value()).collect())
            .await?;

        items
            .into_iter()
            .map(|item| {
                let media = cards.remove(&item.media_id.value()).ok_or_else(|| {
                    ListError::Internal(format!("Media {} missing for list item", item.media_id))
                })?;
                Ok(ListItemView { item, media })
            })
            .collect()
    }

    async fn add_media(
        &self,
        user_id: UserId,
        list_id: ListId,
        media_id: MediaId,
    ) -> Result<ListItem, ListError> {
        self.owned_list(user_id, list_id).await?;
        if self.store.get_media(media_id).await?.is_none() {
            return Err(ListError::NotFound(format!("Media {media_id}")));
        }

        self.store
            .add_list_item(list_id, media_id)
            .await?
            .ok_or_else(|| ListError::Conflict(format!("Media {media_id} is already in this list")))
    }

    async fn remove_media(
        &self,
        user_id: UserId,
        list_id: ListId,
        media_id: MediaId,
    ) -> Result<bool, ListError> {
        self.owned_list(user_id, list_id).await?;
        Ok(self.store.remove_list_media(list_id, media_id).await?)
    }

    async fn move_item(
        &self,
        user_id: UserId,
        item_id: ListItemId,
        target: ListId,
        new_position: Option<usize>,
    ) -> Result<ListItem, ListError> {
        let item = self.owned_item(user_id, item_id).await?;
        self.owned_list(user_id, target).await?;

        match self
            .store
            .move_list_item(item_id, item.list_id, target, new_position)
            .await?
        {
            MoveOutcome::Moved(moved) => {
                info!(item_id = %item_id, from = %item.list_id, to = %target, position = moved.position, "Moved list item");
                Ok(moved)
            }
            MoveOutcome::DuplicateInTarget => Err(ListError::Conflict(format!(
                "Target list already contains media {}",
                item.media_id
            ))),
            MoveOutcome::ItemMissing => Err(ListError::NotFound(format!("List item {item_id}"))),
        }
    }

    async fn reorder_items(
        &self,
        user_id: UserId,
        list_id: ListId,
        item_ids: &[ListItemId],
    ) -> Result<Vec<ListItem>, ListError> {
        self.owned_list(user_id, list_id).await?;

        self.store
            .reorder_list(list_id, item_ids)
            .await?
            .map_err(|unknown| {
                ListError::Validation(format!("Items do not belong to this list: {unknown:?}"))
            })
    }

    async fn update_item_status(
        &self,
        user_id: UserId,
        item_id: ListItemId,
        status: &str,
    ) -> Result<ListItem, ListError> {
        let status: WatchStatus = status
            .parse()
            .map_err(|e: crate::domain::ParseEnumError| ListError::Validation(e.to_string()))?;
        self.owned_item(user_id, item_id).await?;

        Ok(self.store.set_list_item_status(item_id, status).await?)
    }

    async fn dashboard(&self, user_id: UserId) -> Result<DashboardStats, ListError> {
        let (total_lists, total_items, total_watched, recent_lists) = tokio::try_join!(
            self.store.count_lists(user_id, false),
            self.store.count_list_items(user_id, None),
            self.store.count_list_items(user_id, Some(WatchStatus::Watched)),
            self.store
                .lists_for_user(user_id, true, Some(DASHBOARD_RECENT_LISTS)),
        )?;

        Ok(DashboardStats {
            total_lists,
            total_items,
            total_watched,
            recent_lists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_names_are_trimmed_and_bounded() {
        assert_eq!(
            SeaOrmListService::validate_name("  Watchlist ").unwrap(),
            "Watchlist"
        );
        assert!(matches!(
            SeaOrmListService::validate_name("   "),
            Err(ListError::Validation(_))
        ));
        assert!(SeaOrmListService::validate_name(&"x".repeat(100)).is_ok());
        assert!(matches!(
            SeaOrmListService::validate_name(&"x".repeat(101)),
            Err(ListError::Validation(_))
        ));
    }
}
