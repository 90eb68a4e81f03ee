use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};

use crate::constants::POSITION_BASE;
use crate::domain::{ListId, ListItemId, MediaId, UserId, WatchStatus};
use crate::entities::{list_items, lists, media};
use crate::models::{ListItem, ListUpdate, MediaList};

fn list_from_model(model: lists::Model, item_count: u64) -> MediaList {
    MediaList {
        id: ListId::new(model.id),
        owner_id: UserId::new(model.user_id),
        name: model.name,
        is_public: model.is_public,
        item_count,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn item_from_model(model: list_items::Model) -> Result<ListItem> {
    let status = model
        .status
        .parse()
        .with_context(|| format!("List item {} has a corrupt status", model.id))?;

    Ok(ListItem {
        id: ListItemId::new(model.id),
        list_id: ListId::new(model.list_id),
        media_id: MediaId::new(model.media_id),
        position: model.position,
        status,
        added_at: model.added_at,
        updated_at: model.updated_at,
    })
}

/// Returns `order` without `item`, then with `item` inserted at `index`
/// (clamped to the end; `None` appends).
#[must_use]
pub fn insert_at(order: &[i32], item: i32, index: Option<usize>) -> Vec<i32> {
    let mut result: Vec<i32> = order.iter().copied().filter(|id| *id != item).collect();
    let index = index.map_or(result.len(), |i| i.min(result.len()));
    result.insert(index, item);
    result
}

/// Requested ids first in the requested order, then the remaining ids in
/// their current order. Errors with the ids that aren't in `current`.
pub fn apply_order(current: &[i32], requested: &[i32]) -> Result<Vec<i32>, Vec<i32>> {
    let unknown: Vec<i32> = requested
        .iter()
        .copied()
        .filter(|id| !current.contains(id))
        .collect();
    if !unknown.is_empty() {
        return Err(unknown);
    }

    let mut result: Vec<i32> = Vec::with_capacity(current.len());
    for id in requested {
        if !result.contains(id) {
            result.push(*id);
        }
    }
    result.extend(current.iter().copied().filter(|id| !requested.contains(id)));
    Ok(result)
}

/// Positions for `order` starting at [`POSITION_BASE`], keeping only the rows
/// whose stored position differs.
#[must_use]
pub fn dense_assignments(order: &[i32], stored: &HashMap<i32, i32>) -> Vec<(i32, i32)> {
    order
        .iter()
        .zip(POSITION_BASE..)
        .filter(|(id, position)| stored.get(id) != Some(position))
        .map(|(id, position)| (*id, position))
        .collect()
}

/// Result of moving an item between lists.
#[derive(Debug)]
pub enum MoveOutcome {
    Moved(ListItem),
    /// The target list already holds this media.
    DuplicateInTarget,
    ItemMissing,
}

pub struct ListRepository {
    conn: DatabaseConnection,
}

impl ListRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, owner: UserId, name: &str, is_public: bool) -> Result<MediaList> {
        let now = chrono::Utc::now().to_rfc3339();
        let model = lists::ActiveModel {
            user_id: Set(owner.value()),
            name: Set(name.to_string()),
            is_public: Set(is_public),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert list")?;

        Ok(list_from_model(model, 0))
    }

    pub async fn get(&self, id: ListId) -> Result<Option<MediaList>> {
        let Some(model) = lists::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query list")?
        else {
            return Ok(None);
        };

        let count = list_items::Entity::find()
            .filter(list_items::Column::ListId.eq(id.value()))
            .count(&self.conn)
            .await?;

        Ok(Some(list_from_model(model, count)))
    }

    pub async fn update(&self, id: ListId, update: ListUpdate) -> Result<MediaList> {
        let model = lists::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("List not found: {id}"))?;

        let mut active: lists::ActiveModel = model.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(is_public) = update.is_public {
            active.is_public = Set(is_public);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("List vanished during update: {id}"))
    }

    pub async fn delete(&self, id: ListId) -> Result<bool> {
        let result = lists::Entity::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete list")?;
        Ok(result.rows_affected > 0)
    }

    /// Most recently created first, each with its item count.
    pub async fn for_user(
        &self,
        owner: UserId,
        include_private: bool,
        limit: Option<u64>,
    ) -> Result<Vec<MediaList>> {
        let mut select = lists::Entity::find().filter(lists::Column::UserId.eq(owner.value()));
        if !include_private {
            select = select.filter(lists::Column::IsPublic.eq(true));
        }

        let models = select
            .order_by_desc(lists::Column::CreatedAt)
            .order_by_desc(lists::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list user lists")?;

        let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let counts = self.item_counts(ids).await?;

        Ok(models
            .into_iter()
            .map(|model| {
                let count = counts.get(&model.id).copied().unwrap_or(0);
                list_from_model(model, count)
            })
            .collect())
    }

    pub async fn count_for_user(&self, owner: UserId, public_only: bool) -> Result<u64> {
        let mut select = lists::Entity::find().filter(lists::Column::UserId.eq(owner.value()));
        if public_only {
            select = select.filter(lists::Column::IsPublic.eq(true));
        }
        select
            .count(&self.conn)
            .await
            .context("Failed to count lists")
    }

    /// Items across all of the user's lists, optionally only in `status`.
    pub async fn count_items_for_user(
        &self,
        owner: UserId,
        status: Option<WatchStatus>,
    ) -> Result<u64> {
        let mut select = list_items::Entity::find()
            .inner_join(lists::Entity)
            .filter(lists::Column::UserId.eq(owner.value()));
        if let Some(status) = status {
            select = select.filter(list_items::Column::Status.eq(status.as_str()));
        }
        select
            .count(&self.conn)
            .await
            .context("Failed to count list items")
    }

    async fn item_counts(&self, list_ids: Vec<i32>) -> Result<HashMap<i32, u64>> {
        if list_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = list_items::Entity::find()
            .select_only()
            .column(list_items::Column::ListId)
            .column_as(list_items::Column::Id.count(), "item_count")
            .filter(list_items::Column::ListId.is_in(list_ids))
            .group_by(list_items::Column::ListId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count list items")?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    /// Items in display order.
    pub async fn items(&self, list_id: ListId) -> Result<Vec<ListItem>> {
        Self::ordered_models(&self.conn, list_id.value())
            .await?
            .into_iter()
            .map(item_from_model)
            .collect()
    }

    pub async fn get_item(&self, id: ListItemId) -> Result<Option<ListItem>> {
        list_items::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query list item")?
            .map(item_from_model)
            .transpose()
    }

    pub async fn find_item(&self, list_id: ListId, media_id: MediaId) -> Result<Option<ListItem>> {
        list_items::Entity::find()
            .filter(list_items::Column::ListId.eq(list_id.value()))
            .filter(list_items::Column::MediaId.eq(media_id.value()))
            .one(&self.conn)
            .await
            .context("Failed to query list item")?
            .map(item_from_model)
            .transpose()
    }

    /// Appends `media_id` at the next dense position. Returns `None` when the
    /// list already contains it.
    pub async fn add_item(&self, list_id: ListId, media_id: MediaId) -> Result<Option<ListItem>> {
        let txn = self.conn.begin().await?;
        Self::touch_lists(&txn, &[list_id.value()]).await?;

        let exists = list_items::Entity::find()
            .filter(list_items::Column::ListId.eq(list_id.value()))
            .filter(list_items::Column::MediaId.eq(media_id.value()))
            .count(&txn)
            .await?
            > 0;
        if exists {
            txn.rollback().await?;
            return Ok(None);
        }

        let current = Self::ordered_models(&txn, list_id.value()).await?;
        Self::write_positions(&txn, &current, &current.iter().map(|m| m.id).collect::<Vec<_>>())
            .await?;

        let position = POSITION_BASE + i32::try_from(current.len()).context("List too long")?;
        let now = chrono::Utc::now().to_rfc3339();
        let model = list_items::ActiveModel {
            list_id: Set(list_id.value()),
            media_id: Set(media_id.value()),
            position: Set(position),
            status: Set(WatchStatus::default().as_str().to_string()),
            added_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert list item")?;

        txn.commit().await?;
        item_from_model(model).map(Some)
    }

    /// Deletes the item and closes the gap it leaves.
    pub async fn remove_media(&self, list_id: ListId, media_id: MediaId) -> Result<bool> {
        let txn = self.conn.begin().await?;
        Self::touch_lists(&txn, &[list_id.value()]).await?;

        let result = list_items::Entity::delete_many()
            .filter(list_items::Column::ListId.eq(list_id.value()))
            .filter(list_items::Column::MediaId.eq(media_id.value()))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        let remaining = Self::ordered_models(&txn, list_id.value()).await?;
        let order: Vec<i32> = remaining.iter().map(|m| m.id).collect();
        Self::write_positions(&txn, &remaining, &order).await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Moves an item from `source` to `target` (which may be the same list)
    /// at `new_position` and leaves both lists dense.
    ///
    /// Both lists are locked before the item is read. If another writer moved
    /// the item out of `source` first, the move reports `ItemMissing`.
    pub async fn move_item(
        &self,
        item_id: ListItemId,
        source: ListId,
        target: ListId,
        new_position: Option<usize>,
    ) -> Result<MoveOutcome> {
        let txn = self.conn.begin().await?;
        Self::touch_lists(&txn, &[source.value(), target.value()]).await?;

        let item = list_items::Entity::find_by_id(item_id.value())
            .one(&txn)
            .await?
            .filter(|item| item.list_id == source.value());
        let Some(item) = item else {
            txn.rollback().await?;
            return Ok(MoveOutcome::ItemMissing);
        };
        let source = item.list_id;

        if source != target.value() {
            let duplicate = list_items::Entity::find()
                .filter(list_items::Column::ListId.eq(target.value()))
                .filter(list_items::Column::MediaId.eq(item.media_id))
                .count(&txn)
                .await?
                > 0;
            if duplicate {
                txn.rollback().await?;
                return Ok(MoveOutcome::DuplicateInTarget);
            }

            list_items::Entity::update_many()
                .col_expr(list_items::Column::ListId, Expr::value(target.value()))
                .filter(list_items::Column::Id.eq(item.id))
                .exec(&txn)
                .await?;

            let source_rows = Self::ordered_models(&txn, source).await?;
            let source_order: Vec<i32> = source_rows.iter().map(|m| m.id).collect();
            Self::write_positions(&txn, &source_rows, &source_order).await?;
        }

        let target_rows = Self::ordered_models(&txn, target.value()).await?;
        let current: Vec<i32> = target_rows
            .iter()
            .map(|m| m.id)
            .filter(|id| *id != item.id)
            .collect();
        let order = insert_at(&current, item.id, new_position);
        Self::write_positions(&txn, &target_rows, &order).await?;

        let moved = list_items::Entity::find_by_id(item.id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("List item {item_id} vanished during move"))?;

        txn.commit().await?;
        Ok(MoveOutcome::Moved(item_from_model(moved)?))
    }

    /// Applies a user-supplied order. Returns the offending ids when some
    /// don't belong to the list.
    pub async fn reorder(
        &self,
        list_id: ListId,
        requested: &[ListItemId],
    ) -> Result<Result<Vec<ListItem>, Vec<i32>>> {
        let txn = self.conn.begin().await?;
        Self::touch_lists(&txn, &[list_id.value()]).await?;

        let rows = Self::ordered_models(&txn, list_id.value()).await?;
        let current: Vec<i32> = rows.iter().map(|m| m.id).collect();
        let requested: Vec<i32> = requested.iter().map(ListItemId::value).collect();

        let order = match apply_order(&current, &requested) {
            Ok(order) => order,
            Err(unknown) => {
                txn.rollback().await?;
                return Ok(Err(unknown));
            }
        };

        Self::write_positions(&txn, &rows, &order).await?;
        let items = Self::ordered_models(&txn, list_id.value())
            .await?
            .into_iter()
            .map(item_from_model)
            .collect::<Result<Vec<_>>>()?;

        txn.commit().await?;
        Ok(Ok(items))
    }

    pub async fn set_status(&self, item_id: ListItemId, status: WatchStatus) -> Result<ListItem> {
        let model = list_items::Entity::find_by_id(item_id.value())
            .one(&self.conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("List item not found: {item_id}"))?;

        let mut active: list_items::ActiveModel = model.into();
        active.status = Set(status.as_str().to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        item_from_model(active.update(&self.conn).await?)
    }

    /// Movies marked WATCHED in any of the user's lists, newest status change
    /// first: `(media_id, title, list_id, updated_at)`.
    pub async fn watched_movies_for_user(
        &self,
        owner: UserId,
        limit: u64,
    ) -> Result<Vec<(i32, String, i32, String)>> {
        list_items::Entity::find()
            .select_only()
            .column(list_items::Column::MediaId)
            .column(media::Column::Title)
            .column(list_items::Column::ListId)
            .column(list_items::Column::UpdatedAt)
            .inner_join(lists::Entity)
            .inner_join(media::Entity)
            .filter(lists::Column::UserId.eq(owner.value()))
            .filter(list_items::Column::Status.eq(WatchStatus::Watched.as_str()))
            .filter(media::Column::MediaType.eq(crate::domain::MediaKind::Movie.as_str()))
            .order_by_desc(list_items::Column::UpdatedAt)
            .order_by_desc(list_items::Column::Id)
            .limit(limit)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to load watched movies")
    }

    async fn ordered_models<C: ConnectionTrait>(
        conn: &C,
        list_id: i32,
    ) -> Result<Vec<list_items::Model>> {
        list_items::Entity::find()
            .filter(list_items::Column::ListId.eq(list_id))
            .order_by_asc(list_items::Column::Position)
            .order_by_asc(list_items::Column::Id)
            .all(conn)
            .await
            .context("Failed to load list items")
    }

    /// First write in every ordering transaction, so concurrent writers to
    /// the same list wait here instead of reading stale positions.
    async fn touch_lists(txn: &DatabaseTransaction, ids: &[i32]) -> Result<()> {
        lists::Entity::update_many()
            .col_expr(
                lists::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(lists::Column::Id.is_in(ids.to_vec()))
            .exec(txn)
            .await
            .context("Failed to lock lists")?;
        Ok(())
    }

    async fn write_positions(
        txn: &DatabaseTransaction,
        stored: &[list_items::Model],
        order: &[i32],
    ) -> Result<()> {
        let stored: HashMap<i32, i32> = stored.iter().map(|m| (m.id, m.position)).collect();

        for (id, position) in dense_assignments(order, &stored) {
            list_items::Entity::update_many()
                .col_expr(list_items::Column::Position, Expr::value(position))
                .filter(list_items::Column::Id.eq(id))
                .exec(txn)
                .await
                .context("Failed to renumber list items")?;
        }

        Ok(())
    }
}
