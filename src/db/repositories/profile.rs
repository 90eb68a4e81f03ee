use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::UserId;
use crate::entities::public_profiles;
use crate::models::{ProfileUpdate, PublicProfile};

impl From<public_profiles::Model> for PublicProfile {
    fn from(model: public_profiles::Model) -> Self {
        Self {
            user_id: UserId::new(model.user_id),
            bio: model.bio,
            avatar_url: model.avatar_url,
            is_visible: model.is_visible,
            show_watched_episodes: model.show_watched_episodes,
            show_lists: model.show_lists,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct ProfileRepository {
    conn: DatabaseConnection,
}

impl ProfileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, user_id: UserId) -> Result<Option<PublicProfile>> {
        Ok(self.find_model(user_id).await?.map(PublicProfile::from))
    }

    /// Inserts a hidden profile with both sections enabled.
    pub async fn insert(&self, user_id: UserId) -> Result<PublicProfile> {
        let now = chrono::Utc::now().to_rfc3339();
        let model = public_profiles::ActiveModel {
            user_id: Set(user_id.value()),
            bio: Set(String::new()),
            avatar_url: Set(String::new()),
            is_visible: Set(false),
            show_watched_episodes: Set(true),
            show_lists: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert profile")?;

        Ok(PublicProfile::from(model))
    }

    pub async fn update(&self, user_id: UserId, patch: ProfileUpdate) -> Result<PublicProfile> {
        let model = self
            .find_model(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Profile not found for user {user_id}"))?;

        let mut active: public_profiles::ActiveModel = model.into();
        if let Some(bio) = patch.bio {
            active.bio = Set(bio);
        }
        if let Some(avatar_url) = patch.avatar_url {
            active.avatar_url = Set(avatar_url);
        }
        if let Some(visible) = patch.is_visible {
            active.is_visible = Set(visible);
        }
        if let Some(show) = patch.show_watched_episodes {
            active.show_watched_episodes = Set(show);
        }
        if let Some(show) = patch.show_lists {
            active.show_lists = Set(show);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        Ok(PublicProfile::from(active.update(&self.conn).await?))
    }

    async fn find_model(&self, user_id: UserId) -> Result<Option<public_profiles::Model>> {
        public_profiles::Entity::find()
            .filter(public_profiles::Column::UserId.eq(user_id.value()))
            .one(&self.conn)
            .await
            .context("Failed to query profile")
    }
}
