//! `SeaORM` implementation of the `ProfileService` trait.

use async_trait::async_trait;

use crate::constants::limits::{MAX_BIO_CHARS, PROFILE_RECENT_EPISODES};
use crate::db::Store;
use crate::domain::UserId;
use crate::models::{ProfileStats, ProfileUpdate, PublicProfile, PublicProfileView};
use crate::services::profile_service::{ProfileError, ProfileService};

pub struct SeaOrmProfileService {
    store: Store,
}

impl SeaOrmProfileService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    fn validate_patch(patch: &mut ProfileUpdate) -> Result<(), ProfileError> {
        if let Some(bio) = patch.bio.as_mut() {
            *bio = bio.trim().to_string();
            if bio.chars().count() > MAX_BIO_CHARS {
                return Err(ProfileError::Validation(format!(
                    "Bio must be at most {MAX_BIO_CHARS} characters"
                )));
            }
        }

        if let Some(avatar) = patch.avatar_url.as_mut() {
            *avatar = avatar.trim().to_string();
            if !avatar.is_empty() {
                let parsed = url::Url::parse(avatar)
                    .map_err(|_| ProfileError::Validation("Avatar URL is not valid".to_string()))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ProfileError::Validation(
                        "Avatar URL must use http or https".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ProfileService for SeaOrmProfileService {
    async fn create_profile(&self, user_id: UserId) -> Result<PublicProfile, ProfileError> {
        if self.store.get_profile(user_id).await?.is_some() {
            return Err(ProfileError::Conflict(format!(
                "User {user_id} already has a profile"
            )));
        }
        Ok(self.store.insert_profile(user_id).await?)
    }

    async fn get_or_create(&self, user_id: UserId) -> Result<PublicProfile, ProfileError> {
        match self.store.get_profile(user_id).await? {
            Some(profile) => Ok(profile),
            None => Ok(self.store.insert_profile(user_id).await?),
        }
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        mut patch: ProfileUpdate,
    ) -> Result<PublicProfile, ProfileError> {
        Self::validate_patch(&mut patch)?;
        self.get_or_create(user_id).await?;
        Ok(self.store.update_profile(user_id, patch).await?)
    }

    async fn public_profile(&self, nickname: &str) -> Result<PublicProfileView, ProfileError> {
        let not_found = || ProfileError::NotFound(nickname.to_string());

        let user = self
            .store
            .get_user_by_nickname(nickname)
            .await?
            .ok_or_else(not_found)?;
        let profile = self
            .store
            .get_profile(user.id)
            .await?
            .filter(|p| p.is_visible)
            .ok_or_else(not_found)?;

        let lists = if profile.show_lists {
            Some(self.store.lists_for_user(user.id, false, None).await?)
        } else {
            None
        };
        let recent_episodes = if profile.show_watched_episodes {
            Some(
                self.store
                    .recent_episodes(user.id, PROFILE_RECENT_EPISODES)
                    .await?,
            )
        } else {
            None
        };

        let stats = ProfileStats {
            total_lists: self.store.count_lists(user.id, true).await?,
            total_watched: self.store.count_watched_episodes(user.id).await?,
        };

        Ok(PublicProfileView {
            nickname: user.nickname,
            bio: profile.bio,
            avatar_url: profile.avatar_url,
            member_since: user.created_at,
            lists,
            recent_episodes,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_must_be_http_url() {
        let mut ok = ProfileUpdate {
            avatar_url: Some(" https://example.com/a.png ".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(SeaOrmProfileService::validate_patch(&mut ok).is_ok());
        assert_eq!(ok.avatar_url.as_deref(), Some("https://example.com/a.png"));

        let mut cleared = ProfileUpdate {
            avatar_url: Some(String::new()),
            ..ProfileUpdate::default()
        };
        assert!(SeaOrmProfileService::validate_patch(&mut cleared).is_ok());

        let mut bad = ProfileUpdate {
            avatar_url: Some("ftp://example.com/a.png".to_string()),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            SeaOrmProfileService::validate_patch(&mut bad),
            Err(ProfileError::Validation(_))
        ));
    }

    #[test]
    fn bio_is_bounded() {
        let mut long = ProfileUpdate {
            bio: Some("b".repeat(501)),
            ..ProfileUpdate::default()
        };
        assert!(matches!(
            SeaOrmProfileService::validate_patch(&mut long),
            Err(ProfileError::Validation(_))
        ));
    }
}
