use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Serialize;
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::UserId;
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub nickname: String,
    #[serde(skip)]
    pub api_key: String,
    pub is_2fa_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            username: model.username,
            email: model.email,
            nickname: model.nickname,
            api_key: model.api_key,
            is_2fa_enabled: model.is_2fa_enabled,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub nickname: &'a str,
    pub password: &'a str,
}

/// Which unique account field an operation collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    Nickname,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user: NewUser<'_>, security: &SecurityConfig) -> Result<User> {
        let password = user.password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();
        let model = users::ActiveModel {
            username: Set(user.username.to_string()),
            email: Set(user.email.to_string()),
            nickname: Set(user.nickname.to_string()),
            password_hash: Set(password_hash),
            api_key: Set(generate_api_key()),
            is_2fa_enabled: Set(false),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_nickname(&self, nickname: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Nickname.eq(nickname))
            .one(&self.conn)
            .await
            .context("Failed to query user by nickname")?;

        Ok(user.map(User::from))
    }

    /// First field of `candidate` already used by another account.
    pub async fn find_conflict(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        nickname: Option<&str>,
        exclude: Option<UserId>,
    ) -> Result<Option<UniqueField>> {
        let checks = [
            (UniqueField::Username, users::Column::Username, username),
            (UniqueField::Email, users::Column::Email, email),
            (UniqueField::Nickname, users::Column::Nickname, nickname),
        ];

        for (field, column, value) in checks {
            let Some(value) = value else { continue };

            let mut query = users::Entity::find().filter(column.eq(value));
            if let Some(id) = exclude {
                query = query.filter(users::Column::Id.ne(id.value()));
            }

            let taken = query
                .count(&self.conn)
                .await
                .context("Failed to check account uniqueness")?
                > 0;

            if taken {
                return Ok(Some(field));
            }
        }

        Ok(None)
    }

    /// Verify password for a username or email.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, login: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(login))
                    .add(users::Column::Email.eq(login.to_lowercase())),
            )
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Verify API key and return the associated user
    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")?;

        Ok(user.map(User::from))
    }

    pub async fn update_contact(
        &self,
        id: UserId,
        email: Option<String>,
        nickname: Option<String>,
    ) -> Result<User> {
        let user = self.find_model(id).await?;

        let mut active: users::ActiveModel = user.into();
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(nickname) = nickname {
            active.nickname = Set(nickname);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        Ok(User::from(active.update(&self.conn).await?))
    }

    pub async fn set_2fa(&self, id: UserId, enabled: bool) -> Result<User> {
        let user = self.find_model(id).await?;

        let mut active: users::ActiveModel = user.into();
        active.is_2fa_enabled = Set(enabled);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        Ok(User::from(active.update(&self.conn).await?))
    }

    async fn find_model(&self, id: UserId) -> Result<users::Model> {
        users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))
    }
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the argon2 crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
