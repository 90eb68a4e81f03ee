//! `SeaORM` implementation of the `UserService` trait.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use crate::config::SecurityConfig;
use crate::constants::limits::MAX_NICKNAME_CHARS;
use crate::db::{NewUser, Store, UniqueField, User};
use crate::domain::UserId;
use crate::services::user_service::{Registration, UserError, UserService};

const MIN_PASSWORD_CHARS: usize = 8;
const MAX_USERNAME_CHARS: usize = 150;
const MIN_USERNAME_CHARS: usize = 3;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("Invalid regex")
    })
}

fn validate_username(raw: &str) -> Result<String, UserError> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&len) {
        return Err(UserError::Validation(format!(
            "Username must be {MIN_USERNAME_CHARS} to {MAX_USERNAME_CHARS} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(UserError::Validation(
            "Username may only contain letters, digits and @ . + - _".to_string(),
        ));
    }
    Ok(username.to_string())
}

fn validate_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(UserError::Validation(format!("Invalid email address: {raw}")));
    }
    Ok(email)
}

fn validate_nickname(raw: &str) -> Result<String, UserError> {
    let nickname = raw.trim();
    if nickname.is_empty() || nickname.chars().count() > MAX_NICKNAME_CHARS {
        return Err(UserError::Validation(format!(
            "Nickname must be 1 to {MAX_NICKNAME_CHARS} characters"
        )));
    }
    if nickname.contains('/') {
        return Err(UserError::Validation(
            "Nickname cannot contain '/'".to_string(),
        ));
    }
    Ok(nickname.to_string())
}

const fn field_name(field: UniqueField) -> &'static str {
    match field {
        UniqueField::Username => "Username",
        UniqueField::Email => "Email",
        UniqueField::Nickname => "Nickname",
    }
}

pub struct SeaOrmUserService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn set_2fa(&self, user_id: UserId, enabled: bool) -> Result<User, UserError> {
        self.get(user_id).await?;
        let user = self.store.set_user_2fa(user_id, enabled).await?;
        info!(user_id = %user_id, enabled, "Two-factor flag changed");
        Ok(user)
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(&self, registration: Registration) -> Result<User, UserError> {
        let username = validate_username(&registration.username)?;
        let email = validate_email(&registration.email)?;
        let nickname = validate_nickname(&registration.nickname)?;
        if registration.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(UserError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }

        if let Some(field) = self
            .store
            .find_user_conflict(Some(&username), Some(&email), Some(&nickname), None)
            .await?
        {
            return Err(UserError::Conflict(field_name(field).to_string()));
        }

        let user = self
            .store
            .create_user(
                NewUser {
                    username: &username,
                    email: &email,
                    nickname: &nickname,
                    password: &registration.password,
                },
                &self.security,
            )
            .await?;
        self.store.insert_profile(user.id).await?;

        info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    async fn authenticate(&self, login: &str, password: &str) -> Result<Option<User>, UserError> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Ok(None);
        }
        Ok(self.store.verify_user_password(login, password).await?)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        email: Option<String>,
        nickname: Option<String>,
    ) -> Result<User, UserError> {
        self.get(user_id).await?;

        let email = email.as_deref().map(validate_email).transpose()?;
        let nickname = nickname.as_deref().map(validate_nickname).transpose()?;

        if let Some(field) = self
            .store
            .find_user_conflict(None, email.as_deref(), nickname.as_deref(), Some(user_id))
            .await?
        {
            return Err(UserError::Conflict(field_name(field).to_string()));
        }

        Ok(self
            .store
            .update_user_contact(user_id, email, nickname)
            .await?)
    }

    async fn enable_2fa(&self, user_id: UserId) -> Result<User, UserError> {
        self.set_2fa(user_id, true).await
    }

    async fn disable_2fa(&self, user_id: UserId) -> Result<User, UserError> {
        self.set_2fa(user_id, false).await
    }

    async fn get_by_api_key(&self, api_key: &str) -> Result<Option<User>, UserError> {
        if api_key.is_empty() {
            return Ok(None);
        }
        Ok(self.store.verify_api_key(api_key).await?)
    }

    async fn get(&self, user_id: UserId) -> Result<User, UserError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_follow_charset_and_length() {
        assert_eq!(validate_username(" alice_01 ").unwrap(), "alice_01");
        assert!(validate_username("a.b+c@d-e").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
    }

    #[test]
    fn emails_are_lowercased_and_checked() {
        assert_eq!(
            validate_email(" Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b.co").is_ok());
    }

    #[test]
    fn nicknames_are_bounded() {
        assert!(validate_nickname("Movie Buff").is_ok());
        assert!(validate_nickname("   ").is_err());
        assert!(validate_nickname(&"n".repeat(51)).is_err());
        assert!(validate_nickname("a/b").is_err());
    }
}
