use crate::config::Config;
use crate::services::Registration;
use crate::state::SharedState;

pub async fn cmd_create_user(
    config: Config,
    username: String,
    email: String,
    nickname: String,
    password: Option<String>,
) -> anyhow::Result<()> {
    let Some(password) = password.or_else(|| std::env::var("REELTRACK_PASSWORD").ok()) else {
        anyhow::bail!("Pass --password or set REELTRACK_PASSWORD");
    };

    let state = SharedState::new(config).await?;
    let user = state
        .user_service
        .register(Registration {
            username,
            email,
            nickname,
            password,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Could not create user: {e}"))?;

    println!("✓ Created user {} (id {})", user.username, user.id);
    println!("  API key: {}", user.api_key);
    Ok(())
}
