use crate::config::Config;
use crate::domain::MediaId;
use crate::state::SharedState;

pub async fn cmd_refresh(config: Config, id: Option<i32>) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    if let Some(id) = id {
        let media = state
            .media_service
            .refresh_metadata(MediaId::new(id))
            .await
            .map_err(|e| anyhow::anyhow!("Refresh failed: {e}"))?;
        println!("✓ Refreshed #{} {}", media.id, media.title());
        return Ok(());
    }

    let summary = state
        .media_service
        .refresh_all()
        .await
        .map_err(|e| anyhow::anyhow!("Refresh failed: {e}"))?;

    println!(
        "✓ Refresh complete: {} refreshed, {} skipped, {} failed",
        summary.refreshed, summary.skipped, summary.failed
    );
    Ok(())
}
