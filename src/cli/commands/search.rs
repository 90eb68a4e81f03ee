use crate::config::Config;
use crate::services::MediaFactory;
use crate::state::SharedState;

pub async fn cmd_search(
    config: Config,
    query: &str,
    media_type: Option<&str>,
) -> anyhow::Result<()> {
    let kind = media_type
        .map(MediaFactory::parse_kind)
        .transpose()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let state = SharedState::new(config).await?;
    println!("Searching for: {query}");

    let outcome = state
        .media_service
        .search(query, kind)
        .await
        .map_err(|e| anyhow::anyhow!("Search failed: {e}"))?;

    if outcome.degraded {
        println!("TMDb is unavailable; showing local matches only.");
    }

    if !outcome.results.is_empty() {
        println!();
        println!("TMDb results:");
        println!("{:-<60}", "");
        for hit in &outcome.results {
            let year = hit
                .release_date
                .map_or_else(|| "????".to_string(), |d| d.format("%Y").to_string());
            println!("• {} ({year}) [{}]", hit.title, hit.media_type);
            println!(
                "  TMDb ID: {} | Rating: {:.1}",
                hit.tmdb_id, hit.vote_average
            );
            if !hit.directors.is_empty() {
                println!("  Directed by: {}", hit.directors.join(", "));
            }
            if !hit.cast.is_empty() {
                println!("  Starring: {}", hit.cast.join(", "));
            }
        }
    }

    if !outcome.local_matches.is_empty() {
        println!();
        println!("In your catalogue:");
        println!("{:-<60}", "");
        for media in &outcome.local_matches {
            println!("• #{} {} [{}]", media.id, media.title(), media.kind());
        }
    }

    if outcome.results.is_empty() && outcome.local_matches.is_empty() {
        println!("No media found matching '{query}'");
    }

    Ok(())
}
