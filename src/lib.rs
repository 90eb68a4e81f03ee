pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use services::Scheduler;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let prometheus_handle = if config.observability.metrics_enabled
        && matches!(cli.command, Some(Commands::Daemon))
    {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    init_tracing(&config);
    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Daemon => run_daemon(config, prometheus_handle).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists; leaving it untouched.");
            }
            Ok(())
        }

        Commands::Search { query, media_type } => {
            cli::cmd_search(config, &query.join(" "), media_type.as_deref()).await
        }

        Commands::Refresh { id } => cli::cmd_refresh(config, id).await,

        Commands::CreateUser {
            username,
            email,
            nickname,
            password,
        } => cli::cmd_create_user(config, username, email, nickname, password).await,
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.observability.json_logs;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    config.validate()?;
    info!(
        "ReelTrack v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    if config.server.debug {
        tracing::warn!("Debug mode is on; do not expose this instance publicly");
    }

    let port = config.server.port;
    let scheduler_config = config.scheduler.clone();

    let shared = Arc::new(SharedState::new(config).await?);
    let api_state = api::create_app_state(Arc::clone(&shared), prometheus_handle);

    let mut scheduler = Scheduler::new(Arc::clone(&shared.media_service), scheduler_config);
    if let Err(e) = scheduler.start().await {
        error!("Scheduler error: {}", e);
    }

    let app = api::router(api_state).await;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    scheduler.stop().await?;
    info!("Daemon stopped");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
