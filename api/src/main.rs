//! Formdesk API server

use anyhow::Context;
use formdesk_api::config::ServerConfig;
use formdesk_api::{build_router, AppState};
use formdesk_core::{Formdesk, MemoryRepository, Repository, SqliteRepository};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;

    let repo: Arc<dyn Repository> = if config.database_url == "memory" {
        tracing::warn!("using in-memory storage; data is lost on restart");
        Arc::new(MemoryRepository::new())
    } else {
        let repo = SqliteRepository::connect(&config.database_url)
            .await
            .with_context(|| format!("failed to open database {}", config.database_url))?;
        tracing::info!(database_url = %config.database_url, "database ready");
        Arc::new(repo)
    };

    let formdesk = Formdesk::new(repo, &config.jwt_secret, config.token_ttl_hours);

    if let Some((email, password)) = config.bootstrap_admin() {
        formdesk
            .auth
            .bootstrap_admin(email, password)
            .await
            .context("failed to create bootstrap super-admin")?;
    }

    let state = AppState { formdesk, cors_permissive: config.cors_permissive };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Formdesk API listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
