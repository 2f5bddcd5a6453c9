pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use anyhow::Context;

use crate::core::identity::IdentityVerifier;
use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};
use crate::services::storage::StorageService;

async fn build_state(settings: Settings) -> anyhow::Result<AppState> {
    let db_pool = db::init_pool(&settings).await.context("Failed to connect to PostgreSQL")?;
    db::run_migrations(&db_pool).await.context("Failed to apply migrations")?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    if let Err(err) = redis.connect().await {
        tracing::error!(error = %err, "Failed to connect to Redis; login rate limiting disabled");
    } else {
        tracing::info!("Redis connected successfully");
    }

    let storage = StorageService::from_settings(&settings).await?;
    if storage.is_none() {
        tracing::warn!("S3 credentials not configured; image uploads are disabled");
    }
    let identity = IdentityVerifier::from_settings(&settings)?;

    Ok(AppState::new(settings, db_pool, redis, storage, identity))
}

fn load_settings() -> anyhow::Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;
    Ok(settings)
}

pub async fn run() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let state = build_state(settings).await?;

    if let Err(err) = core::bootstrap::ensure_first_admin(&state).await {
        tracing::error!(error = %err, "Failed to ensure first administrator");
    }
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Task scheduler API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}

pub async fn run_worker() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let state = build_state(settings).await?;

    let result = tasks::scheduler::run(state.clone()).await;

    state.redis().disconnect().await;
    tracing::info!("Redis disconnected");

    result
}

pub async fn run_sweep_once() -> anyhow::Result<()> {
    let settings = load_settings()?;
    let state = build_state(settings).await?;

    let summary = tasks::sweep::run_sweep(state.db(), state.storage()).await?;
    tracing::info!(
        marked_due = summary.marked_due,
        deleted = summary.deleted,
        repaired_indexes = summary.repaired_indexes,
        "One-shot sweep finished"
    );

    state.redis().disconnect().await;
    Ok(())
}
