use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use folio_server::api::server::run_api;
use folio_server::auth::AuthSettings;
use folio_server::auth::accounts::ensure_admin;
use folio_server::state::AppState;
use folio_server::{config, db, media};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::loader::load()?;
    let (pool, db_root) = db::init_pool(&config.database.path).await?;
    tracing::info!("database ready at {}", db_root.display());

    let auth = AuthSettings::from_config(&config)?;
    let store = media::from_config(&config.media, reqwest::Client::new())?;

    match config.admin.resolve_credentials() {
        Some(admin) => {
            ensure_admin(&pool, &admin).await?;
        }
        None => tracing::warn!(
            "{} / {} not set; no admin account will be created",
            config.admin.email_env,
            config.admin.password_env
        ),
    }

    let state = AppState::new(pool, store, auth, config.server.environment);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {err}");
            return;
        }
        tracing::info!("shutting down");
        signal.cancel();
    });

    run_api(state, &config, shutdown).await
}
