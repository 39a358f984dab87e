pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod notify;
pub mod sheet;
pub mod vitals;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::ApiContext;
use crate::config::{Config, ConfigError};
use crate::db::DatabaseError;
use crate::notify::{AlertMailer, MailError};
use crate::sheet::{SheetError, SheetSource};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Mailer setup failed: {0}")]
    Mail(#[from] MailError),

    #[error("Sheet source setup failed: {0}")]
    Sheet(#[from] SheetError),

    #[error("Server error: {0}")]
    Server(String),
}

/// Initialise tracing from `RUST_LOG`, falling back to the crate default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load configuration, migrate the database, and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        "{} starting v{} on port {}",
        config::APP_NAME,
        config::APP_VERSION,
        config.port
    );

    // Blocking clients own a private runtime; build them off the executor.
    let setup_config = config.clone();
    let (mailer, sheet) = tokio::task::spawn_blocking(move || {
        db::open_database(&setup_config.database_url)?;
        let mailer: Arc<dyn AlertMailer> =
            notify::mailer_from_config(&setup_config.mail, setup_config.http_timeout_secs)?.into();
        let sheet: Arc<dyn SheetSource> =
            sheet::source_from_config(&setup_config.sheet, setup_config.http_timeout_secs)?.into();
        Ok::<_, StartupError>((mailer, sheet))
    })
    .await
    .map_err(|e| StartupError::Server(e.to_string()))??;
    tracing::info!(path = %config.database_url.display(), "Database ready");

    let ctx = ApiContext::new(config.clone(), mailer, sheet);
    let mut server = api::start_server(ctx.clone(), config.port)
        .await
        .map_err(StartupError::Server)?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.stopped().await;

    // Last reference to the blocking clients must not drop on the executor.
    let _ = tokio::task::spawn_blocking(move || drop(ctx)).await;
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
