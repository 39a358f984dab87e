//! Shared state for the HTTP layer.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::auth::TokenKeys;
use crate::config::Config;
use crate::db;
use crate::notify::AlertMailer;
use crate::sheet::SheetSource;
use crate::vitals::{ClinicalClassifier, IngestionWorkflow};

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
///
/// Everything here is immutable after startup.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenKeys>,
    pub ingestion: Arc<IngestionWorkflow>,
    pub sheet: Arc<dyn SheetSource>,
}

impl ApiContext {
    pub fn new(
        config: Arc<Config>,
        mailer: Arc<dyn AlertMailer>,
        sheet: Arc<dyn SheetSource>,
    ) -> Self {
        let ingestion = IngestionWorkflow::new(
            ClinicalClassifier::default(),
            config.alert_policy.clone(),
            mailer,
        );
        Self {
            tokens: Arc::new(TokenKeys::from_config(&config)),
            ingestion: Arc::new(ingestion),
            sheet,
            config,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.config.database_url.clone()
    }

    /// Run `f` with a fresh connection on the blocking pool.
    ///
    /// SQLite, the mailer and the sheet client all block, so every
    /// handler that touches them goes through here.
    pub async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
    {
        let path = self.db_path();
        tokio::task::spawn_blocking(move || {
            let conn = db::connect(&path)?;
            f(&conn)
        })
        .await?
    }
}
