pub mod config;
pub mod errors;
pub mod models;
pub mod parsers;
pub mod routes;
pub mod services;

use std::sync::Arc;

use tokio::sync::Mutex;

use services::session::ReportSession;
use services::storage::ReportStore;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub session: Arc<Mutex<ReportSession>>,
    pub store: ReportStore,
    pub config: config::AppConfig,
}

impl AppState {
    /// Resume from the configured save file.
    pub async fn load(config: config::AppConfig) -> Result<Self, errors::AppError> {
        let store = ReportStore::new(config.report_save_file.clone());
        let report = store.load().await?;
        Ok(Self {
            session: Arc::new(Mutex::new(ReportSession::from_report(report))),
            store,
            config,
        })
    }
}
