use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use learnhub_core::{
    CatalogStore, CertificateGenerator, CourseProvider, EnrollmentStore, MemoryProvider,
    PaymentGateway, SessionLedger, SimulatedGateway,
};
use learnhub_json::JsonSessionStore;
use learnhub_sqlite::SqliteProvider;

use crate::client::HttpProvider;
use crate::config::AppConfig;

/// Everything a command needs, wired once per process.
pub struct AppContext {
    pub provider: Arc<dyn CourseProvider>,
    pub catalog: Arc<CatalogStore>,
    pub enrollments: Arc<EnrollmentStore>,
    pub ledger: Arc<SessionLedger>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub timeout: Duration,
}

impl AppContext {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let provider = open_provider(config).await?;
        let ledger = open_ledger(config).await?;
        let catalog = Arc::new(CatalogStore::new(provider.clone()));
        let enrollments = Arc::new(EnrollmentStore::new(
            provider.clone(),
            ledger.clone(),
            CertificateGenerator::new(config.student_name.clone()),
        ));
        Ok(Self {
            provider,
            catalog,
            enrollments,
            ledger,
            gateway: Arc::new(SimulatedGateway),
            timeout: config.timeout,
        })
    }
}

/// Remote API when configured, then SQLite, then the in-memory mock database.
pub async fn open_provider(config: &AppConfig) -> Result<Arc<dyn CourseProvider>> {
    if let Some(url) = &config.remote {
        tracing::info!(%url, "using remote provider");
        return Ok(Arc::new(HttpProvider::new(url.clone(), config.timeout)?));
    }
    if let Some(path) = &config.database {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = SqliteProvider::open_file(path).await?;
        let seeded = db.seed_if_empty().await?;
        if seeded > 0 {
            tracing::info!(path = %path.display(), courses = seeded, "seeded new database");
        }
        tracing::debug!(path = %path.display(), "using sqlite provider");
        return Ok(Arc::new(db));
    }
    tracing::info!("no database configured, using in-memory mock database");
    Ok(Arc::new(MemoryProvider::seeded()))
}

pub async fn open_ledger(config: &AppConfig) -> Result<Arc<SessionLedger>> {
    let store = match &config.state_file {
        Some(path) => JsonSessionStore::open(path.clone()).await?,
        None => JsonSessionStore::open_default().await?,
    };
    Ok(Arc::new(SessionLedger::open(Arc::new(store)).await?))
}
