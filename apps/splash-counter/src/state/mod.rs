//! # State Module
//!
//! Everything a command needs, built once at startup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  AppConfig::load()                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppState::init(config)                                                 │
//! │       ├── Database        (SQLite pool, migrations applied)             │
//! │       ├── ClaimsReader    (SPLASH_JWT_SECRET)                           │
//! │       ├── PrintSpooler    (FilePrinter or LogPrinter, spawned)          │
//! │       ├── BillingEngine ──┐                                             │
//! │       └── RefundEngine  ──┴── share Database, claims and spooler        │
//! │                                                                         │
//! │  AppState::shutdown(): drain print queue, close pool                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;

pub use config::{AppConfig, ConfigError};

use std::sync::Arc;

use chrono::{NaiveDate, Offset, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use splash_db::{Database, DbConfig};
use splash_engine::config::offset_from_minutes;
use splash_engine::{
    BillingEngine, ClaimsReader, FilePrinter, LogPrinter, PrintSpooler, PrintSpoolerHandle,
    ReceiptPrinter, RefundEngine,
};

use crate::error::ApiError;

/// Shared counter state.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub claims: ClaimsReader,
    pub billing: BillingEngine,
    pub refunds: RefundEngine,
    spooler: PrintSpoolerHandle,
    spooler_task: JoinHandle<()>,
}

impl AppState {
    /// Opens the database at `config.db_path` and builds the engines.
    pub async fn init(config: AppConfig) -> Result<Self, ApiError> {
        let db = Database::new(DbConfig::new(&config.db_path)).await?;
        Self::with_database(config, db)
    }

    /// Builds the engines over an already opened database.
    pub fn with_database(config: AppConfig, db: Database) -> Result<Self, ApiError> {
        let engine_config = config.engine_config()?;
        let claims = ClaimsReader::new(config.jwt_secret.clone());

        let printer: Arc<dyn ReceiptPrinter> = match &config.receipt_file {
            Some(path) => {
                info!(path = %path.display(), "Printing receipts to file");
                Arc::new(FilePrinter::new(path))
            }
            None => Arc::new(LogPrinter),
        };
        let (spooler, spooler_task) = PrintSpooler::spawn(printer, config.print_queue);

        let billing = BillingEngine::new(db.clone(), claims.clone(), engine_config.clone())
            .with_spooler(spooler.clone());
        let refunds = RefundEngine::new(db.clone(), claims.clone(), engine_config)
            .with_spooler(spooler.clone());

        Ok(AppState {
            config,
            db,
            claims,
            billing,
            refunds,
            spooler,
            spooler_task,
        })
    }

    /// Today's date on the facility clock.
    pub fn facility_today(&self) -> NaiveDate {
        let offset = offset_from_minutes(self.config.tz_offset_minutes).unwrap_or_else(|| Utc.fix());
        Utc::now().with_timezone(&offset).date_naive()
    }

    /// Prints whatever receipts are still queued, then closes the pool.
    pub async fn shutdown(self) {
        self.spooler.shutdown().await;
        if let Err(e) = self.spooler_task.await {
            warn!(?e, "Print spooler did not stop cleanly");
        }
        self.db.close().await;
    }
}
