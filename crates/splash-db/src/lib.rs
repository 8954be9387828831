//! # splash-db: Database Layer for Splash POS
//!
//! SQLite storage for inventory, the ticket catalog, the unified bill ledger
//! and the sync outbox, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Splash POS Data Flow                             │
//! │                                                                         │
//! │  splash-engine (create / refund)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    splash-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ Inventory (CAS)│   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Ticket         │   │ 001_initial  │  │   │
//! │  │   │ Transactions  │    │ Billing ledger │   │   _schema    │  │   │
//! │  │   │               │    │ History, Sync  │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (SPLASH_DB_PATH)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types, including CAS outcomes
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use splash_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("splash.db")).await?;
//!
//! let costume = db.inventory().find_costume(&costume_id).await?;
//! let costume = db
//!     .inventory()
//!     .adjust_quantity(&costume.id, -2, costume.revision)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::billing::BillingRepository;
pub use repository::history::HistoryRepository;
pub use repository::inventory::{InventoryRepository, NewCostume, NewLocker};
pub use repository::sync::SyncOutboxRepository;
pub use repository::ticket::TicketRepository;
