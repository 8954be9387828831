//! # splash-engine: Billing and Refund Workflows
//!
//! Multi-step operations that span inventory and the bill ledger.
//!
//! ## Module Structure
//! ```text
//! splash-engine/
//! ├── billing.rs   ← create_unified_billing: reserve, persist, compensate
//! ├── refund.rs    ← refund_unified_billing, last-bill lookup
//! ├── claims.rs    ← access token → Actor
//! ├── printer.rs   ← receipt printers and the print spooler
//! ├── retry.rs     ← bounded compare-and-set retry
//! ├── config.rs    ← EngineConfig
//! └── error.rs     ← EngineError
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("splash.db")).await?;
//! let claims = ClaimsReader::new(secret);
//! let (spooler, _task) = PrintSpooler::spawn(Arc::new(LogPrinter), DEFAULT_SPOOL_CAPACITY);
//!
//! let billing = BillingEngine::new(db.clone(), claims.clone(), config.clone())
//!     .with_spooler(spooler.clone());
//! let bill = billing.create_unified_billing(&token, &cart).await?;
//!
//! let refunds = RefundEngine::new(db, claims, config).with_spooler(spooler);
//! let outcome = refunds.refund_unified_billing(&token, &bill.id, None).await?;
//! ```

pub mod billing;
pub mod claims;
pub mod config;
pub mod error;
pub mod printer;
pub mod refund;
pub mod retry;

pub use billing::BillingEngine;
pub use claims::{Actor, AuthError, ClaimsReader, Role};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use printer::{
    FilePrinter, LogPrinter, PrintError, PrintSpooler, PrintSpoolerHandle, ReceiptPrinter,
    DEFAULT_SPOOL_CAPACITY,
};
pub use refund::{RefundEngine, RefundOutcome, RefundQuote};
