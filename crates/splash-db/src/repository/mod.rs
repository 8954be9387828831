//! # Repository Module
//!
//! Database repository implementations for Splash POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories by Aggregate                            │
//! │                                                                         │
//! │  Engine / counter command                                              │
//! │       │                                                                 │
//! │       │  db.inventory().adjust_quantity(id, -2, rev)                   │
//! │       ▼                                                                 │
//! │  InventoryRepository   costumes + lockers, CAS on `revision`           │
//! │  TicketRepository      ticket catalog                                  │
//! │  BillingRepository     unified bill ledger (append, record refund)     │
//! │  HistoryRepository     read-only ledger queries                        │
//! │  SyncOutboxRepository  outbox rows for the external mirror             │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pool-backed methods acquire their own connection. Associated `*_tx`
//! functions run on a connection the caller owns, typically `&mut *tx`.

pub mod billing;
pub mod history;
pub mod inventory;
pub mod sync;
pub mod ticket;
