//! # Counter Commands
//!
//! Every operation the counter exposes. Each command takes the shared
//! [`AppState`](crate::state::AppState) plus its own arguments and returns
//! `Result<T, ApiError>`; the CLI wraps that in a `CommandResponse`.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── billing.rs    ◄─── create_unified_billing
//! ├── refund.rs     ◄─── refund_unified_billing, last bill by phone
//! ├── history.rs    ◄─── bill_history, search_bills, daily_summary
//! ├── inventory.rs  ◄─── list_inventory
//! └── token.rs      ◄─── issue_token
//! ```
//!
//! Writes need a cashier token; reads do not.

pub mod billing;
pub mod history;
pub mod inventory;
pub mod refund;
pub mod token;
