//! # splash-core: Pure Business Logic for Splash POS
//!
//! This crate is the arithmetic and rules heart of the water-park counter.
//! Tickets, locker rentals and costume rentals are sold together on a single
//! unified bill; everything needed to price, validate and describe such a bill
//! lives here as pure functions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Splash POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  splash-counter (CLI / UI glue)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        splash-engine (billing, refund, claims, printing)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ splash-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  billing  │  │ validation│  │   │
//! │  │   │  Costume  │  │   Money   │  │ BillTotals│  │   rules   │  │   │
//! │  │   │  Locker   │  │   Rate    │  │ discounts │  │   cart    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  splash-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Inventory items, line items, the unified bill
//! - [`money`] - Money type with integer paise arithmetic
//! - [`cart`] - Incoming cart and refund selection requests
//! - [`billing`] - Subtotal, discount law, GST and the payment gate
//! - [`receipt`] - Printable receipt payloads
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use splash_core::billing::{BillTotals, Discount};
//! use splash_core::money::Money;
//! use splash_core::types::Rate;
//!
//! let totals = BillTotals::compute(
//!     Money::from_paise(100_000),
//!     Discount::percentage(1000), // 10% off
//!     Rate::zero(),
//! );
//! assert_eq!(totals.total.paise(), 90_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod cart;
pub mod error;
pub mod money;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use billing::{BillTotals, Discount};
pub use cart::{CartRequest, CostumeRequest, LockerRequest, RefundSelection, TicketRequest};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use receipt::{Receipt, ReceiptKind, ReceiptLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of line items (tickets + lockers + costumes) on one bill.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on a single ticket or costume line.
///
/// ## Business Reason
/// Catches a mistyped quantity (1000 instead of 10) at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Allowed gap between `cash + online` and the bill total, in paise (₹0.01).
pub const PAYMENT_TOLERANCE_PAISE: i64 = 1;

/// Largest amount accepted for either tender field, in paise (₹1 crore).
///
/// ## Business Reason
/// No counter sale comes near it; anything larger is a typo or garbage.
pub const MAX_TENDER_PAISE: i64 = 1_000_000_000;

/// Default facility offset from UTC in minutes (IST, +05:30).
pub const DEFAULT_FACILITY_OFFSET_MINUTES: i32 = 330;
