//! # Domain Types
//!
//! Core domain types used throughout Splash POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INVENTORY (mutable, revision-stamped)     CATALOG                      │
//! │  ┌─────────────────┐ ┌─────────────────┐   ┌─────────────────┐         │
//! │  │    Costume      │ │     Locker      │   │   TicketType    │         │
//! │  │  quantity ≥ 0   │ │  status         │   │  unit_price     │         │
//! │  │  unit_price     │ │  unit_price     │   │  (no stock)     │         │
//! │  │  refund_value   │ │  refund_value   │   └─────────────────┘         │
//! │  │  revision       │ │  revision       │                               │
//! │  └─────────────────┘ └─────────────────┘                               │
//! │                                                                         │
//! │  LEDGER (append-only)                                                   │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │ UnifiedBill                                                       │ │
//! │  │   tickets:  [TicketLine]                                          │ │
//! │  │   lockers:  [LockerLine]   ← refund_price, is_returned            │ │
//! │  │   costumes: [CostumeLine]  ← refund_price, is_returned            │ │
//! │  │   subtotal − discount_amount + gst_amount = total                 │ │
//! │  │   cash_paid + online_paid ≈ total                                 │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Revision Stamps
//! Every inventory row carries a `revision` that the store bumps on each
//! write. Writers pass the revision they read; a mismatch means somebody
//! else got there first and the write is rejected as a conflict.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18% GST and 1000 bps = 10% off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Costume
// =============================================================================

/// A costume category/size held in stock and rented by the unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Costume {
    pub id: String,

    /// e.g. "Swimsuit", "Kids Float Vest".
    pub category: String,

    /// e.g. "S", "M", "XL".
    pub size: String,

    /// Units on the shelf. Never negative.
    pub quantity_available: i64,

    /// Rental price per unit.
    pub unit_price: Money,

    /// Amount handed back per unit when the costume is returned.
    pub unit_refund_value: Money,

    /// Optimistic concurrency stamp, bumped on every write.
    pub revision: i64,

    /// Soft delete flag.
    pub is_deleted: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Costume {
    /// Checks if `quantity` units can be rented right now.
    pub fn can_rent(&self, quantity: i64) -> bool {
        !self.is_deleted && self.quantity_available >= quantity
    }

    /// Human label used on receipts and in errors.
    pub fn label(&self) -> String {
        format!("{} ({})", self.category, self.size)
    }
}

// =============================================================================
// Locker
// =============================================================================

/// Occupancy of a single locker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum LockerStatus {
    Available,
    Occupied,
}

impl LockerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockerStatus::Available => "available",
            LockerStatus::Occupied => "occupied",
        }
    }
}

impl Default for LockerStatus {
    fn default() -> Self {
        LockerStatus::Available
    }
}

impl fmt::Display for LockerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockerStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(LockerStatus::Available),
            "occupied" => Ok(LockerStatus::Occupied),
            other => Err(ValidationError::InvalidFormat {
                field: "locker status".to_string(),
                reason: format!("'{}' is not one of: available, occupied", other),
            }),
        }
    }
}

/// A numbered locker. Lockers have no quantity, only a status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Locker {
    pub id: String,

    /// Number painted on the door, e.g. "L-014".
    pub locker_no: String,

    pub status: LockerStatus,

    /// Rental price.
    pub unit_price: Money,

    /// Deposit returned when the key comes back.
    pub unit_refund_value: Money,

    pub revision: i64,

    pub is_deleted: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Locker {
    pub fn is_available(&self) -> bool {
        !self.is_deleted && self.status == LockerStatus::Available
    }
}

// =============================================================================
// Ticket Type
// =============================================================================

/// An entry ticket kind. Tickets are not stock-limited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TicketType {
    pub id: String,

    /// e.g. "Adult Day Pass".
    pub name: String,

    pub unit_price: Money,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Discount Type
// =============================================================================

/// How the bill-level `discount` value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DiscountType {
    /// `discount` is an amount in paise.
    Flat,
    /// `discount` is a rate in basis points.
    Percentage,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Flat => "flat",
            DiscountType::Percentage => "percentage",
        }
    }
}

impl Default for DiscountType {
    fn default() -> Self {
        DiscountType::Flat
    }
}

impl FromStr for DiscountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(DiscountType::Flat),
            "percentage" | "percent" => Ok(DiscountType::Percentage),
            other => Err(ValidationError::InvalidFormat {
                field: "discount type".to_string(),
                reason: format!("'{}' is not one of: flat, percentage", other),
            }),
        }
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// A ticket line. Snapshot of the catalog price at sale time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TicketLine {
    pub ticket_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// unit_price × quantity.
    pub total_amount: Money,
}

/// A locker rental line (one locker per line).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LockerLine {
    pub locker_id: String,
    pub locker_no: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// Refund owed for this locker.
    ///
    /// Written at sale time, then recomputed from the live
    /// `unit_refund_value` at lookup and at refund.
    pub refund_price: Money,
    #[serde(default)]
    pub is_returned: bool,
}

/// A costume rental line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CostumeLine {
    pub costume_id: String,
    pub category: String,
    pub size: String,
    pub unit_price: Money,
    pub quantity: i64,
    /// unit_price × quantity.
    pub amount: Money,
    /// unit_refund_value × quantity; live-recomputed like [`LockerLine::refund_price`].
    pub refund_price: Money,
    #[serde(default)]
    pub is_returned: bool,
}

// =============================================================================
// Unified Bill
// =============================================================================

/// One counter transaction: tickets, lockers and costumes together.
///
/// Core fields are immutable once written. The refund engine only flips
/// line `is_returned` flags, the bill-level `is_returned` flag (never back to
/// false), `refund_amount`, `updated_at` and `updated_by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UnifiedBill {
    pub id: String,

    /// Human-readable receipt number: `SPL-YYMMDD-XXXXXX`.
    pub bill_no: String,

    pub customer_name: String,

    /// Customer phone number; used to look bills up at the return desk.
    pub customer_number: String,

    pub tickets: Vec<TicketLine>,
    pub lockers: Vec<LockerLine>,
    pub costumes: Vec<CostumeLine>,

    /// Paise when `discount_type` is flat, basis points when percentage.
    pub discount: i64,
    pub discount_type: DiscountType,

    pub cash_paid: Money,
    pub online_paid: Money,

    pub subtotal: Money,
    pub discount_amount: Money,
    pub gst_amount: Money,
    pub total: Money,

    pub is_returned: bool,

    /// Sum of refunds paid out against this bill so far.
    pub refund_amount: Money,

    /// Facility-local calendar date, `YYYY-MM-DD`.
    pub bill_date: String,

    pub created_by: String,

    #[ts(as = "String")]
    pub created_at: DateTime<FixedOffset>,

    #[ts(as = "String")]
    pub updated_at: DateTime<FixedOffset>,

    pub updated_by: String,
}

impl UnifiedBill {
    /// Cash plus online tender.
    pub fn paid(&self) -> Money {
        self.cash_paid + self.online_paid
    }

    /// Number of locker and costume lines not yet handed back.
    pub fn open_returnables(&self) -> usize {
        self.lockers.iter().filter(|l| !l.is_returned).count()
            + self.costumes.iter().filter(|c| !c.is_returned).count()
    }

    /// Checks `subtotal − discount_amount + gst_amount == total`.
    pub fn totals_balance(&self) -> bool {
        self.subtotal - self.discount_amount + self.gst_amount == self.total
    }

    /// Refund currently recorded on the open lines' `refund_price` snapshots.
    pub fn open_refund_value(&self) -> Money {
        let lockers: Money = self
            .lockers
            .iter()
            .filter(|l| !l.is_returned)
            .map(|l| l.refund_price)
            .sum();
        let costumes: Money = self
            .costumes
            .iter()
            .filter(|c| !c.is_returned)
            .map(|c| c.refund_price)
            .sum();
        lockers + costumes
    }
}

// =============================================================================
// Bill Summary
// =============================================================================

/// Aggregate over the bills issued in a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BillSummary {
    pub bill_count: i64,
    pub returned_count: i64,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub gst_amount: Money,
    pub total: Money,
    pub cash_paid: Money,
    pub online_paid: Money,
    pub refund_amount: Money,
}

impl BillSummary {
    /// Money collected minus money paid back.
    pub fn net_takings(&self) -> Money {
        self.total - self.refund_amount
    }
}

// =============================================================================
// Sync Outbox
// =============================================================================

/// An entry in the sync outbox queue read by the external mirror.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SyncOutboxEntry {
    pub id: String,
    /// Type of entity being synced. Only bills are queued: "BILL".
    pub entity_type: String,
    pub entity_id: String,
    /// The full entity data as JSON.
    pub payload: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub attempted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub synced_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bill() -> UnifiedBill {
        let now = Utc::now().fixed_offset();
        UnifiedBill {
            id: "bill-1".to_string(),
            bill_no: "SPL-260101-000001".to_string(),
            customer_name: "Asha".to_string(),
            customer_number: "9876543210".to_string(),
            tickets: vec![],
            lockers: vec![LockerLine {
                locker_id: "l1".to_string(),
                locker_no: "L-001".to_string(),
                unit_price: Money::from_paise(10_000),
                quantity: 1,
                refund_price: Money::from_paise(8_000),
                is_returned: false,
            }],
            costumes: vec![CostumeLine {
                costume_id: "c1".to_string(),
                category: "Swimsuit".to_string(),
                size: "M".to_string(),
                unit_price: Money::from_paise(5_000),
                quantity: 2,
                amount: Money::from_paise(10_000),
                refund_price: Money::from_paise(4_000),
                is_returned: true,
            }],
            discount: 0,
            discount_type: DiscountType::Flat,
            cash_paid: Money::from_paise(20_000),
            online_paid: Money::zero(),
            subtotal: Money::from_paise(20_000),
            discount_amount: Money::zero(),
            gst_amount: Money::zero(),
            total: Money::from_paise(20_000),
            is_returned: false,
            refund_amount: Money::zero(),
            bill_date: "2026-01-01".to_string(),
            created_by: "cashier-1".to_string(),
            created_at: now,
            updated_at: now,
            updated_by: "cashier-1".to_string(),
        }
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(18.0).bps(), 1800);
        assert!((Rate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_locker_status_parse() {
        assert_eq!("Occupied".parse::<LockerStatus>().unwrap(), LockerStatus::Occupied);
        assert!("broken".parse::<LockerStatus>().is_err());
    }

    #[test]
    fn test_discount_type_parse() {
        assert_eq!("percent".parse::<DiscountType>().unwrap(), DiscountType::Percentage);
        assert_eq!(DiscountType::default(), DiscountType::Flat);
    }

    #[test]
    fn test_open_returnables_skips_returned_lines() {
        let bill = sample_bill();
        assert_eq!(bill.open_returnables(), 1);
        assert_eq!(bill.open_refund_value(), Money::from_paise(8_000));
    }

    #[test]
    fn test_bill_serializes_camel_case() {
        let json = serde_json::to_value(sample_bill()).unwrap();
        assert_eq!(json["customerNumber"], "9876543210");
        assert_eq!(json["discountType"], "flat");
        assert_eq!(json["lockers"][0]["refundPrice"], 8_000);
    }

    #[test]
    fn test_totals_balance() {
        let mut bill = sample_bill();
        assert!(bill.totals_balance());
        bill.gst_amount = Money::from_paise(1);
        assert!(!bill.totals_balance());
    }
}
