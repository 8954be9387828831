//! # Bill Arithmetic
//!
//! Pure pricing for a unified bill.
//!
//! ## Computation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► subtotal = Σ unit_price × quantity                           │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  discount_amount = clamp(flat | bps × subtotal, 0, subtotal)           │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  gst_amount = gst_rate × (subtotal − discount_amount)                  │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  total = subtotal − discount_amount + gst_amount                       │
//! │                │                                                        │
//! │                ▼                                                        │
//! │  payment gate: |cash + online − total| ≤ ₹0.01                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here reads or writes inventory; the engine runs the payment gate
//! before it reserves a single costume or locker.

use chrono::{DateTime, FixedOffset};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Costume, CostumeLine, DiscountType, Locker, LockerLine, Rate, TicketLine, TicketType};
use crate::PAYMENT_TOLERANCE_PAISE;

// =============================================================================
// Discount
// =============================================================================

/// A bill-level discount as entered at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    pub kind: DiscountType,
    /// Paise for `Flat`, basis points for `Percentage`.
    pub value: i64,
}

impl Discount {
    pub const fn none() -> Self {
        Discount {
            kind: DiscountType::Flat,
            value: 0,
        }
    }

    pub const fn flat(paise: i64) -> Self {
        Discount {
            kind: DiscountType::Flat,
            value: paise,
        }
    }

    pub const fn percentage(bps: i64) -> Self {
        Discount {
            kind: DiscountType::Percentage,
            value: bps,
        }
    }

    /// The discount law.
    ///
    /// - flat: `clamp(value, 0, subtotal)`
    /// - percentage: `clamp(value/10000 × subtotal, 0, subtotal)`
    ///
    /// ## Example
    /// ```rust
    /// use splash_core::billing::Discount;
    /// use splash_core::money::Money;
    ///
    /// let subtotal = Money::from_paise(10_000);
    /// assert_eq!(Discount::flat(25_000).amount_on(subtotal), subtotal);
    /// assert_eq!(Discount::percentage(1500).amount_on(subtotal).paise(), 1_500);
    /// assert_eq!(Discount::flat(-100).amount_on(subtotal), Money::zero());
    /// ```
    pub fn amount_on(&self, subtotal: Money) -> Money {
        let raw = match self.kind {
            DiscountType::Flat => Money::from_paise(self.value),
            DiscountType::Percentage => {
                let paise = (subtotal.paise() as i128 * self.value as i128 + 5000) / 10000;
                Money::from_paise(paise.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
            }
        };
        let ceiling = if subtotal.is_negative() {
            Money::zero()
        } else {
            subtotal
        };
        raw.clamp_between(Money::zero(), ceiling)
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::none()
    }
}

// =============================================================================
// Bill Totals
// =============================================================================

/// The four money figures stored on every bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub gst_amount: Money,
    pub total: Money,
}

impl BillTotals {
    /// Prices a bill from its subtotal.
    pub fn compute(subtotal: Money, discount: Discount, gst_rate: Rate) -> Self {
        let discount_amount = discount.amount_on(subtotal);
        let gst_amount = (subtotal - discount_amount).apply_rate(gst_rate);
        BillTotals {
            subtotal,
            discount_amount,
            gst_amount,
            total: subtotal - discount_amount + gst_amount,
        }
    }

    /// Prices a bill from its resolved lines.
    pub fn for_lines(
        tickets: &[TicketLine],
        lockers: &[LockerLine],
        costumes: &[CostumeLine],
        discount: Discount,
        gst_rate: Rate,
    ) -> Self {
        Self::compute(subtotal_of(tickets, lockers, costumes), discount, gst_rate)
    }

    /// The payment gate: tender must cover the total to within ₹0.01.
    ///
    /// ## Example
    /// ```rust
    /// use splash_core::billing::{BillTotals, Discount};
    /// use splash_core::money::Money;
    /// use splash_core::types::Rate;
    ///
    /// let totals = BillTotals::compute(Money::from_paise(100_000), Discount::none(), Rate::zero());
    /// assert!(totals.check_payment(Money::from_paise(60_000), Money::from_paise(40_000)).is_ok());
    /// assert!(totals.check_payment(Money::from_paise(60_000), Money::zero()).is_err());
    /// ```
    pub fn check_payment(&self, cash_paid: Money, online_paid: Money) -> CoreResult<()> {
        let Some(paid) = cash_paid.checked_add(online_paid) else {
            return Err(CoreError::PaymentMismatch {
                total: self.total,
                paid: cash_paid.saturating_add(online_paid),
            });
        };
        if !paid.within(self.total, Money::from_paise(PAYMENT_TOLERANCE_PAISE)) {
            return Err(CoreError::PaymentMismatch {
                total: self.total,
                paid,
            });
        }
        Ok(())
    }
}

/// `Σ unit_price × quantity` over every line on the bill.
pub fn subtotal_of(tickets: &[TicketLine], lockers: &[LockerLine], costumes: &[CostumeLine]) -> Money {
    let tickets: Money = tickets.iter().map(|t| t.total_amount).sum();
    let lockers: Money = lockers.iter().map(|l| l.unit_price * l.quantity).sum();
    let costumes: Money = costumes.iter().map(|c| c.amount).sum();
    tickets + lockers + costumes
}

// =============================================================================
// Line Construction
// =============================================================================

/// Snapshots a ticket type into a line.
pub fn ticket_line(ticket: &TicketType, quantity: i64) -> TicketLine {
    TicketLine {
        ticket_id: ticket.id.clone(),
        name: ticket.name.clone(),
        unit_price: ticket.unit_price,
        quantity,
        total_amount: ticket.unit_price * quantity,
    }
}

/// Snapshots a locker into a line, with its current refund value.
pub fn locker_line(locker: &Locker) -> LockerLine {
    LockerLine {
        locker_id: locker.id.clone(),
        locker_no: locker.locker_no.clone(),
        unit_price: locker.unit_price,
        quantity: 1,
        refund_price: locker.unit_refund_value,
        is_returned: false,
    }
}

/// Snapshots a costume into a line, with `unit_refund_value × quantity`.
pub fn costume_line(costume: &Costume, quantity: i64) -> CostumeLine {
    CostumeLine {
        costume_id: costume.id.clone(),
        category: costume.category.clone(),
        size: costume.size.clone(),
        unit_price: costume.unit_price,
        quantity,
        amount: costume.unit_price * quantity,
        refund_price: costume.unit_refund_value * quantity,
        is_returned: false,
    }
}

/// Hex digits of the bill id carried in a fresh bill number.
pub const BILL_NUMBER_DIGITS: usize = 6;

/// Formats the receipt number for a bill: `SPL-YYMMDD-XXXXXX`.
///
/// The suffix is the first six hex digits of the bill id, short enough to
/// read out at the return desk. Two bills on one day can still share it;
/// see [`bill_number_with_digits`].
pub fn bill_number(created_at: DateTime<FixedOffset>, bill_id: &str) -> String {
    bill_number_with_digits(created_at, bill_id, BILL_NUMBER_DIGITS)
}

/// Formats a bill number carrying `digits` hex digits of the bill id.
///
/// Used to lengthen a number that collided with an earlier bill. The
/// suffix never exceeds the hex digits the id actually has.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use splash_core::billing::bill_number_with_digits;
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap().fixed_offset();
/// let id = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
/// assert_eq!(bill_number_with_digits(at, id, 8), "SPL-260309-3FA85F64");
/// ```
pub fn bill_number_with_digits(
    created_at: DateTime<FixedOffset>,
    bill_id: &str,
    digits: usize,
) -> String {
    let suffix: String = bill_id
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .take(digits)
        .collect::<String>()
        .to_uppercase();
    format!("SPL-{}-{}", created_at.format("%y%m%d"), suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn costume(stock: i64) -> Costume {
        Costume {
            id: "c1".to_string(),
            category: "Swimsuit".to_string(),
            size: "M".to_string(),
            quantity_available: stock,
            unit_price: Money::from_paise(15_000),
            unit_refund_value: Money::from_paise(2_000),
            revision: 0,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_percentage_discount_law() {
        let subtotal = Money::from_paise(100_000);
        assert_eq!(Discount::percentage(1000).amount_on(subtotal).paise(), 10_000);
        assert_eq!(Discount::percentage(15_000).amount_on(subtotal), subtotal);
        assert_eq!(Discount::percentage(-500).amount_on(subtotal), Money::zero());
    }

    #[test]
    fn test_flat_discount_law() {
        let subtotal = Money::from_paise(100_000);
        assert_eq!(Discount::flat(5_000).amount_on(subtotal).paise(), 5_000);
        assert_eq!(Discount::flat(200_000).amount_on(subtotal), subtotal);
        assert_eq!(Discount::flat(-1).amount_on(subtotal), Money::zero());
    }

    #[test]
    fn test_totals_identity_with_gst() {
        let totals = BillTotals::compute(
            Money::from_paise(100_000),
            Discount::flat(10_000),
            Rate::from_bps(1800),
        );
        assert_eq!(totals.discount_amount.paise(), 10_000);
        assert_eq!(totals.gst_amount.paise(), 16_200);
        assert_eq!(totals.total.paise(), 106_200);
        assert_eq!(
            totals.subtotal - totals.discount_amount + totals.gst_amount,
            totals.total
        );
    }

    #[test]
    fn test_two_tickets_scenario() {
        let adult = TicketType {
            id: "adult".to_string(),
            name: "Adult Day Pass".to_string(),
            unit_price: Money::from_paise(50_000),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let tickets = vec![ticket_line(&adult, 2)];
        let totals = BillTotals::for_lines(&tickets, &[], &[], Discount::none(), Rate::zero());

        assert_eq!(totals.subtotal.paise(), 100_000);
        assert_eq!(totals.discount_amount, Money::zero());
        assert_eq!(totals.total.paise(), 100_000);
        assert!(totals.check_payment(Money::from_paise(100_000), Money::zero()).is_ok());
    }

    #[test]
    fn test_payment_gate_tolerance() {
        let totals = BillTotals::compute(Money::from_paise(10_000), Discount::none(), Rate::zero());
        assert!(totals.check_payment(Money::from_paise(9_999), Money::zero()).is_ok());
        assert!(totals.check_payment(Money::from_paise(5_000), Money::from_paise(5_001)).is_ok());
        assert!(matches!(
            totals.check_payment(Money::from_paise(9_998), Money::zero()),
            Err(CoreError::PaymentMismatch { .. })
        ));
        assert!(totals.check_payment(Money::from_paise(10_002), Money::zero()).is_err());
    }

    #[test]
    fn test_payment_gate_survives_overflowing_tender() {
        let max = Money::from_paise(i64::MAX);

        let totals = BillTotals::compute(Money::from_paise(10_000), Discount::none(), Rate::zero());
        match totals.check_payment(max, Money::from_paise(1)) {
            Err(CoreError::PaymentMismatch { paid, .. }) => assert_eq!(paid, max),
            other => panic!("expected PaymentMismatch, got {:?}", other),
        }

        let free = BillTotals::compute(Money::zero(), Discount::none(), Rate::zero());
        assert!(free.check_payment(max, max).is_err());
        assert!(free.check_payment(max, Money::zero()).is_err());
        assert!(free.check_payment(Money::zero(), Money::zero()).is_ok());
    }

    #[test]
    fn test_costume_line_snapshots_refund_value() {
        let line = costume_line(&costume(5), 3);
        assert_eq!(line.amount.paise(), 45_000);
        assert_eq!(line.refund_price.paise(), 6_000);
        assert!(!line.is_returned);
    }

    #[test]
    fn test_bill_number_format() {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 9, 10, 0, 0)
            .unwrap()
            .fixed_offset();
        let no = bill_number(at, "3fa85f64-5717-4562-b3fc-2c963f66afa6");
        assert_eq!(no, "SPL-260309-3FA85F");
        assert_eq!(no.len(), 17);
    }

    #[test]
    fn test_longer_bill_numbers_extend_the_short_one() {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 9, 10, 0, 0)
            .unwrap()
            .fixed_offset();
        let id = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

        let short = bill_number(at, id);
        let longer = bill_number_with_digits(at, id, BILL_NUMBER_DIGITS + 2);
        assert_eq!(longer, "SPL-260309-3FA85F64");
        assert!(longer.starts_with(&short));

        // The id has 32 hex digits; asking for more stops there.
        let full = bill_number_with_digits(at, id, 64);
        assert_eq!(full, "SPL-260309-3FA85F6457174562B3FC2C963F66AFA6");
    }
}
