//! # Receipts
//!
//! Printable payloads for sale and refund receipts. Building and rendering a
//! receipt is pure; getting it onto paper is the engine's print spooler's job.
//!
//! ## Rendered Layout
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Splash Water Park                      │
//! │ SALE  SPL-260309-3FA85F                │
//! │ 2026-03-09 15:30 +05:30                │
//! │ Asha (9876543210)                      │
//! │ ────────────────────────────────────── │
//! │ Adult Day Pass x2            ₹1000.00  │
//! │ Locker L-007 x1               ₹100.00  │
//! │ ────────────────────────────────────── │
//! │ Subtotal                     ₹1100.00  │
//! │ Total                        ₹1100.00  │
//! └────────────────────────────────────────┘
//! ```

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use ts_rs::TS;

use crate::money::Money;
use crate::types::UnifiedBill;

const RULE_WIDTH: usize = 40;

/// Sale or refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ReceiptKind {
    Sale,
    Refund,
}

impl ReceiptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptKind::Sale => "SALE",
            ReceiptKind::Refund => "REFUND",
        }
    }
}

/// One printed line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ReceiptLine {
    pub description: String,
    pub quantity: i64,
    pub amount: Money,
}

/// A receipt ready for the printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub kind: ReceiptKind,
    pub facility: String,
    pub bill_id: String,
    pub bill_no: String,
    pub customer_name: String,
    pub customer_number: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<FixedOffset>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub gst_amount: Money,
    pub total: Money,
    pub cash_paid: Money,
    pub online_paid: Money,
}

impl Receipt {
    /// Receipt for a freshly created bill: every line at its sale amount.
    pub fn for_sale(bill: &UnifiedBill, facility: &str) -> Self {
        let mut lines = Vec::with_capacity(
            bill.tickets.len() + bill.lockers.len() + bill.costumes.len(),
        );

        for t in &bill.tickets {
            lines.push(ReceiptLine {
                description: t.name.clone(),
                quantity: t.quantity,
                amount: t.total_amount,
            });
        }
        for l in &bill.lockers {
            lines.push(ReceiptLine {
                description: format!("Locker {}", l.locker_no),
                quantity: l.quantity,
                amount: l.unit_price * l.quantity,
            });
        }
        for c in &bill.costumes {
            lines.push(ReceiptLine {
                description: format!("{} ({})", c.category, c.size),
                quantity: c.quantity,
                amount: c.amount,
            });
        }

        Receipt {
            kind: ReceiptKind::Sale,
            facility: facility.to_string(),
            bill_id: bill.id.clone(),
            bill_no: bill.bill_no.clone(),
            customer_name: bill.customer_name.clone(),
            customer_number: bill.customer_number.clone(),
            issued_at: bill.created_at,
            lines,
            subtotal: bill.subtotal,
            discount_amount: bill.discount_amount,
            gst_amount: bill.gst_amount,
            total: bill.total,
            cash_paid: bill.cash_paid,
            online_paid: bill.online_paid,
        }
    }

    /// Receipt for a refund: only the lines handed back, at the value paid out.
    ///
    /// `returned` is the set of `(description, quantity, refund)` actually
    /// refunded in this operation.
    pub fn for_refund(bill: &UnifiedBill, returned: Vec<ReceiptLine>, facility: &str) -> Self {
        let amount: Money = returned.iter().map(|l| l.amount).sum();
        Receipt {
            kind: ReceiptKind::Refund,
            facility: facility.to_string(),
            bill_id: bill.id.clone(),
            bill_no: bill.bill_no.clone(),
            customer_name: bill.customer_name.clone(),
            customer_number: bill.customer_number.clone(),
            issued_at: bill.updated_at,
            lines: returned,
            subtotal: amount,
            discount_amount: Money::zero(),
            gst_amount: Money::zero(),
            total: amount,
            cash_paid: amount,
            online_paid: Money::zero(),
        }
    }

    /// Plain-text rendering for line printers and receipt files.
    pub fn render(&self) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();

        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", self.facility);
        let _ = writeln!(out, "{}  {}", self.kind.as_str(), self.bill_no);
        let _ = writeln!(out, "{}", self.issued_at.format("%Y-%m-%d %H:%M %:z"));
        let _ = writeln!(out, "{} ({})", self.customer_name, self.customer_number);
        let _ = writeln!(out, "{}", rule);

        for line in &self.lines {
            push_row(&mut out, &format!("{} x{}", line.description, line.quantity), line.amount);
        }

        let _ = writeln!(out, "{}", rule);
        match self.kind {
            ReceiptKind::Sale => {
                push_row(&mut out, "Subtotal", self.subtotal);
                if !self.discount_amount.is_zero() {
                    push_row(&mut out, "Discount", Money::zero() - self.discount_amount);
                }
                if !self.gst_amount.is_zero() {
                    push_row(&mut out, "GST", self.gst_amount);
                }
                push_row(&mut out, "Total", self.total);
                if !self.cash_paid.is_zero() {
                    push_row(&mut out, "Cash", self.cash_paid);
                }
                if !self.online_paid.is_zero() {
                    push_row(&mut out, "Online", self.online_paid);
                }
            }
            ReceiptKind::Refund => {
                push_row(&mut out, "Refunded", self.total);
            }
        }

        out
    }
}

fn push_row(out: &mut String, label: &str, amount: Money) {
    let amount = amount.to_string();
    let pad = RULE_WIDTH.saturating_sub(label.chars().count() + amount.chars().count());
    let _ = writeln!(out, "{}{}{}", label, " ".repeat(pad.max(1)), amount);
}

// =============================================================================
// Unit Tests
// =============================================================================
