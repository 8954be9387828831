//! # Cart Requests
//!
//! What the counter UI hands the billing engine, and what the return desk
//! hands the refund engine. These are requests, not records: prices are never
//! taken from here, they are looked up from the catalog at billing time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::money::Money;
use crate::types::DiscountType;
use crate::validation::{
    validate_customer_name, validate_customer_number, validate_line_count,
    validate_quantity, validate_tender, ValidationResult,
};
use crate::error::ValidationError;

/// `quantity` tickets of one ticket type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TicketRequest {
    pub ticket_id: String,
    pub quantity: i64,
}

/// One locker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LockerRequest {
    pub locker_id: String,
}

/// `quantity` units of one costume category/size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CostumeRequest {
    pub costume_id: String,
    pub quantity: i64,
}

/// A cart submitted for billing.
///
/// ## JSON Shape
/// ```json
/// {
///   "customerName": "Asha",
///   "customerNumber": "9876543210",
///   "tickets": [{ "ticketId": "…", "quantity": 2 }],
///   "lockers": [{ "lockerId": "…" }],
///   "costumes": [{ "costumeId": "…", "quantity": 1 }],
///   "discount": 1000,
///   "discountType": "percentage",
///   "cashPaid": 90000,
///   "onlinePaid": 0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartRequest {
    pub customer_name: String,
    pub customer_number: String,
    #[serde(default)]
    pub tickets: Vec<TicketRequest>,
    #[serde(default)]
    pub lockers: Vec<LockerRequest>,
    #[serde(default)]
    pub costumes: Vec<CostumeRequest>,
    /// Paise for flat discounts, basis points for percentage discounts.
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub cash_paid: Money,
    #[serde(default)]
    pub online_paid: Money,
}

impl CartRequest {
    pub fn line_count(&self) -> usize {
        self.tickets.len() + self.lockers.len() + self.costumes.len()
    }

    /// Checks the cart's shape. Does not look anything up.
    ///
    /// ## Rules
    /// - customer name and number present and well-formed
    /// - at least one line, at most `MAX_CART_LINES`
    /// - every ticket/costume quantity in `1..=MAX_ITEM_QUANTITY`
    /// - a locker or costume appears at most once
    /// - tender amounts are not negative
    pub fn validate(&self) -> ValidationResult<()> {
        validate_customer_name(&self.customer_name)?;
        validate_customer_number(&self.customer_number)?;
        validate_line_count(self.line_count())?;

        for ticket in &self.tickets {
            require_ref("ticket id", &ticket.ticket_id)?;
            validate_quantity(ticket.quantity)?;
        }

        let mut seen = HashSet::new();
        for locker in &self.lockers {
            require_ref("locker id", &locker.locker_id)?;
            if !seen.insert(locker.locker_id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "locker".to_string(),
                    value: locker.locker_id.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        for costume in &self.costumes {
            require_ref("costume id", &costume.costume_id)?;
            validate_quantity(costume.quantity)?;
            if !seen.insert(costume.costume_id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "costume".to_string(),
                    value: costume.costume_id.clone(),
                });
            }
        }

        validate_tender("cash paid", self.cash_paid)?;
        validate_tender("online paid", self.online_paid)?;

        Ok(())
    }
}

fn require_ref(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Which lines of a bill are being handed back.
///
/// Absent selection = everything still out on the bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RefundSelection {
    #[serde(default)]
    pub costume_ids: Vec<String>,
    #[serde(default)]
    pub locker_ids: Vec<String>,
}

impl RefundSelection {
    pub fn is_empty(&self) -> bool {
        self.costume_ids.is_empty() && self.locker_ids.is_empty()
    }

    pub fn includes_costume(&self, id: &str) -> bool {
        self.costume_ids.iter().any(|c| c == id)
    }

    pub fn includes_locker(&self, id: &str) -> bool {
        self.locker_ids.iter().any(|l| l == id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
