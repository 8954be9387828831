//! # Validation Module
//!
//! Input validation utilities for Splash POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Counter UI                                                   │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine entry (Rust)                                          │
//! │  ├── Deserialization (types)                                           │
//! │  └── THIS MODULE: shape rules, before anything is read or written      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity_available >= 0)                                   │
//! │  └── UNIQUE (locker_no, bill_no)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use splash_core::validation::{validate_customer_number, validate_quantity};
//!
//! validate_customer_number("9876543210").unwrap();
//! validate_quantity(3).unwrap();
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_TENDER_PAISE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates the customer's name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most 100 characters
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "customer name".to_string(),
        });
    }

    if name.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates the customer's phone number.
///
/// ## Rules
/// - Must not be empty
/// - Digits only, with an optional leading `+`
/// - Between 6 and 15 digits
///
/// ## Example
/// ```rust
/// use splash_core::validation::validate_customer_number;
///
/// assert!(validate_customer_number("9876543210").is_ok());
/// assert!(validate_customer_number("+919876543210").is_ok());
/// assert!(validate_customer_number("").is_err());
/// assert!(validate_customer_number("98765-43210").is_err());
/// ```
pub fn validate_customer_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "customer number".to_string(),
        });
    }

    let digits = number.strip_prefix('+').unwrap_or(number);

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "customer number".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    if digits.len() < 6 {
        return Err(ValidationError::TooShort {
            field: "customer number".to_string(),
            min: 6,
        });
    }

    if digits.len() > 15 {
        return Err(ValidationError::TooLong {
            field: "customer number".to_string(),
            max: 15,
        });
    }

    Ok(())
}

/// Validates a short inventory label (costume category, size, locker number,
/// ticket name).
pub fn validate_label(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > 60 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 60,
        });
    }

    Ok(())
}

/// Validates a history search keyword.
///
/// ## Returns
/// The trimmed keyword.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a ticket or costume quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock adjustment or opening stock level (may be zero).
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

/// Validates a money amount that may be zero but not negative
/// (prices, refund values, tender).
///
/// ## Example
/// ```rust
/// use splash_core::money::Money;
/// use splash_core::validation::validate_non_negative_amount;
///
/// assert!(validate_non_negative_amount("price", Money::from_paise(0)).is_ok());
/// assert!(validate_non_negative_amount("price", Money::from_paise(-100)).is_err());
/// ```
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tender amount (cash or online).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_TENDER_PAISE (₹1 crore)
pub fn validate_tender(field: &str, amount: Money) -> ValidationResult<()> {
    validate_non_negative_amount(field, amount)?;

    if amount.paise() > MAX_TENDER_PAISE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_TENDER_PAISE,
        });
    }
    Ok(())
}

/// Validates a rate in basis points (0% to 100%).
pub fn validate_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "rate".to_string(),
            min: 0,
            max: 10000,
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates how many lines a cart has.
///
/// ## Rules
/// - At least one ticket, locker or costume line
/// - At most MAX_CART_LINES (100)
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "line items".to_string(),
        });
    }

    if lines > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "line items".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates a history date range (inclusive on both ends).
pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::InvalidFormat {
            field: "date range".to_string(),
            reason: format!("start {} is after end {}", from, to),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
