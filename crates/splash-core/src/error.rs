//! # Error Types
//!
//! Domain-specific error types for splash-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  splash-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input shape failures                           │
//! │                                                                         │
//! │  splash-db errors                                                      │
//! │  └── DbError          - Storage failures, CAS conflicts                │
//! │                                                                         │
//! │  splash-engine errors                                                  │
//! │  └── EngineError      - What create/refund return                      │
//! │                                                                         │
//! │  splash-counter errors                                                 │
//! │  └── ApiError         - What the UI sees (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations detected without touching storage.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough costumes on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: 3 × Swimsuit (M)
    ///      │
    ///      ▼
    /// Check stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Swimsuit (M)", available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 Swimsuit (M) available"
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// Locker is already rented out (or withdrawn).
    #[error("Locker {locker_no} is not available")]
    LockerUnavailable { locker_no: String },

    /// Tender does not add up to the bill total.
    #[error("Payment mismatch: total {total}, paid {paid}")]
    PaymentMismatch { total: Money, paid: Money },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs; never accompanied by a mutation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The same item appears twice where only one is allowed.
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },

    /// A refund selection names something that is not on the bill.
    #[error("{field} '{value}' is not part of this bill")]
    NotOnBill { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
