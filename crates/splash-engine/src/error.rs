//! # Engine Errors
//!
//! What `create_unified_billing`, `refund_unified_billing` and the bill
//! lookup return to their callers.
//!
//! ## Mapping From Lower Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AuthError                          → Unauthorized                      │
//! │  ValidationError                    → Validation                        │
//! │  CoreError::PaymentMismatch         → Validation                        │
//! │  CoreError / DbError::InsufficientStock → InsufficientStock             │
//! │  CoreError / DbError::LockerUnavailable → LockerUnavailable             │
//! │  DbError::NotFound                  → NotFound                          │
//! │  DbError::Conflict                  → Conflict (after retries)          │
//! │  any other DbError                  → Database                          │
//! │                                                                         │
//! │  Raised by the engines themselves:                                     │
//! │  AlreadyReturned, Persistence, InventoryDrift                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::claims::AuthError;
use crate::retry::Retryable;
use splash_core::{CoreError, ValidationError};
use splash_db::DbError;

/// Billing and refund engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The access token did not decode to an actor.
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// The request is malformed or the tender does not match the total.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    #[error("Locker {locker_no} is not available")]
    LockerUnavailable { locker_no: String },

    /// Conflicting writes kept winning after every retry.
    #[error("{entity} {id} is being modified concurrently, please retry")]
    Conflict { entity: String, id: String },

    /// Nothing left to return on this bill, or the selected lines are all
    /// back already.
    #[error("Bill {bill_id} has already been returned")]
    AlreadyReturned { bill_id: String },

    /// The bill could not be written; every reservation was rolled back.
    #[error("Bill could not be saved, inventory restored: {0}")]
    Persistence(String),

    /// The bill could not be written AND some reservations could not be
    /// rolled back. Stock no longer matches the ledger for `items`.
    #[error("Bill {bill_id} could not be saved and inventory drifted for: {}", .items.join(", "))]
    InventoryDrift { bill_id: String, items: Vec<String> },

    #[error("Database error: {0}")]
    Database(DbError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl Retryable for EngineError {
    fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Conflict { .. })
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                item,
                available,
                requested,
            } => EngineError::InsufficientStock {
                item,
                available,
                requested,
            },
            CoreError::LockerUnavailable { locker_no } => {
                EngineError::LockerUnavailable { locker_no }
            }
            CoreError::PaymentMismatch { .. } => EngineError::Validation(err.to_string()),
            CoreError::Validation(e) => EngineError::Validation(e.to_string()),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::Conflict { entity, id } => EngineError::Conflict { entity, id },
            DbError::InsufficientStock {
                item,
                available,
                requested,
            } => EngineError::InsufficientStock {
                item,
                available,
                requested,
            },
            DbError::LockerUnavailable { locker_no } => {
                EngineError::LockerUnavailable { locker_no }
            }
            other => EngineError::Database(other),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
