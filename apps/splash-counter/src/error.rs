//! # API Error Type
//!
//! Unified error type for counter commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Splash POS                             │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  EngineError ── Unauthorized, LockerUnavailable, ... ──┐               │
//! │  DbError ────── history / inventory reads ─────────────┤               │
//! │  ValidationError ── dates, search keywords ────────────┼──► ApiError   │
//! │  ConfigError ── startup ───────────────────────────────┘               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CommandResponse { success: false, error: { code, message } }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use splash_core::ValidationError;
use splash_db::DbError;
use splash_engine::{AuthError, EngineError};

use crate::state::ConfigError;

/// Error returned from counter commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "LOCKER_UNAVAILABLE",
///   "message": "Locker L-014 is not available"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing, expired or forged access token
    Unauthorized,

    /// Input validation failed, including a tender that does not match
    ValidationError,

    /// Resource not found
    NotFound,

    /// Not enough costumes on the shelf
    InsufficientStock,

    /// Locker already occupied
    LockerUnavailable,

    /// Concurrent modification; the cashier may retry
    Conflict,

    /// Nothing left to refund
    AlreadyReturned,

    /// The bill was not saved; inventory was restored
    PersistenceError,

    /// The bill was not saved and inventory could not be restored
    InventoryDrift,

    /// Database operation failed
    DatabaseError,

    /// Bad startup configuration
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts engine errors to API errors.
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::Unauthorized(_) => ApiError::new(ErrorCode::Unauthorized, message),
            EngineError::Validation(_) => ApiError::new(ErrorCode::ValidationError, message),
            EngineError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, message),
            EngineError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            EngineError::LockerUnavailable { .. } => {
                ApiError::new(ErrorCode::LockerUnavailable, message)
            }
            EngineError::Conflict { .. } => ApiError::new(ErrorCode::Conflict, message),
            EngineError::AlreadyReturned { .. } => {
                ApiError::new(ErrorCode::AlreadyReturned, message)
            }
            EngineError::Persistence(_) => ApiError::new(ErrorCode::PersistenceError, message),
            EngineError::InventoryDrift { .. } => {
                tracing::error!("{}", message);
                ApiError::new(ErrorCode::InventoryDrift, message)
            }
            EngineError::Database(e) => ApiError::from(e),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let message = err.to_string();
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::Conflict { .. } => ApiError::new(ErrorCode::Conflict, message),
            DbError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            DbError::LockerUnavailable { .. } => {
                ApiError::new(ErrorCode::LockerUnavailable, message)
            }
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ConstraintViolation { message } => {
                tracing::error!("Constraint violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference or value")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::QueryFailed(e) | DbError::Serialization(e) | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::new(ErrorCode::Unauthorized, err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// What every command prints.
///
/// ```json
/// { "success": true,  "data": { ... } }
/// { "success": false, "error": { "code": "NOT_FOUND", "message": "..." } }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> From<Result<T, ApiError>> for CommandResponse<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => CommandResponse {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(error) => CommandResponse {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}
