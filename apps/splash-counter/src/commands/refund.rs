//! # Refund Commands

use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use splash_core::RefundSelection;
use splash_engine::{RefundOutcome, RefundQuote};

/// Returns the selected lockers and costumes of a bill, or everything still
/// out when `selection` is `None`.
pub async fn refund_unified_billing(
    state: &AppState,
    token: &str,
    bill_id: &str,
    selection: Option<RefundSelection>,
) -> Result<RefundOutcome, ApiError> {
    debug!(bill_id = %bill_id, ?selection, "refund_unified_billing command");

    let bill_id = bill_id.trim();
    if bill_id.is_empty() {
        return Err(ApiError::validation("bill id is required"));
    }

    let outcome = state
        .refunds
        .refund_unified_billing(token, bill_id, selection.as_ref())
        .await?;
    Ok(outcome)
}

/// The customer's most recent bill with refunds priced as of now.
///
/// `Ok(None)` when the number has never been billed.
pub async fn get_last_unified_billing_by_customer_phone(
    state: &AppState,
    phone: &str,
) -> Result<Option<RefundQuote>, ApiError> {
    debug!(phone = %phone, "get_last_unified_billing_by_customer_phone command");

    let quote = state.refunds.lookup_last_bill(phone).await?;
    Ok(quote)
}
