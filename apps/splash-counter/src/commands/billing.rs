//! # Billing Commands

use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use splash_core::{CartRequest, UnifiedBill};

/// Sells a cart and returns the stored bill.
pub async fn create_unified_billing(
    state: &AppState,
    token: &str,
    cart: &CartRequest,
) -> Result<UnifiedBill, ApiError> {
    debug!(
        customer_number = %cart.customer_number,
        lines = cart.line_count(),
        "create_unified_billing command"
    );

    let bill = state.billing.create_unified_billing(token, cart).await?;
    Ok(bill)
}
