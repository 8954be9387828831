//! # History Commands
//!
//! Read-only views over the bill ledger. Dates are facility-local calendar
//! days, matching each bill's `bill_date`.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use splash_core::validation::{validate_date_range, validate_search_query};
use splash_core::{BillSummary, Money, UnifiedBill};

/// Default and maximum page size for `search_bills`.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;
pub const MAX_SEARCH_LIMIT: u32 = 500;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryResponse {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub summary: BillSummary,
    /// Takings after refunds paid out.
    pub net_takings: Money,
}

/// Bills dated `from..=to`, newest first.
pub async fn bill_history(
    state: &AppState,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<UnifiedBill>, ApiError> {
    debug!(%from, %to, "bill_history command");

    validate_date_range(from, to)?;
    let bills = state.db.history().list_by_date_range(from, to).await?;
    Ok(bills)
}

/// Bills whose customer name, number or bill number contains `keyword`.
pub async fn search_bills(
    state: &AppState,
    keyword: &str,
    limit: Option<u32>,
) -> Result<Vec<UnifiedBill>, ApiError> {
    debug!(keyword = %keyword, ?limit, "search_bills command");

    let keyword = validate_search_query(keyword)?;
    let limit = limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let bills = state.db.history().search(&keyword, limit).await?;
    Ok(bills)
}

/// Totals for one facility day.
pub async fn daily_summary(
    state: &AppState,
    date: NaiveDate,
) -> Result<DailySummaryResponse, ApiError> {
    debug!(%date, "daily_summary command");

    let summary = state.db.history().summarize(date, date).await?;
    Ok(DailySummaryResponse {
        date,
        net_takings: summary.net_takings(),
        summary,
    })
}
