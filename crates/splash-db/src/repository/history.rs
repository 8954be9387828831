//! # History Repository
//!
//! Read-only views over the bill ledger for the counter's history screen and
//! the return desk. Nothing here writes.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::billing::{into_bills, BillRow, BILL_COLUMNS};
use splash_core::{BillSummary, UnifiedBill};

/// Repository for ledger queries.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    /// Creates a new HistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRepository { pool }
    }

    /// Bills whose facility-local `bill_date` falls in `[from, to]`, newest first.
    pub async fn list_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<UnifiedBill>> {
        debug!(%from, %to, "Listing bills by date");

        let sql = format!(
            r#"
            SELECT {} FROM unified_bills
            WHERE bill_date >= ?1 AND bill_date <= ?2
            ORDER BY created_epoch_ms DESC, rowid DESC
            "#,
            BILL_COLUMNS
        );

        let rows = sqlx::query_as::<_, BillRow>(&sql)
            .bind(from.format("%Y-%m-%d").to_string())
            .bind(to.format("%Y-%m-%d").to_string())
            .fetch_all(&self.pool)
            .await?;

        into_bills(rows)
    }

    /// Bills whose customer name, customer number or bill number contains
    /// `keyword`, newest first.
    ///
    /// An empty keyword returns the most recent bills.
    pub async fn search(&self, keyword: &str, limit: u32) -> DbResult<Vec<UnifiedBill>> {
        let keyword = keyword.trim();
        debug!(keyword = %keyword, limit = limit, "Searching bills");

        let pattern = format!("%{}%", escape_like(keyword));
        let sql = format!(
            r#"
            SELECT {} FROM unified_bills
            WHERE customer_name LIKE ?1 ESCAPE '\'
               OR customer_number LIKE ?1 ESCAPE '\'
               OR bill_no LIKE ?1 ESCAPE '\'
            ORDER BY created_epoch_ms DESC, rowid DESC
            LIMIT ?2
            "#,
            BILL_COLUMNS
        );

        let rows = sqlx::query_as::<_, BillRow>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        into_bills(rows)
    }

    /// The most recent bill for a customer phone number.
    pub async fn last_by_customer_number(&self, phone: &str) -> DbResult<Option<UnifiedBill>> {
        let phone = phone.trim();
        debug!(phone = %phone, "Looking up last bill");

        let sql = format!(
            r#"
            SELECT {} FROM unified_bills
            WHERE customer_number = ?1
            ORDER BY created_epoch_ms DESC, rowid DESC
            LIMIT 1
            "#,
            BILL_COLUMNS
        );

        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UnifiedBill::try_from).transpose()
    }

    /// Totals over the bills dated in `[from, to]`.
    pub async fn summarize(&self, from: NaiveDate, to: NaiveDate) -> DbResult<BillSummary> {
        let summary = sqlx::query_as::<_, BillSummary>(
            r#"
            SELECT
                COUNT(*)                                  AS bill_count,
                COALESCE(SUM(is_returned), 0)             AS returned_count,
                COALESCE(SUM(subtotal), 0)                AS subtotal,
                COALESCE(SUM(discount_amount), 0)         AS discount_amount,
                COALESCE(SUM(gst_amount), 0)              AS gst_amount,
                COALESCE(SUM(total), 0)                   AS total,
                COALESCE(SUM(cash_paid), 0)               AS cash_paid,
                COALESCE(SUM(online_paid), 0)             AS online_paid,
                COALESCE(SUM(refund_amount), 0)           AS refund_amount
            FROM unified_bills
            WHERE bill_date >= ?1 AND bill_date <= ?2
            "#,
        )
        .bind(from.format("%Y-%m-%d").to_string())
        .bind(to.format("%Y-%m-%d").to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}

/// Escapes `%`, `_` and `\` for a LIKE pattern with `ESCAPE '\'`.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("asha"), "asha");
    }
}
