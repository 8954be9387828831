//! # Bill Ledger Repository
//!
//! Append-only storage for unified bills.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bill Lifecycle                                    │
//! │                                                                         │
//! │  1. APPEND (billing engine, after stock is reserved)                   │
//! │     └── append() → INSERT unified_bills + INSERT sync_outbox           │
//! │                                                                         │
//! │  2. REFUND, zero or more times (refund engine, inside its transaction) │
//! │     └── record_refund_tx() → line flags, refund_amount, is_returned    │
//! │         guarded on the lines it read, + INSERT sync_outbox             │
//! │                                                                         │
//! │  Never deleted.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line items are stored as JSON arrays in `tickets`, `lockers`, `costumes`.

use chrono::{DateTime, FixedOffset};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::sync::{SyncOutboxRepository, ENTITY_BILL};
use splash_core::{DiscountType, Money, UnifiedBill};

pub(crate) const BILL_COLUMNS: &str = "id, bill_no, customer_name, customer_number, \
     tickets, lockers, costumes, discount, discount_type, cash_paid, online_paid, \
     subtotal, discount_amount, gst_amount, total, is_returned, refund_amount, \
     bill_date, created_by, created_at, updated_at, updated_by";

// =============================================================================
// Row Mapping
// =============================================================================

/// `unified_bills` as stored: JSON line items and RFC 3339 timestamps.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BillRow {
    id: String,
    bill_no: String,
    customer_name: String,
    customer_number: String,
    tickets: String,
    lockers: String,
    costumes: String,
    discount: i64,
    discount_type: String,
    cash_paid: Money,
    online_paid: Money,
    subtotal: Money,
    discount_amount: Money,
    gst_amount: Money,
    total: Money,
    is_returned: bool,
    refund_amount: Money,
    bill_date: String,
    created_by: String,
    created_at: String,
    updated_at: String,
    updated_by: String,
}

impl TryFrom<BillRow> for UnifiedBill {
    type Error = DbError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let discount_type: DiscountType = row
            .discount_type
            .parse()
            .map_err(|e: splash_core::ValidationError| DbError::Serialization(e.to_string()))?;

        Ok(UnifiedBill {
            tickets: serde_json::from_str(&row.tickets)?,
            lockers: serde_json::from_str(&row.lockers)?,
            costumes: serde_json::from_str(&row.costumes)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            bill_no: row.bill_no,
            customer_name: row.customer_name,
            customer_number: row.customer_number,
            discount: row.discount,
            discount_type,
            cash_paid: row.cash_paid,
            online_paid: row.online_paid,
            subtotal: row.subtotal,
            discount_amount: row.discount_amount,
            gst_amount: row.gst_amount,
            total: row.total,
            is_returned: row.is_returned,
            refund_amount: row.refund_amount,
            bill_date: row.bill_date,
            created_by: row.created_by,
            updated_by: row.updated_by,
        })
    }
}

fn parse_timestamp(value: &str) -> DbResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| DbError::Serialization(format!("bad timestamp '{}': {}", value, e)))
}

/// Maps fetched rows, failing on the first row that does not decode.
pub(crate) fn into_bills(rows: Vec<BillRow>) -> DbResult<Vec<UnifiedBill>> {
    rows.into_iter().map(UnifiedBill::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the unified bill ledger.
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: SqlitePool,
}

impl BillingRepository {
    /// Creates a new BillingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillingRepository { pool }
    }

    /// Gets a bill by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<UnifiedBill>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_tx(&mut conn, id).await
    }

    /// Gets a bill by ID on the caller's connection.
    pub async fn get_by_id_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<UnifiedBill>> {
        let sql = format!("SELECT {} FROM unified_bills WHERE id = ?1", BILL_COLUMNS);
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(UnifiedBill::try_from).transpose()
    }

    /// Appends a new bill and its outbox entry in one transaction.
    ///
    /// ## Errors
    /// Any failure rolls both rows back; the caller still holds the
    /// inventory reservations and must compensate them.
    pub async fn append(&self, bill: &UnifiedBill) -> DbResult<()> {
        debug!(id = %bill.id, bill_no = %bill.bill_no, total = %bill.total, "Appending bill");

        let payload = serde_json::to_string(bill)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            r#"
            INSERT INTO unified_bills ({}, created_epoch_ms)
            VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22,
                ?23
            )
            "#,
            BILL_COLUMNS
        ))
        .bind(&bill.id)
        .bind(&bill.bill_no)
        .bind(&bill.customer_name)
        .bind(&bill.customer_number)
        .bind(serde_json::to_string(&bill.tickets)?)
        .bind(serde_json::to_string(&bill.lockers)?)
        .bind(serde_json::to_string(&bill.costumes)?)
        .bind(bill.discount)
        .bind(bill.discount_type.as_str())
        .bind(bill.cash_paid)
        .bind(bill.online_paid)
        .bind(bill.subtotal)
        .bind(bill.discount_amount)
        .bind(bill.gst_amount)
        .bind(bill.total)
        .bind(bill.is_returned)
        .bind(bill.refund_amount)
        .bind(&bill.bill_date)
        .bind(&bill.created_by)
        .bind(bill.created_at.to_rfc3339())
        .bind(bill.updated_at.to_rfc3339())
        .bind(&bill.updated_by)
        .bind(bill.created_at.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        SyncOutboxRepository::queue_for_sync_tx(&mut tx, ENTITY_BILL, &bill.id, &payload).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Writes a refund onto a bill, on the caller's connection.
    ///
    /// `before` is the bill as the caller read it inside the same transaction;
    /// `after` carries the new returned flags, `refund_amount`, `is_returned`,
    /// `updated_at` and `updated_by`. The update only applies while the stored
    /// lines still match `before`, so two refunds racing on one bill cannot
    /// both pay out.
    ///
    /// ## Returns
    /// * `Err(Conflict)` - The bill changed since `before` was read
    pub async fn record_refund_tx(
        conn: &mut SqliteConnection,
        before: &UnifiedBill,
        after: &UnifiedBill,
    ) -> DbResult<()> {
        debug!(
            id = %after.id,
            refund_amount = %after.refund_amount,
            is_returned = after.is_returned,
            "Recording refund"
        );

        let result = sqlx::query(
            r#"
            UPDATE unified_bills SET
                lockers = ?1,
                costumes = ?2,
                is_returned = ?3,
                refund_amount = ?4,
                updated_at = ?5,
                updated_by = ?6
            WHERE id = ?7
              AND is_returned = 0
              AND lockers = ?8
              AND costumes = ?9
              AND refund_amount = ?10
            "#,
        )
        .bind(serde_json::to_string(&after.lockers)?)
        .bind(serde_json::to_string(&after.costumes)?)
        .bind(after.is_returned)
        .bind(after.refund_amount)
        .bind(after.updated_at.to_rfc3339())
        .bind(&after.updated_by)
        .bind(&after.id)
        .bind(serde_json::to_string(&before.lockers)?)
        .bind(serde_json::to_string(&before.costumes)?)
        .bind(before.refund_amount)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Bill", &after.id));
        }

        let payload = serde_json::to_string(after)?;
        SyncOutboxRepository::queue_for_sync_tx(conn, ENTITY_BILL, &after.id, &payload).await?;

        Ok(())
    }

    /// Counts all bills in the ledger.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM unified_bills")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
