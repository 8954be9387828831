//! # Inventory Repository
//!
//! Costume stock and locker occupancy, with optimistic concurrency.
//!
//! ## Compare-and-Set Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  adjust_quantity(costume_id, delta, expected_revision)                  │
//! │                                                                         │
//! │  UPDATE costumes                                                       │
//! │     SET quantity_available = quantity_available + delta,              │
//! │         revision = revision + 1                                        │
//! │   WHERE id = ?                                                         │
//! │     AND revision = expected_revision          ◄── nobody wrote since   │
//! │     AND quantity_available + delta >= 0       ◄── never below zero     │
//! │  RETURNING *                                                           │
//! │       │                                                                 │
//! │       ├── row returned  → Ok(updated costume)                          │
//! │       │                                                                 │
//! │       └── no row        → re-read and classify:                        │
//! │              missing                 → NotFound                        │
//! │              revision moved          → Conflict                        │
//! │              quantity + delta < 0    → InsufficientStock               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lockers follow the same shape with `status` instead of a quantity:
//! `available → occupied` only succeeds while the locker is still available.
//!
//! Every write has a `*_tx` twin taking a `&mut SqliteConnection` so the
//! refund engine can run several of them inside one transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use splash_core::{Costume, Locker, LockerStatus, Money};

const COSTUME_COLUMNS: &str = "id, category, size, quantity_available, unit_price, \
     unit_refund_value, revision, is_deleted, created_at, updated_at";

const LOCKER_COLUMNS: &str = "id, locker_no, status, unit_price, unit_refund_value, \
     revision, is_deleted, created_at, updated_at";

/// A costume line to add to stock.
#[derive(Debug, Clone)]
pub struct NewCostume {
    pub category: String,
    pub size: String,
    pub quantity_available: i64,
    pub unit_price: Money,
    pub unit_refund_value: Money,
}

/// A locker to bring into service.
#[derive(Debug, Clone)]
pub struct NewLocker {
    pub locker_no: String,
    pub unit_price: Money,
    pub unit_refund_value: Money,
}

/// Repository for costume and locker inventory.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // =========================================================================
    // Costumes
    // =========================================================================

    /// Gets a live (not soft-deleted) costume.
    pub async fn find_costume(&self, id: &str) -> DbResult<Costume> {
        let mut conn = self.pool.acquire().await?;
        Self::find_costume_tx(&mut conn, id).await
    }

    /// Gets a live costume on the caller's connection.
    pub async fn find_costume_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Costume> {
        let sql = format!(
            "SELECT {} FROM costumes WHERE id = ?1 AND is_deleted = 0",
            COSTUME_COLUMNS
        );
        sqlx::query_as::<_, Costume>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Costume", id))
    }

    /// Pool-level [`find_costume_for_return_tx`](Self::find_costume_for_return_tx).
    pub async fn find_costume_for_return(&self, id: &str) -> DbResult<Costume> {
        let mut conn = self.pool.acquire().await?;
        Self::find_costume_for_return_tx(&mut conn, id).await
    }

    /// Gets a costume even if it has been withdrawn from sale.
    ///
    /// Rented units of a withdrawn costume still come back and are still
    /// refunded at its current refund value.
    pub async fn find_costume_for_return_tx(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Costume> {
        let sql = format!("SELECT {} FROM costumes WHERE id = ?1", COSTUME_COLUMNS);
        sqlx::query_as::<_, Costume>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Costume", id))
    }

    /// Lists live costumes, by category then size.
    pub async fn list_costumes(&self) -> DbResult<Vec<Costume>> {
        let sql = format!(
            "SELECT {} FROM costumes WHERE is_deleted = 0 ORDER BY category, size",
            COSTUME_COLUMNS
        );
        let costumes = sqlx::query_as::<_, Costume>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(costumes)
    }

    /// Adds a costume category/size to stock.
    pub async fn insert_costume(&self, new: &NewCostume) -> DbResult<Costume> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, category = %new.category, size = %new.size, "Inserting costume");

        let sql = format!(
            r#"
            INSERT INTO costumes (
                id, category, size, quantity_available,
                unit_price, unit_refund_value, revision, is_deleted,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, ?7, ?7)
            RETURNING {}
            "#,
            COSTUME_COLUMNS
        );

        let costume = sqlx::query_as::<_, Costume>(&sql)
            .bind(&id)
            .bind(new.category.trim())
            .bind(new.size.trim())
            .bind(new.quantity_available)
            .bind(new.unit_price)
            .bind(new.unit_refund_value)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => {
                    DbError::duplicate("costume", format!("{} ({})", new.category, new.size))
                }
                other => other,
            })?;

        Ok(costume)
    }

    /// Compare-and-set stock change.
    ///
    /// ## Returns
    /// * `Ok(Costume)` - The costume after the change, revision bumped
    /// * `Err(Conflict)` - `expected_revision` is stale
    /// * `Err(InsufficientStock)` - The change would go below zero
    /// * `Err(NotFound)` - No such costume
    pub async fn adjust_quantity(
        &self,
        costume_id: &str,
        delta: i64,
        expected_revision: i64,
    ) -> DbResult<Costume> {
        let mut conn = self.pool.acquire().await?;
        Self::adjust_quantity_tx(&mut conn, costume_id, delta, expected_revision).await
    }

    /// [`adjust_quantity`](Self::adjust_quantity) on the caller's connection.
    ///
    /// Returning stock to a soft-deleted costume is allowed so compensation
    /// and refunds still balance after a costume is withdrawn.
    pub async fn adjust_quantity_tx(
        conn: &mut SqliteConnection,
        costume_id: &str,
        delta: i64,
        expected_revision: i64,
    ) -> DbResult<Costume> {
        debug!(
            costume_id = %costume_id,
            delta = delta,
            expected_revision = expected_revision,
            "Adjusting costume stock"
        );

        let sql = format!(
            r#"
            UPDATE costumes SET
                quantity_available = quantity_available + ?1,
                revision = revision + 1,
                updated_at = ?2
            WHERE id = ?3
              AND revision = ?4
              AND quantity_available + ?1 >= 0
              AND (is_deleted = 0 OR ?1 >= 0)
            RETURNING {}
            "#,
            COSTUME_COLUMNS
        );

        let updated = sqlx::query_as::<_, Costume>(&sql)
            .bind(delta)
            .bind(Utc::now())
            .bind(costume_id)
            .bind(expected_revision)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(costume) = updated {
            return Ok(costume);
        }

        // Nothing matched: find out which guard failed.
        let sql = format!("SELECT {} FROM costumes WHERE id = ?1", COSTUME_COLUMNS);
        let current = sqlx::query_as::<_, Costume>(&sql)
            .bind(costume_id)
            .fetch_optional(&mut *conn)
            .await?;

        match current {
            None => Err(DbError::not_found("Costume", costume_id)),
            Some(c) if c.is_deleted && delta < 0 => Err(DbError::not_found("Costume", costume_id)),
            Some(c) if c.revision != expected_revision => {
                Err(DbError::conflict("Costume", costume_id))
            }
            Some(c) if c.quantity_available + delta < 0 => Err(DbError::InsufficientStock {
                item: c.label(),
                available: c.quantity_available,
                requested: -delta,
            }),
            Some(_) => Err(DbError::conflict("Costume", costume_id)),
        }
    }

    /// Adds `quantity` units to a costume at its current revision.
    pub async fn restock_costume(&self, costume_id: &str, quantity: i64) -> DbResult<Costume> {
        let mut conn = self.pool.acquire().await?;
        let current = Self::find_costume_tx(&mut conn, costume_id).await?;
        Self::adjust_quantity_tx(&mut conn, costume_id, quantity, current.revision).await
    }

    /// Changes a costume's rental price and refund value.
    ///
    /// Bills already issued keep the price they were sold at; refunds pick
    /// up the new refund value.
    pub async fn set_costume_prices(
        &self,
        costume_id: &str,
        unit_price: Money,
        unit_refund_value: Money,
    ) -> DbResult<Costume> {
        debug!(costume_id = %costume_id, %unit_price, %unit_refund_value, "Repricing costume");

        let sql = format!(
            r#"
            UPDATE costumes SET
                unit_price = ?1,
                unit_refund_value = ?2,
                revision = revision + 1,
                updated_at = ?3
            WHERE id = ?4 AND is_deleted = 0
            RETURNING {}
            "#,
            COSTUME_COLUMNS
        );

        sqlx::query_as::<_, Costume>(&sql)
            .bind(unit_price)
            .bind(unit_refund_value)
            .bind(Utc::now())
            .bind(costume_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Costume", costume_id))
    }

    /// Withdraws a costume from sale.
    pub async fn soft_delete_costume(&self, costume_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE costumes SET
                is_deleted = 1,
                revision = revision + 1,
                updated_at = ?2
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(costume_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Costume", costume_id));
        }

        Ok(())
    }

    // =========================================================================
    // Lockers
    // =========================================================================

    /// Gets a live (not soft-deleted) locker.
    pub async fn find_locker(&self, id: &str) -> DbResult<Locker> {
        let mut conn = self.pool.acquire().await?;
        Self::find_locker_tx(&mut conn, id).await
    }

    /// Gets a live locker on the caller's connection.
    pub async fn find_locker_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Locker> {
        let sql = format!(
            "SELECT {} FROM lockers WHERE id = ?1 AND is_deleted = 0",
            LOCKER_COLUMNS
        );
        sqlx::query_as::<_, Locker>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Locker", id))
    }

    /// Lists live lockers by number, optionally only those with `status`.
    pub async fn list_lockers(&self, status: Option<LockerStatus>) -> DbResult<Vec<Locker>> {
        let lockers = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM lockers WHERE is_deleted = 0 AND status = ?1 ORDER BY locker_no",
                    LOCKER_COLUMNS
                );
                sqlx::query_as::<_, Locker>(&sql)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM lockers WHERE is_deleted = 0 ORDER BY locker_no",
                    LOCKER_COLUMNS
                );
                sqlx::query_as::<_, Locker>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(lockers)
    }

    /// Brings a locker into service, available.
    pub async fn insert_locker(&self, new: &NewLocker) -> DbResult<Locker> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, locker_no = %new.locker_no, "Inserting locker");

        let sql = format!(
            r#"
            INSERT INTO lockers (
                id, locker_no, status, unit_price, unit_refund_value,
                revision, is_deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6, ?6)
            RETURNING {}
            "#,
            LOCKER_COLUMNS
        );

        let locker = sqlx::query_as::<_, Locker>(&sql)
            .bind(&id)
            .bind(new.locker_no.trim())
            .bind(LockerStatus::Available)
            .bind(new.unit_price)
            .bind(new.unit_refund_value)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("locker", &new.locker_no),
                other => other,
            })?;

        Ok(locker)
    }

    /// Compare-and-set locker status change.
    ///
    /// ## Returns
    /// * `Ok(Locker)` - The locker after the change, revision bumped
    /// * `Err(Conflict)` - `expected_revision` is stale
    /// * `Err(LockerUnavailable)` - Occupying a locker that is not available
    /// * `Err(NotFound)` - No such locker
    pub async fn set_locker_status(
        &self,
        locker_id: &str,
        status: LockerStatus,
        expected_revision: i64,
    ) -> DbResult<Locker> {
        let mut conn = self.pool.acquire().await?;
        Self::set_locker_status_tx(&mut conn, locker_id, status, expected_revision).await
    }

    /// [`set_locker_status`](Self::set_locker_status) on the caller's connection.
    pub async fn set_locker_status_tx(
        conn: &mut SqliteConnection,
        locker_id: &str,
        status: LockerStatus,
        expected_revision: i64,
    ) -> DbResult<Locker> {
        debug!(
            locker_id = %locker_id,
            status = %status,
            expected_revision = expected_revision,
            "Setting locker status"
        );

        let sql = format!(
            r#"
            UPDATE lockers SET
                status = ?1,
                revision = revision + 1,
                updated_at = ?2
            WHERE id = ?3
              AND revision = ?4
              AND (?1 <> 'occupied' OR (status = 'available' AND is_deleted = 0))
            RETURNING {}
            "#,
            LOCKER_COLUMNS
        );

        let updated = sqlx::query_as::<_, Locker>(&sql)
            .bind(status)
            .bind(Utc::now())
            .bind(locker_id)
            .bind(expected_revision)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(locker) = updated {
            return Ok(locker);
        }

        let sql = format!("SELECT {} FROM lockers WHERE id = ?1", LOCKER_COLUMNS);
        let current = sqlx::query_as::<_, Locker>(&sql)
            .bind(locker_id)
            .fetch_optional(&mut *conn)
            .await?;

        match current {
            None => Err(DbError::not_found("Locker", locker_id)),
            Some(l) if l.revision != expected_revision => {
                Err(DbError::conflict("Locker", locker_id))
            }
            Some(l) if l.is_deleted => Err(DbError::not_found("Locker", locker_id)),
            Some(l) => Err(DbError::LockerUnavailable {
                locker_no: l.locker_no,
            }),
        }
    }

    /// Changes a locker's rental price and refund value.
    pub async fn set_locker_prices(
        &self,
        locker_id: &str,
        unit_price: Money,
        unit_refund_value: Money,
    ) -> DbResult<Locker> {
        debug!(locker_id = %locker_id, %unit_price, %unit_refund_value, "Repricing locker");

        let sql = format!(
            r#"
            UPDATE lockers SET
                unit_price = ?1,
                unit_refund_value = ?2,
                revision = revision + 1,
                updated_at = ?3
            WHERE id = ?4 AND is_deleted = 0
            RETURNING {}
            "#,
            LOCKER_COLUMNS
        );

        sqlx::query_as::<_, Locker>(&sql)
            .bind(unit_price)
            .bind(unit_refund_value)
            .bind(Utc::now())
            .bind(locker_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Locker", locker_id))
    }

    /// Takes a locker out of service. Occupied lockers cannot be withdrawn.
    pub async fn soft_delete_locker(&self, locker_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE lockers SET
                is_deleted = 1,
                revision = revision + 1,
                updated_at = ?2
            WHERE id = ?1 AND is_deleted = 0 AND status = 'available'
            "#,
        )
        .bind(locker_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let locker = self.find_locker(locker_id).await?;
            return Err(DbError::LockerUnavailable {
                locker_no: locker.locker_no,
            });
        }

        Ok(())
    }

    /// Total units on the shelf across live costumes.
    pub async fn total_costume_stock(&self) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_available), 0) FROM costumes WHERE is_deleted = 0",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> (Database, Costume, Locker) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let costume = db
            .inventory()
            .insert_costume(&NewCostume {
                category: "Swimsuit".to_string(),
                size: "M".to_string(),
                quantity_available: 5,
                unit_price: Money::from_paise(15_000),
                unit_refund_value: Money::from_paise(5_000),
            })
            .await
            .unwrap();
        let locker = db
            .inventory()
            .insert_locker(&NewLocker {
                locker_no: "L-001".to_string(),
                unit_price: Money::from_paise(10_000),
                unit_refund_value: Money::from_paise(8_000),
            })
            .await
            .unwrap();
        (db, costume, locker)
    }

    #[tokio::test]
    async fn test_adjust_quantity_bumps_revision() {
        let (db, costume, _) = setup().await;

        let updated = db
            .inventory()
            .adjust_quantity(&costume.id, -2, costume.revision)
            .await
            .unwrap();

        assert_eq!(updated.quantity_available, 3);
        assert_eq!(updated.revision, costume.revision + 1);
    }

    #[tokio::test]
    async fn test_stale_revision_is_conflict() {
        let (db, costume, _) = setup().await;
        let repo = db.inventory();

        repo.adjust_quantity(&costume.id, -1, costume.revision)
            .await
            .unwrap();
        let err = repo
            .adjust_quantity(&costume.id, -1, costume.revision)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(repo.find_costume(&costume.id).await.unwrap().quantity_available, 4);
    }

    #[tokio::test]
    async fn test_oversell_is_insufficient_stock() {
        let (db, costume, _) = setup().await;

        let err = db
            .inventory()
            .adjust_quantity(&costume.id, -6, costume.revision)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::InsufficientStock { available: 5, requested: 6, .. }
        ));
        let after = db.inventory().find_costume(&costume.id).await.unwrap();
        assert_eq!(after.quantity_available, 5);
        assert_eq!(after.revision, costume.revision);
    }

    #[tokio::test]
    async fn test_missing_costume_is_not_found() {
        let (db, _, _) = setup().await;
        let err = db.inventory().adjust_quantity("nope", -1, 0).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_locker_occupy_and_release() {
        let (db, _, locker) = setup().await;
        let repo = db.inventory();

        let occupied = repo
            .set_locker_status(&locker.id, LockerStatus::Occupied, locker.revision)
            .await
            .unwrap();
        assert_eq!(occupied.status, LockerStatus::Occupied);

        let err = repo
            .set_locker_status(&locker.id, LockerStatus::Occupied, occupied.revision)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::LockerUnavailable { .. }));

        let released = repo
            .set_locker_status(&locker.id, LockerStatus::Available, occupied.revision)
            .await
            .unwrap();
        assert!(released.is_available());
        assert_eq!(repo.list_lockers(Some(LockerStatus::Available)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_locker_number_rejected() {
        let (db, _, _) = setup().await;
        let err = db
            .inventory()
            .insert_locker(&NewLocker {
                locker_no: "L-001".to_string(),
                unit_price: Money::from_paise(10_000),
                unit_refund_value: Money::zero(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_occupied_locker_cannot_be_withdrawn() {
        let (db, _, locker) = setup().await;
        let repo = db.inventory();
        repo.set_locker_status(&locker.id, LockerStatus::Occupied, locker.revision)
            .await
            .unwrap();

        assert!(repo.soft_delete_locker(&locker.id).await.is_err());
    }

    #[tokio::test]
    async fn test_restock_and_reprice() {
        let (db, costume, _) = setup().await;
        let repo = db.inventory();

        let restocked = repo.restock_costume(&costume.id, 10).await.unwrap();
        assert_eq!(restocked.quantity_available, 15);

        let repriced = repo
            .set_costume_prices(&costume.id, Money::from_paise(20_000), Money::from_paise(7_000))
            .await
            .unwrap();
        assert_eq!(repriced.unit_refund_value, Money::from_paise(7_000));
        assert_eq!(repo.total_costume_stock().await.unwrap(), 15);
    }
}
