//! # Sync Outbox Repository
//!
//! Queue of ledger changes for the external replication mirror.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  LEDGER WRITE (bill appended / refund recorded)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. INSERT / UPDATE unified_bills ...                          │   │
//! │  │                                                                 │   │
//! │  │  2. INSERT INTO sync_outbox (entity_type, entity_id, payload)  │   │
//! │  │     VALUES ('BILL', ?, <full bill JSON>)                       │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← Both succeed or both fail                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Mirror process (outside this workspace)                               │
//! │     get_pending → push → mark_synced | mark_failed                     │
//! │                                                                         │
//! │  The counter never reads the mirror back.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use splash_core::SyncOutboxEntry;

/// Entity type recorded for unified bills.
pub const ENTITY_BILL: &str = "BILL";

/// Repository for sync outbox operations.
#[derive(Debug, Clone)]
pub struct SyncOutboxRepository {
    pool: SqlitePool,
}

impl SyncOutboxRepository {
    /// Creates a new SyncOutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncOutboxRepository { pool }
    }

    /// Queues an entity for synchronization.
    ///
    /// ## Arguments
    /// * `entity_type` - Type of entity: "BILL", ...
    /// * `entity_id` - The entity's UUID
    /// * `payload` - JSON serialization of the full entity
    pub async fn queue_for_sync(
        &self,
        entity_type: &str,
        entity_id: &str,
        payload: &str,
    ) -> DbResult<SyncOutboxEntry> {
        let mut conn = self.pool.acquire().await?;
        Self::queue_for_sync_tx(&mut conn, entity_type, entity_id, payload).await
    }

    /// Queues an entity on the caller's connection, so the outbox row commits
    /// with the ledger write it describes.
    pub async fn queue_for_sync_tx(
        conn: &mut SqliteConnection,
        entity_type: &str,
        entity_id: &str,
        payload: &str,
    ) -> DbResult<SyncOutboxEntry> {
        debug!(
            entity_type = %entity_type,
            entity_id = %entity_id,
            "Queuing for sync"
        );

        let entry = SyncOutboxEntry {
            id: Uuid::new_v4().to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            payload: payload.to_string(),
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            attempted_at: None,
            synced_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO sync_outbox (
                id, entity_type, entity_id, payload,
                attempts, last_error, created_at, attempted_at, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(&entry.payload)
        .bind(entry.attempts)
        .bind(&entry.last_error)
        .bind(entry.created_at)
        .bind(entry.attempted_at)
        .bind(entry.synced_at)
        .execute(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Gets pending entries, oldest first.
    pub async fn get_pending(&self, limit: u32) -> DbResult<Vec<SyncOutboxEntry>> {
        let entries = sqlx::query_as::<_, SyncOutboxEntry>(
            r#"
            SELECT
                id, entity_type, entity_id, payload,
                attempts, last_error, created_at, attempted_at, synced_at
            FROM sync_outbox
            WHERE synced_at IS NULL
            ORDER BY created_at ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Marks an entry as successfully synced.
    pub async fn mark_synced(&self, id: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sync_outbox SET
                synced_at = ?2,
                attempted_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a sync failure.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE sync_outbox SET
                attempts = attempts + 1,
                last_error = ?2,
                attempted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts pending sync entries.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sync_outbox WHERE synced_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes entries synced more than `days_old` days ago.
    ///
    /// ## Returns
    /// Number of deleted entries.
    pub async fn cleanup_old_entries(&self, days_old: u32) -> DbResult<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(days_old));

        let result = sqlx::query(
            "DELETE FROM sync_outbox WHERE synced_at IS NOT NULL AND synced_at < ?1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_pending_until_synced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let outbox = db.sync_outbox();

        let entry = outbox.queue_for_sync(ENTITY_BILL, "b1", "{}").await.unwrap();
        assert_eq!(outbox.count_pending().await.unwrap(), 1);

        outbox.mark_failed(&entry.id, "mirror offline").await.unwrap();
        let pending = outbox.get_pending(10).await.unwrap();
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("mirror offline"));

        outbox.mark_synced(&entry.id).await.unwrap();
        assert_eq!(outbox.count_pending().await.unwrap(), 0);
        assert_eq!(outbox.cleanup_old_entries(1).await.unwrap(), 0);
    }
}
