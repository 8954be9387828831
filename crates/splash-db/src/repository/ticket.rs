//! # Ticket Catalog Repository
//!
//! Ticket types sold at the counter. Tickets carry no stock; the catalog
//! exists so every ticket line names a real ticket type and snapshots its
//! price at billing time.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use splash_core::{Money, TicketType};

const TICKET_COLUMNS: &str = "id, name, unit_price, is_active, created_at, updated_at";

/// Repository for the ticket catalog.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    /// Creates a new TicketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    /// Gets an active ticket type.
    pub async fn get_active(&self, id: &str) -> DbResult<TicketType> {
        let sql = format!(
            "SELECT {} FROM ticket_types WHERE id = ?1 AND is_active = 1",
            TICKET_COLUMNS
        );
        sqlx::query_as::<_, TicketType>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Ticket", id))
    }

    /// Lists active ticket types by name.
    pub async fn list_active(&self) -> DbResult<Vec<TicketType>> {
        let sql = format!(
            "SELECT {} FROM ticket_types WHERE is_active = 1 ORDER BY name",
            TICKET_COLUMNS
        );
        let tickets = sqlx::query_as::<_, TicketType>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(tickets)
    }

    /// Adds a ticket type to the catalog.
    pub async fn insert(&self, name: &str, unit_price: Money) -> DbResult<TicketType> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, name = %name, %unit_price, "Inserting ticket type");

        let sql = format!(
            r#"
            INSERT INTO ticket_types (id, name, unit_price, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            RETURNING {}
            "#,
            TICKET_COLUMNS
        );

        sqlx::query_as::<_, TicketType>(&sql)
            .bind(&id)
            .bind(name.trim())
            .bind(unit_price)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("ticket", name),
                other => other,
            })
    }

    /// Changes the price of a ticket type. Issued bills are unaffected.
    pub async fn set_price(&self, id: &str, unit_price: Money) -> DbResult<TicketType> {
        let sql = format!(
            r#"
            UPDATE ticket_types SET unit_price = ?1, updated_at = ?2
            WHERE id = ?3 AND is_active = 1
            RETURNING {}
            "#,
            TICKET_COLUMNS
        );

        sqlx::query_as::<_, TicketType>(&sql)
            .bind(unit_price)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Ticket", id))
    }

    /// Stops selling a ticket type.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE ticket_types SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Ticket", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_deactivated_ticket_is_not_sellable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tickets();

        let adult = repo.insert("Adult Day Pass", Money::from_paise(50_000)).await.unwrap();
        assert_eq!(repo.get_active(&adult.id).await.unwrap().unit_price.paise(), 50_000);

        repo.deactivate(&adult.id).await.unwrap();
        assert!(matches!(
            repo.get_active(&adult.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(repo.list_active().await.unwrap().is_empty());
    }
}
