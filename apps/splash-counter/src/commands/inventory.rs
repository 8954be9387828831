//! # Inventory Commands
//!
//! What the counter can sell right now.

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use splash_core::{Costume, Locker, LockerStatus, TicketType};

/// Everything on offer, as the counter shows it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub tickets: Vec<TicketType>,
    pub lockers: Vec<Locker>,
    pub costumes: Vec<Costume>,
    pub lockers_available: usize,
    pub costume_stock: i64,
}

/// Lists active ticket types, lockers and costumes.
///
/// `available_only` hides occupied lockers.
pub async fn list_inventory(
    state: &AppState,
    available_only: bool,
) -> Result<InventoryResponse, ApiError> {
    debug!(available_only, "list_inventory command");

    let inventory = state.db.inventory();
    let status = available_only.then_some(LockerStatus::Available);

    let tickets = state.db.tickets().list_active().await?;
    let lockers = inventory.list_lockers(status).await?;
    let costumes = inventory.list_costumes().await?;
    let costume_stock = inventory.total_costume_stock().await?;

    let lockers_available = lockers.iter().filter(|l| l.is_available()).count();

    Ok(InventoryResponse {
        tickets,
        lockers,
        costumes,
        lockers_available,
        costume_stock,
    })
}
