//! # Billing Engine
//!
//! Turns a counter cart into a persisted unified bill while keeping costume
//! stock and locker occupancy in step with it.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_unified_billing(token, cart)                                    │
//! │                                                                         │
//! │   1. token ──► Actor                           ✗ Unauthorized           │
//! │   2. cart.validate()                           ✗ Validation             │
//! │   3. resolve tickets / lockers / costumes      ✗ NotFound               │
//! │   4. price lines, discount, GST                                          │
//! │   5. cash + online ≈ total                     ✗ Validation             │
//! │   6. preflight stock / locker status           ✗ InsufficientStock      │
//! │                                                  LockerUnavailable      │
//! │  ─────────────── no writes above this line ────────────────             │
//! │   7. reserve each costume  (CAS, retried)  ─┐                           │
//! │   8. occupy each locker    (CAS, retried)  ─┤ failure → release what    │
//! │                                             │ was reserved, return err  │
//! │   9. build bill (refund values as reserved) │                           │
//! │  10. append bill + outbox row              ─┘ failure → release all,    │
//! │      (bill_no taken: lengthen it, retry)       Persistence or           │
//! │                                                InventoryDrift           │
//! │  11. queue receipt (never fails the sale)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reservations are separate compare-and-set writes, not one transaction:
//! each takes a pooled connection only for its own statement, so a slow
//! cashier never holds the inventory tables.

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use splash_core::billing::{
    bill_number, bill_number_with_digits, costume_line, locker_line, ticket_line,
    BILL_NUMBER_DIGITS,
};
use splash_core::{
    BillTotals, CartRequest, Costume, CostumeLine, Discount, Locker, LockerLine, LockerStatus,
    Money, Receipt, TicketLine, UnifiedBill,
};
use splash_db::{Database, DbError, DbResult};

use crate::claims::{Actor, ClaimsReader};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::printer::PrintSpoolerHandle;
use crate::retry::retry_on_conflict;

/// Longest bill number suffix tried before a collision is reported.
const MAX_BILL_NUMBER_DIGITS: usize = 12;

/// Catalog rows a cart refers to, as read before any write.
#[derive(Debug)]
struct ResolvedCart {
    tickets: Vec<TicketLine>,
    lockers: Vec<Locker>,
    costumes: Vec<(Costume, i64)>,
}

/// What has actually been taken from inventory so far.
#[derive(Debug, Default)]
struct Reservations {
    /// Costume after the decrement, and how many were taken.
    costumes: Vec<(Costume, i64)>,
    /// Locker after being marked occupied.
    lockers: Vec<Locker>,
}

impl Reservations {
    fn is_empty(&self) -> bool {
        self.costumes.is_empty() && self.lockers.is_empty()
    }
}

/// Creates unified bills.
#[derive(Debug, Clone)]
pub struct BillingEngine {
    db: Database,
    claims: ClaimsReader,
    config: EngineConfig,
    spooler: Option<PrintSpoolerHandle>,
}

impl BillingEngine {
    pub fn new(db: Database, claims: ClaimsReader, config: EngineConfig) -> Self {
        BillingEngine {
            db,
            claims,
            config,
            spooler: None,
        }
    }

    /// Sends a receipt to `spooler` for every bill created.
    pub fn with_spooler(mut self, spooler: PrintSpoolerHandle) -> Self {
        self.spooler = Some(spooler);
        self
    }

    /// Creates a bill for `cart`, sold by the actor named in `token`.
    ///
    /// ## Guarantees
    /// * On `Ok`, the bill and its outbox entry are durable, every costume
    ///   on it has been decremented and every locker on it is occupied.
    /// * On any error other than `InventoryDrift`, inventory is exactly as
    ///   it was before the call.
    pub async fn create_unified_billing(
        &self,
        token: &str,
        cart: &CartRequest,
    ) -> EngineResult<UnifiedBill> {
        let actor = self.claims.decode(token)?;
        debug!(
            actor = %actor.id,
            tickets = cart.tickets.len(),
            lockers = cart.lockers.len(),
            costumes = cart.costumes.len(),
            "Creating unified bill"
        );

        cart.validate()?;

        let resolved = self.resolve(cart).await?;

        let locker_lines: Vec<LockerLine> = resolved.lockers.iter().map(locker_line).collect();
        let costume_lines: Vec<CostumeLine> = resolved
            .costumes
            .iter()
            .map(|(c, qty)| costume_line(c, *qty))
            .collect();

        let discount = Discount {
            kind: cart.discount_type,
            value: cart.discount,
        };
        let totals = BillTotals::for_lines(
            &resolved.tickets,
            &locker_lines,
            &costume_lines,
            discount,
            self.config.gst_rate,
        );
        totals.check_payment(cart.cash_paid, cart.online_paid)?;

        preflight(&resolved)?;

        let bill_id = Uuid::new_v4().to_string();
        let reserved = self.reserve(&bill_id, &resolved).await?;

        let mut bill = self.build_bill(bill_id, &actor, cart, &resolved, &reserved, totals);

        if let Err(e) = self.append(&mut bill).await {
            error!(?e, bill_id = %bill.id, "Failed to save bill, releasing inventory");

            let drifted = self.release(&reserved).await;
            if !drifted.is_empty() {
                error!(bill_id = %bill.id, items = ?drifted, "Inventory drift after failed bill");
                return Err(EngineError::InventoryDrift {
                    bill_id: bill.id,
                    items: drifted,
                });
            }
            return Err(EngineError::Persistence(e.to_string()));
        }

        info!(
            bill_id = %bill.id,
            bill_no = %bill.bill_no,
            total = %bill.total,
            actor = %actor.id,
            "Unified bill created"
        );

        if let Some(spooler) = &self.spooler {
            spooler.submit(Receipt::for_sale(&bill, &self.config.facility_name));
        }

        Ok(bill)
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Reads every catalog row the cart names.
    async fn resolve(&self, cart: &CartRequest) -> EngineResult<ResolvedCart> {
        let tickets_repo = self.db.tickets();
        let inventory = self.db.inventory();

        let mut tickets = Vec::with_capacity(cart.tickets.len());
        for req in &cart.tickets {
            let ticket = tickets_repo.get_active(&req.ticket_id).await?;
            tickets.push(ticket_line(&ticket, req.quantity));
        }

        let mut lockers = Vec::with_capacity(cart.lockers.len());
        for req in &cart.lockers {
            lockers.push(inventory.find_locker(&req.locker_id).await?);
        }

        let mut costumes = Vec::with_capacity(cart.costumes.len());
        for req in &cart.costumes {
            let costume = inventory.find_costume(&req.costume_id).await?;
            costumes.push((costume, req.quantity));
        }

        Ok(ResolvedCart {
            tickets,
            lockers,
            costumes,
        })
    }

    /// Takes every costume and locker, or nothing.
    async fn reserve(&self, bill_id: &str, cart: &ResolvedCart) -> EngineResult<Reservations> {
        let mut reserved = Reservations::default();

        for (costume, qty) in &cart.costumes {
            match self.reserve_costume(&costume.id, *qty).await {
                Ok(after) => reserved.costumes.push((after, *qty)),
                Err(e) => return Err(self.abandon(bill_id, reserved, e).await),
            }
        }

        for locker in &cart.lockers {
            match self.occupy_locker(&locker.id).await {
                Ok(after) => reserved.lockers.push(after),
                Err(e) => return Err(self.abandon(bill_id, reserved, e).await),
            }
        }

        Ok(reserved)
    }

    async fn reserve_costume(&self, costume_id: &str, qty: i64) -> DbResult<Costume> {
        let inventory = self.db.inventory();
        let inventory = &inventory;

        retry_on_conflict("costume reserve", self.config.max_conflict_retries, move || async move {
            let current = inventory.find_costume(costume_id).await?;
            inventory
                .adjust_quantity(costume_id, -qty, current.revision)
                .await
        })
        .await
    }

    async fn occupy_locker(&self, locker_id: &str) -> DbResult<Locker> {
        let inventory = self.db.inventory();
        let inventory = &inventory;

        retry_on_conflict("locker occupy", self.config.max_conflict_retries, move || async move {
            let current = inventory.find_locker(locker_id).await?;
            inventory
                .set_locker_status(locker_id, LockerStatus::Occupied, current.revision)
                .await
        })
        .await
    }

    /// Saves `bill`, lengthening its number while it collides with an
    /// earlier bill's.
    async fn append(&self, bill: &mut UnifiedBill) -> DbResult<()> {
        let mut digits = BILL_NUMBER_DIGITS;
        loop {
            match self.db.bills().append(bill).await {
                Err(e) if e.is_unique_violation_on("bill_no") && digits < MAX_BILL_NUMBER_DIGITS => {
                    digits += 2;
                    let longer = bill_number_with_digits(bill.created_at, &bill.id, digits);
                    warn!(
                        bill_id = %bill.id,
                        taken = %bill.bill_no,
                        next = %longer,
                        "Bill number already used, lengthening"
                    );
                    bill.bill_no = longer;
                }
                result => return result,
            }
        }
    }

    /// Releases partial reservations after a failed reserve step and picks
    /// the error to report.
    async fn abandon(&self, bill_id: &str, reserved: Reservations, cause: DbError) -> EngineError {
        warn!(?cause, bill_id = %bill_id, "Reservation failed, releasing what was taken");

        let drifted = self.release(&reserved).await;
        if drifted.is_empty() {
            return cause.into();
        }

        error!(bill_id = %bill_id, items = ?drifted, cause = %cause, "Inventory drift after failed reservation");
        EngineError::InventoryDrift {
            bill_id: bill_id.to_string(),
            items: drifted,
        }
    }

    /// Puts back everything in `reserved`.
    ///
    /// Returns the labels of items that could not be put back.
    async fn release(&self, reserved: &Reservations) -> Vec<String> {
        if reserved.is_empty() {
            return Vec::new();
        }

        let inventory = self.db.inventory();
        let inventory = &inventory;
        let retries = self.config.max_conflict_retries;
        let mut drifted = Vec::new();

        for (costume, qty) in &reserved.costumes {
            let id = costume.id.as_str();
            let qty = *qty;
            let result = retry_on_conflict("costume release", retries, move || async move {
                let current = inventory.find_costume_for_return(id).await?;
                inventory.adjust_quantity(id, qty, current.revision).await
            })
            .await;

            if let Err(e) = result {
                error!(?e, costume_id = %id, quantity = qty, "Failed to release costume");
                drifted.push(costume.label());
            }
        }

        for locker in &reserved.lockers {
            let id = locker.id.as_str();
            let result = retry_on_conflict("locker release", retries, move || async move {
                let current = inventory.find_locker(id).await?;
                inventory
                    .set_locker_status(id, LockerStatus::Available, current.revision)
                    .await
            })
            .await;

            if let Err(e) = result {
                error!(?e, locker_id = %id, "Failed to release locker");
                drifted.push(format!("Locker {}", locker.locker_no));
            }
        }

        drifted
    }

    fn build_bill(
        &self,
        id: String,
        actor: &Actor,
        cart: &CartRequest,
        resolved: &ResolvedCart,
        reserved: &Reservations,
        totals: BillTotals,
    ) -> UnifiedBill {
        let now = Utc::now().with_timezone(&self.config.facility_offset);

        // Sale prices come from the resolve step; refund values from the row
        // as it stood when the unit was taken.
        let lockers = resolved
            .lockers
            .iter()
            .zip(&reserved.lockers)
            .map(|(sold, taken)| LockerLine {
                refund_price: taken.unit_refund_value,
                ..locker_line(sold)
            })
            .collect();

        let costumes = resolved
            .costumes
            .iter()
            .zip(&reserved.costumes)
            .map(|((sold, qty), (taken, _))| CostumeLine {
                refund_price: taken.unit_refund_value * *qty,
                ..costume_line(sold, *qty)
            })
            .collect();

        UnifiedBill {
            bill_no: bill_number(now, &id),
            id,
            customer_name: cart.customer_name.trim().to_string(),
            customer_number: cart.customer_number.trim().to_string(),
            tickets: resolved.tickets.clone(),
            lockers,
            costumes,
            discount: cart.discount,
            discount_type: cart.discount_type,
            cash_paid: cart.cash_paid,
            online_paid: cart.online_paid,
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            gst_amount: totals.gst_amount,
            total: totals.total,
            is_returned: false,
            refund_amount: Money::zero(),
            bill_date: now.format("%Y-%m-%d").to_string(),
            created_by: actor.id.clone(),
            created_at: now,
            updated_at: now,
            updated_by: actor.id.clone(),
        }
    }
}

/// Rejects carts that cannot be filled from what was just read.
///
/// The reserve step re-checks under compare-and-set; this only avoids
/// starting writes that are already known to fail.
fn preflight(cart: &ResolvedCart) -> EngineResult<()> {
    for (costume, qty) in &cart.costumes {
        if !costume.can_rent(*qty) {
            return Err(EngineError::InsufficientStock {
                item: costume.label(),
                available: costume.quantity_available,
                requested: *qty,
            });
        }
    }
    for locker in &cart.lockers {
        if !locker.is_available() {
            return Err(EngineError::LockerUnavailable {
                locker_no: locker.locker_no.clone(),
            });
        }
    }
    Ok(())
}
