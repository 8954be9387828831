//! # Refund Engine
//!
//! Hands rented lockers and costumes back and pays out their refund value.
//!
//! ## Refund Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  refund_unified_billing(token, bill_id, selection?)                     │
//! │                                                                         │
//! │  token ──► Actor                                ✗ Unauthorized          │
//! │                                                                         │
//! │  ┌──────────────── one transaction, retried on Conflict ─────────────┐  │
//! │  │ read bill                                    ✗ NotFound           │  │
//! │  │ bill.is_returned                             ✗ AlreadyReturned    │  │
//! │  │ selection names a line not on the bill       ✗ Validation         │  │
//! │  │ every selected line already returned         ✗ AlreadyReturned    │  │
//! │  │                                                                   │  │
//! │  │ for each open locker line in scope:                               │  │
//! │  │     live refund value, occupied → available (CAS)                 │  │
//! │  │ for each open costume line in scope:                              │  │
//! │  │     live refund value × qty, stock += qty (CAS)                   │  │
//! │  │                                                                   │  │
//! │  │ write lines + refund_amount, guarded on the lines read            │  │
//! │  │ commit                                                            │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  queue refund receipt                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Refunds pay the item's refund value as it stands when the item comes
//! back, not the value printed on the sale receipt.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use splash_core::validation::validate_customer_number;
use splash_core::{
    LockerStatus, Money, Receipt, ReceiptLine, RefundSelection, UnifiedBill, ValidationError,
};
use splash_db::{BillingRepository, Database, DbError, InventoryRepository};

use crate::claims::{Actor, ClaimsReader};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::printer::PrintSpoolerHandle;
use crate::retry::retry_on_conflict;

/// The result of a successful refund.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundOutcome {
    /// The bill as stored after the refund.
    pub bill: UnifiedBill,

    /// Paid out by this refund alone.
    pub refund_amount: Money,

    pub returned_locker_ids: Vec<String>,
    pub returned_costume_ids: Vec<String>,

    /// Locker numbers that were already free when handed back. Their
    /// deposit is still paid; the counter should check the locker itself.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lockers_already_free: Vec<String>,
}

/// A customer's last bill, priced for the return desk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundQuote {
    /// Open lines carry the refund value that would be paid right now.
    pub bill: UnifiedBill,

    /// Sum over open lines; zero once everything is back.
    pub refundable_amount: Money,
}

/// Processes returns against existing bills.
#[derive(Debug, Clone)]
pub struct RefundEngine {
    db: Database,
    claims: ClaimsReader,
    config: EngineConfig,
    spooler: Option<PrintSpoolerHandle>,
}

impl RefundEngine {
    pub fn new(db: Database, claims: ClaimsReader, config: EngineConfig) -> Self {
        RefundEngine {
            db,
            claims,
            config,
            spooler: None,
        }
    }

    /// Sends a receipt to `spooler` for every refund paid.
    pub fn with_spooler(mut self, spooler: PrintSpoolerHandle) -> Self {
        self.spooler = Some(spooler);
        self
    }

    /// Refunds the selected lines of a bill, or every open line when
    /// `selection` is `None`.
    ///
    /// ## Returns
    /// * `Ok(RefundOutcome)` - Inventory, bill and outbox committed together
    /// * `Err(AlreadyReturned)` - Nothing left to return in the requested scope
    /// * `Err(Conflict)` - Another refund kept winning the race
    pub async fn refund_unified_billing(
        &self,
        token: &str,
        bill_id: &str,
        selection: Option<&RefundSelection>,
    ) -> EngineResult<RefundOutcome> {
        let actor = self.claims.decode(token)?;
        debug!(actor = %actor.id, bill_id = %bill_id, ?selection, "Refunding bill");

        // An empty selection is the same as none: everything still out.
        let selection = selection.filter(|s| !s.is_empty());

        let actor = &actor;
        let (outcome, receipt_lines) = retry_on_conflict(
            "refund",
            self.config.max_conflict_retries,
            move || self.refund_once(actor, bill_id, selection),
        )
        .await?;

        info!(
            bill_id = %bill_id,
            refund_amount = %outcome.refund_amount,
            lockers = outcome.returned_locker_ids.len(),
            costumes = outcome.returned_costume_ids.len(),
            is_returned = outcome.bill.is_returned,
            actor = %actor.id,
            "Refund recorded"
        );

        if let Some(spooler) = &self.spooler {
            if !receipt_lines.is_empty() {
                spooler.submit(Receipt::for_refund(
                    &outcome.bill,
                    receipt_lines,
                    &self.config.facility_name,
                ));
            }
        }

        Ok(outcome)
    }

    /// One attempt at the whole refund, in a single transaction.
    ///
    /// Dropping the transaction on any early return rolls back every
    /// inventory write made so far.
    async fn refund_once(
        &self,
        actor: &Actor,
        bill_id: &str,
        selection: Option<&RefundSelection>,
    ) -> EngineResult<(RefundOutcome, Vec<ReceiptLine>)> {
        let mut tx = self.db.begin().await?;

        let before = BillingRepository::get_by_id_tx(&mut tx, bill_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Bill", bill_id))?;

        if before.is_returned {
            return Err(EngineError::AlreadyReturned {
                bill_id: bill_id.to_string(),
            });
        }

        if let Some(selection) = selection {
            check_selection(&before, selection)?;
        }

        let in_scope_locker = |id: &str| selection.map_or(true, |s| s.includes_locker(id));
        let in_scope_costume = |id: &str| selection.map_or(true, |s| s.includes_costume(id));

        let locker_idx: Vec<usize> = before
            .lockers
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_returned && in_scope_locker(&l.locker_id))
            .map(|(i, _)| i)
            .collect();
        let costume_idx: Vec<usize> = before
            .costumes
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_returned && in_scope_costume(&c.costume_id))
            .map(|(i, _)| i)
            .collect();

        if selection.is_some() && locker_idx.is_empty() && costume_idx.is_empty() {
            return Err(EngineError::AlreadyReturned {
                bill_id: bill_id.to_string(),
            });
        }

        let mut after = before.clone();
        let mut paid = Money::zero();
        let mut receipt_lines = Vec::new();
        let mut returned_locker_ids = Vec::new();
        let mut returned_costume_ids = Vec::new();
        let mut lockers_already_free = Vec::new();

        for i in locker_idx {
            let line = &mut after.lockers[i];
            let locker = InventoryRepository::find_locker_tx(&mut tx, &line.locker_id).await?;

            if locker.status == LockerStatus::Occupied {
                InventoryRepository::set_locker_status_tx(
                    &mut tx,
                    &locker.id,
                    LockerStatus::Available,
                    locker.revision,
                )
                .await?;
            } else {
                error!(
                    bill_id = %bill_id,
                    locker_id = %locker.id,
                    locker_no = %locker.locker_no,
                    "Returned locker was already available, occupancy was lost"
                );
                lockers_already_free.push(locker.locker_no.clone());
            }

            line.refund_price = locker.unit_refund_value * line.quantity;
            line.is_returned = true;
            paid = paid + line.refund_price;

            receipt_lines.push(ReceiptLine {
                description: format!("Locker {}", line.locker_no),
                quantity: line.quantity,
                amount: line.refund_price,
            });
            returned_locker_ids.push(line.locker_id.clone());
        }

        for i in costume_idx {
            let line = &mut after.costumes[i];
            let costume =
                InventoryRepository::find_costume_for_return_tx(&mut tx, &line.costume_id).await?;

            InventoryRepository::adjust_quantity_tx(
                &mut tx,
                &costume.id,
                line.quantity,
                costume.revision,
            )
            .await?;

            line.refund_price = costume.unit_refund_value * line.quantity;
            line.is_returned = true;
            paid = paid + line.refund_price;

            receipt_lines.push(ReceiptLine {
                description: format!("{} ({})", line.category, line.size),
                quantity: line.quantity,
                amount: line.refund_price,
            });
            returned_costume_ids.push(line.costume_id.clone());
        }

        after.refund_amount = before.refund_amount + paid;
        after.is_returned = after.open_returnables() == 0;
        after.updated_at = Utc::now().with_timezone(&self.config.facility_offset);
        after.updated_by = actor.id.clone();

        BillingRepository::record_refund_tx(&mut tx, &before, &after).await?;

        tx.commit().await.map_err(DbError::from)?;

        Ok((
            RefundOutcome {
                bill: after,
                refund_amount: paid,
                returned_locker_ids,
                returned_costume_ids,
                lockers_already_free,
            },
            receipt_lines,
        ))
    }

    /// The customer's most recent bill, with open lines priced at today's
    /// refund values.
    ///
    /// `Ok(None)` when the number has never been billed.
    pub async fn lookup_last_bill(&self, customer_number: &str) -> EngineResult<Option<RefundQuote>> {
        let customer_number = customer_number.trim();
        validate_customer_number(customer_number)?;

        let Some(mut bill) = self
            .db
            .history()
            .last_by_customer_number(customer_number)
            .await?
        else {
            debug!(customer_number = %customer_number, "No bill for customer");
            return Ok(None);
        };

        let inventory = self.db.inventory();
        let mut refundable = Money::zero();

        for line in bill.lockers.iter_mut().filter(|l| !l.is_returned) {
            match inventory.find_locker(&line.locker_id).await {
                Ok(locker) => line.refund_price = locker.unit_refund_value * line.quantity,
                Err(DbError::NotFound { .. }) => {
                    warn!(locker_id = %line.locker_id, "Locker withdrawn, quoting sale-time refund")
                }
                Err(e) => return Err(e.into()),
            }
            refundable = refundable + line.refund_price;
        }

        for line in bill.costumes.iter_mut().filter(|c| !c.is_returned) {
            match inventory.find_costume_for_return(&line.costume_id).await {
                Ok(costume) => line.refund_price = costume.unit_refund_value * line.quantity,
                Err(DbError::NotFound { .. }) => {
                    warn!(costume_id = %line.costume_id, "Costume missing, quoting sale-time refund")
                }
                Err(e) => return Err(e.into()),
            }
            refundable = refundable + line.refund_price;
        }

        Ok(Some(RefundQuote {
            bill,
            refundable_amount: refundable,
        }))
    }
}

/// Every id in `selection` must be a line on `bill`.
fn check_selection(bill: &UnifiedBill, selection: &RefundSelection) -> EngineResult<()> {
    if let Some(id) = selection
        .locker_ids
        .iter()
        .find(|id| !bill.lockers.iter().any(|l| &l.locker_id == *id))
    {
        return Err(ValidationError::NotOnBill {
            field: "locker".to_string(),
            value: id.clone(),
        }
        .into());
    }

    if let Some(id) = selection
        .costume_ids
        .iter()
        .find(|id| !bill.costumes.iter().any(|c| &c.costume_id == *id))
    {
        return Err(ValidationError::NotOnBill {
            field: "costume".to_string(),
            value: id.clone(),
        }
        .into());
    }

    Ok(())
}
