//! Shared fixtures: an in-memory park with one ticket type, one costume line
//! and two lockers, and a cashier token.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::Duration;
use splash_core::{
    CartRequest, Costume, CostumeRequest, DiscountType, Locker, LockerRequest, Money, Receipt,
    TicketRequest, TicketType,
};
use splash_db::{Database, DbConfig, NewCostume, NewLocker};
use splash_engine::{
    Actor, BillingEngine, ClaimsReader, EngineConfig, PrintError, ReceiptPrinter, RefundEngine,
    Role,
};

pub const SECRET: &str = "test-secret";

pub struct Park {
    pub db: Database,
    pub billing: BillingEngine,
    pub refunds: RefundEngine,
    pub token: String,
    pub ticket: TicketType,
    /// Swimsuit (M): 5 in stock, ₹150.00 to rent, ₹50.00 back.
    pub costume: Costume,
    /// L-001: ₹100.00 to rent, ₹80.00 back.
    pub locker: Locker,
    pub spare_locker: Locker,
}

impl Park {
    pub async fn open() -> Park {
        Park::open_with(EngineConfig::default()).await
    }

    pub async fn open_with(config: EngineConfig) -> Park {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let ticket = db
            .tickets()
            .insert("Adult Day Pass", Money::from_paise(50_000))
            .await
            .unwrap();
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
        let locker = insert_locker(&db, "L-001").await;
        let spare_locker = insert_locker(&db, "L-002").await;

        let claims = ClaimsReader::new(SECRET);
        let token = claims.issue(&cashier(), Duration::hours(8)).unwrap();

        Park {
            billing: BillingEngine::new(db.clone(), claims.clone(), config.clone()),
            refunds: RefundEngine::new(db.clone(), claims, config),
            db,
            token,
            ticket,
            costume,
            locker,
            spare_locker,
        }
    }

    /// Two adult passes, locker L-001 and two swimsuits, paid in cash:
    /// ₹1000 + ₹100 + ₹300 = ₹1400.
    pub fn family_cart(&self) -> CartRequest {
        CartRequest {
            customer_name: "Asha Rao".to_string(),
            customer_number: "9876543210".to_string(),
            tickets: vec![TicketRequest {
                ticket_id: self.ticket.id.clone(),
                quantity: 2,
            }],
            lockers: vec![LockerRequest {
                locker_id: self.locker.id.clone(),
            }],
            costumes: vec![CostumeRequest {
                costume_id: self.costume.id.clone(),
                quantity: 2,
            }],
            discount: 0,
            discount_type: DiscountType::Flat,
            cash_paid: Money::from_paise(140_000),
            online_paid: Money::zero(),
        }
    }

    pub async fn stock(&self) -> i64 {
        self.db
            .inventory()
            .find_costume(&self.costume.id)
            .await
            .unwrap()
            .quantity_available
    }

    pub async fn locker_available(&self, locker: &Locker) -> bool {
        self.db
            .inventory()
            .find_locker(&locker.id)
            .await
            .unwrap()
            .is_available()
    }
}

pub fn cashier() -> Actor {
    Actor {
        id: "cashier-1".to_string(),
        role: Role::Cashier,
        email: "asha@splash.park".to_string(),
    }
}

async fn insert_locker(db: &Database, locker_no: &str) -> Locker {
    db.inventory()
        .insert_locker(&NewLocker {
            locker_no: locker_no.to_string(),
            unit_price: Money::from_paise(10_000),
            unit_refund_value: Money::from_paise(8_000),
        })
        .await
        .unwrap()
}

/// Keeps every receipt it is handed.
#[derive(Default)]
pub struct RecordingPrinter {
    pub receipts: Mutex<Vec<Receipt>>,
}

impl RecordingPrinter {
    pub fn shared() -> Arc<RecordingPrinter> {
        Arc::new(RecordingPrinter::default())
    }
}

impl ReceiptPrinter for RecordingPrinter {
    fn print(&self, receipt: &Receipt) -> Result<(), PrintError> {
        self.receipts.lock().unwrap().push(receipt.clone());
        Ok(())
    }
}
