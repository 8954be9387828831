//! Counter commands end to end over an in-memory database.

use chrono::{Duration, NaiveDate};

use splash_core::{
    CartRequest, CostumeRequest, DiscountType, Locker, LockerRequest, Money, RefundSelection,
    TicketRequest,
};
use splash_counter::commands::{billing, history, inventory, refund, token};
use splash_counter::error::ErrorCode;
use splash_counter::read_cart;
use splash_counter::state::{AppConfig, AppState};
use splash_db::{Database, DbConfig, NewCostume, NewLocker};
use splash_engine::Role;

struct Counter {
    state: AppState,
    token: String,
    ticket_id: String,
    costume_id: String,
    locker: Locker,
}

async fn open_counter() -> Counter {
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
    let mut lockers = Vec::new();
    for no in ["L-001", "L-002"] {
        let locker = db
            .inventory()
            .insert_locker(&NewLocker {
                locker_no: no.to_string(),
                unit_price: Money::from_paise(10_000),
                unit_refund_value: Money::from_paise(8_000),
            })
            .await
            .unwrap();
        lockers.push(locker);
    }

    let state = AppState::with_database(AppConfig::default(), db).unwrap();
    let issued = token::issue_token(&state, "cashier-1", Role::Cashier, "asha@splash.park", 8)
        .unwrap();

    Counter {
        state,
        token: issued.token,
        ticket_id: ticket.id,
        costume_id: costume.id,
        locker: lockers.remove(0),
    }
}

impl Counter {
    /// Two passes, one locker, two swimsuits: ₹1400 in cash.
    fn cart(&self) -> CartRequest {
        CartRequest {
            customer_name: "Asha Rao".to_string(),
            customer_number: "9876543210".to_string(),
            tickets: vec![TicketRequest {
                ticket_id: self.ticket_id.clone(),
                quantity: 2,
            }],
            lockers: vec![LockerRequest {
                locker_id: self.locker.id.clone(),
            }],
            costumes: vec![CostumeRequest {
                costume_id: self.costume_id.clone(),
                quantity: 2,
            }],
            discount: 0,
            discount_type: DiscountType::Flat,
            cash_paid: Money::from_paise(140_000),
            online_paid: Money::zero(),
        }
    }
}

#[tokio::test]
async fn test_sale_shows_up_in_history_search_and_summary() {
    let counter = open_counter().await;

    let bill = billing::create_unified_billing(&counter.state, &counter.token, &counter.cart())
        .await
        .unwrap();
    assert_eq!(bill.total, Money::from_paise(140_000));
    assert_eq!(bill.created_by, "cashier-1");

    let day = NaiveDate::parse_from_str(&bill.bill_date, "%Y-%m-%d").unwrap();

    let bills = history::bill_history(&counter.state, day, day).await.unwrap();
    assert_eq!(bills.len(), 1);
    assert_eq!(bills[0].id, bill.id);

    let found = history::search_bills(&counter.state, "98765", None)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let found = history::search_bills(&counter.state, &bill.bill_no, Some(10))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let none = history::search_bills(&counter.state, "Nobody", None)
        .await
        .unwrap();
    assert!(none.is_empty());

    let summary = history::daily_summary(&counter.state, day).await.unwrap();
    assert_eq!(summary.summary.bill_count, 1);
    assert_eq!(summary.net_takings, Money::from_paise(140_000));

    counter.state.shutdown().await;
}

#[tokio::test]
async fn test_refund_command_then_already_returned() {
    let counter = open_counter().await;
    let bill = billing::create_unified_billing(&counter.state, &counter.token, &counter.cart())
        .await
        .unwrap();

    let outcome = refund::refund_unified_billing(&counter.state, &counter.token, &bill.id, None)
        .await
        .unwrap();
    // ₹80 locker deposit + 2 × ₹50 swimsuit
    assert_eq!(outcome.refund_amount, Money::from_paise(18_000));
    assert!(outcome.bill.is_returned);

    let err = refund::refund_unified_billing(&counter.state, &counter.token, &bill.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyReturned);

    let day = NaiveDate::parse_from_str(&bill.bill_date, "%Y-%m-%d").unwrap();
    let summary = history::daily_summary(&counter.state, day).await.unwrap();
    assert_eq!(summary.summary.returned_count, 1);
    assert_eq!(summary.net_takings, Money::from_paise(122_000));

    counter.state.shutdown().await;
}

#[tokio::test]
async fn test_partial_refund_by_selection() {
    let counter = open_counter().await;
    let bill = billing::create_unified_billing(&counter.state, &counter.token, &counter.cart())
        .await
        .unwrap();

    let selection = RefundSelection {
        costume_ids: vec![],
        locker_ids: vec![counter.locker.id.clone()],
    };
    let outcome = refund::refund_unified_billing(
        &counter.state,
        &counter.token,
        &bill.id,
        Some(selection),
    )
    .await
    .unwrap();
    assert_eq!(outcome.refund_amount, Money::from_paise(8_000));
    assert!(!outcome.bill.is_returned);

    let quote = refund::get_last_unified_billing_by_customer_phone(&counter.state, "9876543210")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(quote.bill.id, bill.id);
    assert_eq!(quote.refundable_amount, Money::from_paise(10_000));

    counter.state.shutdown().await;
}

#[tokio::test]
async fn test_writes_need_a_token() {
    let counter = open_counter().await;

    let err = billing::create_unified_billing(&counter.state, "", &counter.cart())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);

    let err = refund::refund_unified_billing(&counter.state, "not-a-jwt", "bill-1", None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);

    let stock = inventory::list_inventory(&counter.state, false)
        .await
        .unwrap();
    assert_eq!(stock.costume_stock, 5);
    assert_eq!(stock.lockers_available, 2);

    counter.state.shutdown().await;
}

#[tokio::test]
async fn test_sale_failures_carry_their_codes() {
    let counter = open_counter().await;

    let mut cart = counter.cart();
    cart.cash_paid = Money::from_paise(100_000);
    let err = billing::create_unified_billing(&counter.state, &counter.token, &cart)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    billing::create_unified_billing(&counter.state, &counter.token, &counter.cart())
        .await
        .unwrap();

    let mut again = counter.cart();
    again.costumes.clear();
    again.cash_paid = Money::from_paise(110_000);
    let err = billing::create_unified_billing(&counter.state, &counter.token, &again)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::LockerUnavailable);

    let mut greedy = counter.cart();
    greedy.lockers.clear();
    greedy.costumes[0].quantity = 4;
    greedy.cash_paid = Money::from_paise(160_000);
    let err = billing::create_unified_billing(&counter.state, &counter.token, &greedy)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InsufficientStock);

    counter.state.shutdown().await;
}

#[tokio::test]
async fn test_inventory_listing_tracks_sales() {
    let counter = open_counter().await;

    let before = inventory::list_inventory(&counter.state, false)
        .await
        .unwrap();
    assert_eq!(before.tickets.len(), 1);
    assert_eq!(before.lockers.len(), 2);
    assert_eq!(before.costumes.len(), 1);

    billing::create_unified_billing(&counter.state, &counter.token, &counter.cart())
        .await
        .unwrap();

    let after = inventory::list_inventory(&counter.state, false)
        .await
        .unwrap();
    assert_eq!(after.lockers.len(), 2);
    assert_eq!(after.lockers_available, 1);
    assert_eq!(after.costume_stock, 3);

    let free = inventory::list_inventory(&counter.state, true)
        .await
        .unwrap();
    assert_eq!(free.lockers.len(), 1);
    assert_ne!(free.lockers[0].id, counter.locker.id);

    counter.state.shutdown().await;
}

#[tokio::test]
async fn test_read_validation() {
    let counter = open_counter().await;

    let unknown = refund::get_last_unified_billing_by_customer_phone(&counter.state, "9000000000")
        .await
        .unwrap();
    assert!(unknown.is_none());

    let err = refund::get_last_unified_billing_by_customer_phone(&counter.state, "call me")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let may_1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let may_31 = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
    let err = history::bill_history(&counter.state, may_31, may_1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = history::search_bills(&counter.state, &"x".repeat(101), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = refund::refund_unified_billing(&counter.state, &counter.token, "  ", None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = refund::refund_unified_billing(&counter.state, &counter.token, "no-such-bill", None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    counter.state.shutdown().await;
}

#[tokio::test]
async fn test_issue_token_bounds() {
    let counter = open_counter().await;

    let issued = token::issue_token(&counter.state, "admin-1", Role::Admin, "", 1).unwrap();
    let actor = counter.state.claims.decode(&issued.token).unwrap();
    assert_eq!(actor.id, "admin-1");
    assert!(actor.is_admin());
    assert!(issued.expires_at > chrono::Utc::now() + Duration::minutes(59));

    let err = token::issue_token(&counter.state, "admin-1", Role::Admin, "", 0).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    let err = token::issue_token(&counter.state, "admin-1", Role::Admin, "", 25).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    let err = token::issue_token(&counter.state, " ", Role::Cashier, "", 8).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    counter.state.shutdown().await;
}

#[tokio::test]
async fn test_read_cart_from_file() {
    let counter = open_counter().await;
    let dir = std::env::temp_dir();

    let path = dir.join(format!("splash-cart-{}.json", std::process::id()));
    std::fs::write(&path, serde_json::to_string(&counter.cart()).unwrap()).unwrap();
    let cart = read_cart(&path).unwrap();
    assert_eq!(cart, counter.cart());
    std::fs::remove_file(&path).unwrap();

    let bad = dir.join(format!("splash-bad-cart-{}.json", std::process::id()));
    std::fs::write(&bad, "{ not json").unwrap();
    let err = read_cart(&bad).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    std::fs::remove_file(&bad).unwrap();

    let err = read_cart(&dir.join("splash-missing-cart.json")).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    counter.state.shutdown().await;
}
