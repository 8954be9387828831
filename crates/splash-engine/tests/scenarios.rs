//! Counter scenarios: ticket-only sale, locker round trip, costume stock-out,
//! and stock conservation across a reprice.

mod common;

use common::Park;
use splash_core::{CartRequest, CostumeRequest, DiscountType, LockerRequest, Money, TicketRequest};
use splash_engine::EngineError;

fn cart(cash: i64) -> CartRequest {
    CartRequest {
        customer_name: "Ravi Kumar".to_string(),
        customer_number: "9123456780".to_string(),
        tickets: vec![],
        lockers: vec![],
        costumes: vec![],
        discount: 0,
        discount_type: DiscountType::Flat,
        cash_paid: Money::from_paise(cash),
        online_paid: Money::zero(),
    }
}

#[tokio::test]
async fn tickets_only_touch_no_inventory() {
    let park = Park::open().await;

    let mut request = cart(100_000);
    request.tickets.push(TicketRequest {
        ticket_id: park.ticket.id.clone(),
        quantity: 2,
    });

    let bill = park
        .billing
        .create_unified_billing(&park.token, &request)
        .await
        .unwrap();

    assert_eq!(bill.subtotal, Money::from_paise(100_000));
    assert_eq!(bill.total, Money::from_paise(100_000));
    assert_eq!(bill.discount_amount, Money::zero());
    assert!(bill.lockers.is_empty() && bill.costumes.is_empty());

    assert_eq!(park.stock().await, 5);
    assert!(park.locker_available(&park.locker).await);
    assert!(park.locker_available(&park.spare_locker).await);
}

#[tokio::test]
async fn locker_round_trip() {
    let park = Park::open().await;

    let mut request = cart(10_000);
    request.lockers.push(LockerRequest {
        locker_id: park.locker.id.clone(),
    });

    let bill = park
        .billing
        .create_unified_billing(&park.token, &request)
        .await
        .unwrap();
    assert!(!park.locker_available(&park.locker).await);

    let outcome = park
        .refunds
        .refund_unified_billing(&park.token, &bill.id, None)
        .await
        .unwrap();

    assert_eq!(outcome.refund_amount, Money::from_paise(8_000));
    assert!(outcome.bill.is_returned);
    assert_eq!(outcome.returned_locker_ids, vec![park.locker.id.clone()]);
    assert!(park.locker_available(&park.locker).await);
}

#[tokio::test]
async fn second_costume_sale_runs_out() {
    let park = Park::open().await;

    let mut request = cart(45_000);
    request.costumes.push(CostumeRequest {
        costume_id: park.costume.id.clone(),
        quantity: 3,
    });

    park.billing
        .create_unified_billing(&park.token, &request)
        .await
        .unwrap();
    assert_eq!(park.stock().await, 2);

    let err = park
        .billing
        .create_unified_billing(&park.token, &request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        }
    ));
    assert_eq!(park.stock().await, 2);
    assert_eq!(park.db.bills().count().await.unwrap(), 1);
    assert_eq!(park.db.sync_outbox().count_pending().await.unwrap(), 1);
}

#[tokio::test]
async fn stock_is_conserved_across_a_reprice() {
    let park = Park::open().await;

    let mut request = cart(45_000);
    request.costumes.push(CostumeRequest {
        costume_id: park.costume.id.clone(),
        quantity: 3,
    });

    let bill = park
        .billing
        .create_unified_billing(&park.token, &request)
        .await
        .unwrap();

    park.db
        .inventory()
        .set_costume_prices(&park.costume.id, Money::from_paise(20_000), Money::from_paise(2_000))
        .await
        .unwrap();

    let outcome = park
        .refunds
        .refund_unified_billing(&park.token, &bill.id, None)
        .await
        .unwrap();

    assert_eq!(outcome.refund_amount, Money::from_paise(6_000));
    assert_eq!(park.stock().await, 5);
}
