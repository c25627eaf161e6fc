//! End-to-end settlement tests against an in-memory database.
//!
//! Every test drives the real engine: pool, migrations, per-item locks,
//! the settlement transaction and audit emission. What they assert is the
//! atomicity contract: a committed settlement persists everything, a
//! failed one persists nothing.

use std::sync::Arc;

use chrono::Utc;

use mesa_core::{Cashier, CheckoutLine, CheckoutRequest, Customer, Item, OrderType, PaymentMethod};
use mesa_engine::{
    CheckoutEngine, CheckoutError, Database, DbConfig, ErrorCode, MemoryAuditEmitter,
};

// =============================================================================
// Fixtures
// =============================================================================

const BRANCH: &str = "branch-1";

async fn test_db() -> Database {
    // RUST_LOG=debug makes failing runs readable; errors if already set,
    // which is fine across tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn cashier() -> Cashier {
    Cashier::new("user-1", Some(BRANCH.to_string()))
}

fn item(id: &str, price_cents: i64, stock: i64, branch_id: &str) -> Item {
    let now = Utc::now();
    Item {
        id: id.to_string(),
        sku: None,
        name: format!("Item {}", id),
        price_cents,
        stock,
        branch_id: branch_id.to_string(),
        created_at: now,
        updated_at: now,
    }
}

fn customer(id: &str) -> Customer {
    Customer {
        id: id.to_string(),
        name: "Regular".to_string(),
        phone: Some("555-0100".to_string()),
        branch_id: Some(BRANCH.to_string()),
        created_at: Utc::now(),
    }
}

fn request(lines: &[(&str, i64)]) -> CheckoutRequest {
    CheckoutRequest {
        items: lines
            .iter()
            .map(|(id, quantity)| CheckoutLine {
                id: id.to_string(),
                quantity: *quantity,
            })
            .collect(),
        customer_id: None,
        order_type: OrderType::Takeaway,
        table_number: None,
        payment_method: PaymentMethod::Cash,
        discount: None,
        cash_cents: None,
        card_cents: None,
    }
}

async fn stock_of(db: &Database, id: &str) -> i64 {
    db.items().get_by_id(id).await.unwrap().unwrap().stock
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn settles_discounted_cash_sale_and_decrements_stock() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 10, BRANCH)).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let mut req = request(&[("i-1", 3)]);
    req.discount = Some(10.0);

    let receipt = engine.settle(&cashier(), req).await.unwrap();

    assert_eq!(receipt.total_cents, 1500);
    assert_eq!(receipt.discount_cents, 150);
    assert_eq!(receipt.final_total_cents, 1350);
    assert!((receipt.discount_percent - 10.0).abs() < 0.001);

    assert_eq!(stock_of(&db, "i-1").await, 7);

    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.user_id, "user-1");
    assert_eq!(sale.branch_id, BRANCH);
    assert_eq!(sale.total_cents, 1500);
    assert_eq!(sale.discount_bps, 1000);
    assert_eq!(sale.final_total_cents, 1350);
    assert_eq!(sale.payment_method, PaymentMethod::Cash);
    assert!(sale.cash_cents.is_none());
    assert!(sale.card_cents.is_none());

    let lines = db.sales().get_items(&receipt.sale_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].item_id, "i-1");
    assert_eq!(lines[0].name_snapshot, "Item i-1");
    assert_eq!(lines[0].unit_price_cents, 500);
    assert_eq!(lines[0].quantity, 3);
}

#[tokio::test]
async fn settles_dine_in_with_customer_and_table() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 850, 5, BRANCH)).await.unwrap();
    db.customers().insert(&customer("c-1")).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let mut req = request(&[("i-1", 2)]);
    req.order_type = OrderType::DineIn;
    req.table_number = Some("12".to_string());
    req.customer_id = Some("c-1".to_string());

    let receipt = engine.settle(&cashier(), req).await.unwrap();

    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.order_type, OrderType::DineIn);
    assert_eq!(sale.table_number.as_deref(), Some("12"));
    assert_eq!(sale.customer_id.as_deref(), Some("c-1"));
}

#[tokio::test]
async fn resubmitting_an_identical_request_creates_a_second_sale() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 10, BRANCH)).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let first = engine.settle(&cashier(), request(&[("i-1", 2)])).await.unwrap();
    let second = engine.settle(&cashier(), request(&[("i-1", 2)])).await.unwrap();

    assert_ne!(first.sale_id, second.sale_id);
    assert_eq!(stock_of(&db, "i-1").await, 6);
}

// =============================================================================
// Split Payment
// =============================================================================

#[tokio::test]
async fn mixed_payment_with_exact_split_commits() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 1000, 5, BRANCH)).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let mut req = request(&[("i-1", 2)]);
    req.payment_method = PaymentMethod::Mixed;
    req.cash_cents = Some(1200);
    req.card_cents = Some(800);

    let receipt = engine.settle(&cashier(), req).await.unwrap();
    assert_eq!(receipt.final_total_cents, 2000);

    let sale = db.sales().get_by_id(&receipt.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.cash_cents, Some(1200));
    assert_eq!(sale.card_cents, Some(800));
}

#[tokio::test]
async fn mixed_payment_one_cent_short_rolls_back_everything() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 1000, 5, BRANCH)).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let mut req = request(&[("i-1", 2)]);
    req.payment_method = PaymentMethod::Mixed;
    req.cash_cents = Some(1200);
    req.card_cents = Some(799);

    let err = engine.settle(&cashier(), req).await.unwrap_err();
    match err {
        CheckoutError::PaymentMismatch {
            expected_cents,
            tendered_cents,
        } => {
            assert_eq!(expected_cents, 2000);
            assert_eq!(tendered_cents, 1999);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The mismatch was detected after the stock decrement; rollback must
    // have undone it.
    assert_eq!(stock_of(&db, "i-1").await, 5);
    assert!(db.sales().list_for_user("user-1", 10).await.unwrap().is_empty());
}

// =============================================================================
// Failure Classes
// =============================================================================

#[tokio::test]
async fn insufficient_stock_aborts_without_side_effects() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 2, BRANCH)).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let err = engine.settle(&cashier(), request(&[("i-1", 5)])).await.unwrap_err();

    match err {
        CheckoutError::InsufficientStock {
            name,
            available,
            requested,
        } => {
            assert_eq!(name, "Item i-1");
            assert_eq!(available, 2);
            assert_eq!(requested, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(stock_of(&db, "i-1").await, 2);
    assert!(db.sales().list_for_user("user-1", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn short_stock_on_a_later_line_rolls_back_earlier_decrements() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 10, BRANCH)).await.unwrap();
    db.items().insert(&item("i-2", 300, 1, BRANCH)).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let err = engine
        .settle(&cashier(), request(&[("i-1", 4), ("i-2", 3)]))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InsufficientStock);

    // i-1 was decremented inside the transaction before i-2 failed.
    assert_eq!(stock_of(&db, "i-1").await, 10);
    assert_eq!(stock_of(&db, "i-2").await, 1);
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let db = test_db().await;
    let engine = CheckoutEngine::new(db);

    let err = engine.settle(&cashier(), request(&[("ghost", 1)])).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn item_from_another_branch_is_rejected() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 10, "branch-2")).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let err = engine.settle(&cashier(), request(&[("i-1", 1)])).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);

    assert_eq!(stock_of(&db, "i-1").await, 10);
}

#[tokio::test]
async fn unknown_customer_is_not_found_before_any_stock_is_touched() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 10, BRANCH)).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let mut req = request(&[("i-1", 1)]);
    req.customer_id = Some("ghost".to_string());

    let err = engine.settle(&cashier(), req).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.to_response().error, "Customer not found: ghost");

    assert_eq!(stock_of(&db, "i-1").await, 10);
}

#[tokio::test]
async fn dine_in_without_table_number_fails_validation() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 10, BRANCH)).await.unwrap();

    let engine = CheckoutEngine::new(db.clone());
    let mut req = request(&[("i-1", 1)]);
    req.order_type = OrderType::DineIn;

    let err = engine.settle(&cashier(), req).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::Validation);

    assert_eq!(stock_of(&db, "i-1").await, 10);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_never_oversell() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 10, BRANCH)).await.unwrap();

    let engine = Arc::new(CheckoutEngine::new(db.clone()));

    let mut handles = Vec::new();
    for n in 0..2 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let cashier = Cashier::new(format!("user-{n}"), Some(BRANCH.to_string()));
            engine.settle(&cashier, request(&[("i-1", 6)])).await
        }));
    }

    let mut successes = 0;
    let mut stock_failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(CheckoutError::InsufficientStock { available, .. }) => {
                assert_eq!(available, 4);
                stock_failures += 1;
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // Stock 10, two requests of 6: exactly one can win.
    assert_eq!(successes, 1);
    assert_eq!(stock_failures, 1);
    assert_eq!(stock_of(&db, "i-1").await, 4);
}

// =============================================================================
// Audit
// =============================================================================

#[tokio::test]
async fn audit_event_is_emitted_for_committed_sales_only() {
    let db = test_db().await;
    db.items().insert(&item("i-1", 500, 3, BRANCH)).await.unwrap();

    let audit = Arc::new(MemoryAuditEmitter::new());
    let engine = CheckoutEngine::new(db.clone()).with_audit(audit.clone());

    let receipt = engine.settle(&cashier(), request(&[("i-1", 2)])).await.unwrap();

    // Failed settlement: nothing further gets emitted.
    engine
        .settle(&cashier(), request(&[("i-1", 5)]))
        .await
        .unwrap_err();

    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].actor, "user-1");
    assert_eq!(events[0].action, "create");
    assert_eq!(events[0].entity, "Sale");
    assert_eq!(events[0].entity_id, receipt.sale_id);
    assert_eq!(events[0].branch_id, BRANCH);
}
