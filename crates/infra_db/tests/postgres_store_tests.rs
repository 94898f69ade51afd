//! Integration tests for the PostgreSQL ledger store
//!
//! Each test starts its own container; run with `cargo test -- --ignored`.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, HealthCheckable, OrganizationId};
use domain_ledger::chart::DefaultAccount;
use domain_ledger::documents::inventory::{AdjustmentDirection, Product};
use domain_ledger::documents::sales::{Invoice, InvoiceStatus};
use domain_ledger::{EntryStatus, LedgerConfig, LedgerError, LedgerService, LedgerStore};

use test_utils::{
    assert_amount_eq, db_test, stock_adjustment, InvoiceBuilder, PaymentBuilder,
    ProductBuilder, TestDatabase,
};

async fn service(db: &TestDatabase) -> (LedgerService, OrganizationId) {
    let store = Arc::new(db.ledger_store()) as Arc<dyn LedgerStore>;
    let service = LedgerService::new(store, LedgerConfig::default());
    let organization_id = OrganizationId::new();
    service.initialize_chart(organization_id).await.unwrap();
    (service, organization_id)
}

async fn balance(service: &LedgerService, org: OrganizationId, role: DefaultAccount) -> Decimal {
    service.resolve_default_account(org, role).await.unwrap().current_balance
}

db_test!(test_store_reports_healthy, |db| {
    let health = db.ledger_store().health_check().await;
    assert_eq!(health.status, AdapterHealth::Healthy);
    assert_eq!(health.adapter_id, "postgres-ledger-store");
});

db_test!(test_chart_initialization_is_repeatable, |db| {
    let (service, org) = service(&db).await;
    let first = service.accounts(org).await.unwrap();
    service.initialize_chart(org).await.unwrap();
    let second = service.accounts(org).await.unwrap();

    assert_eq!(first.len(), DefaultAccount::ALL.len());
    assert_eq!(first.len(), second.len());
});

db_test!(test_invoice_and_payment_round_trip, |db| {
    let (service, org) = service(&db).await;
    let invoice = InvoiceBuilder::new(org).build();
    service.save_document(&invoice).await.unwrap();
    service.post_invoice(org, invoice.id, Some("clerk")).await.unwrap();

    let payment = PaymentBuilder::for_invoice(&invoice).build();
    service.save_document(&payment).await.unwrap();
    service.record_invoice_payment(org, payment.id, None).await.unwrap();

    let stored: Invoice = service.document(org, *invoice.id.as_uuid()).await.unwrap();
    assert_eq!(stored.status, InvoiceStatus::Paid);
    assert_amount_eq(balance(&service, org, DefaultAccount::Cash).await, dec!(1100));
    assert_amount_eq(balance(&service, org, DefaultAccount::AccountsReceivable).await, Decimal::ZERO);
    assert_amount_eq(balance(&service, org, DefaultAccount::SalesRevenue).await, dec!(1000));

    let entries = service.entries(org, Some(EntryStatus::Posted)).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry_number, "JE-000001");
    assert_eq!(entries[1].entry_number, "JE-000002");
    assert!(service.health_check(org).await.unwrap().is_healthy);
});

db_test!(test_concurrent_posts_produce_one_entry, |db| {
    let (service, org) = service(&db).await;
    let invoice = InvoiceBuilder::new(org).build();
    service.save_document(&invoice).await.unwrap();

    let (a, b) = tokio::join!(
        service.post_invoice(org, invoice.id, None),
        service.post_invoice(org, invoice.id, None)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.entry.id, b.entry.id);
    assert!(a.already_posted != b.already_posted);
    assert_eq!(service.entries(org, None).await.unwrap().len(), 1);
    assert_amount_eq(balance(&service, org, DefaultAccount::AccountsReceivable).await, dec!(1100));
});

db_test!(test_failed_adjustment_rolls_back, |db| {
    let (service, org) = service(&db).await;
    let product = ProductBuilder::new(org).stock(dec!(1)).build();
    service.save_document(&product).await.unwrap();
    let adjustment = stock_adjustment(&product, AdjustmentDirection::Decrease, dec!(5));
    service.save_document(&adjustment).await.unwrap();

    let result = service.apply_stock_adjustment(org, adjustment.id, None).await;
    assert!(matches!(result, Err(LedgerError::InsufficientStock { .. })));

    let stored: Product = service.document(org, *product.id.as_uuid()).await.unwrap();
    assert_amount_eq(stored.stock_quantity, dec!(1));
    assert!(service.entries(org, None).await.unwrap().is_empty());
});

db_test!(test_void_tombstones_rows_in_database, |db| {
    let (service, org) = service(&db).await;
    let invoice = InvoiceBuilder::new(org).build();
    service.save_document(&invoice).await.unwrap();
    service.post_invoice(org, invoice.id, None).await.unwrap();

    let outcome = service.cancel_invoice(org, invoice.id, "Raised in error", None).await.unwrap();
    let voided = outcome.voided_entry.unwrap();

    let (active,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM ledger_rows WHERE journal_entry_id = $1 AND deleted_at IS NULL",
    )
    .bind(voided.id.as_uuid())
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(active, 0);
    assert_amount_eq(balance(&service, org, DefaultAccount::AccountsReceivable).await, Decimal::ZERO);

    let report = service.recalculate(org).await.unwrap();
    assert!(report.corrections.is_empty());
});

db_test!(test_recalculate_refuses_corrupted_ledger, |db| {
    let (service, org) = service(&db).await;
    let invoice = InvoiceBuilder::new(org).build();
    service.save_document(&invoice).await.unwrap();
    service.post_invoice(org, invoice.id, None).await.unwrap();

    sqlx::query(
        "UPDATE ledger_rows SET debit = debit + 10 \
         WHERE id = (SELECT id FROM ledger_rows WHERE organization_id = $1 AND debit > 0 LIMIT 1)",
    )
    .bind(org.as_uuid())
    .execute(db.pool())
    .await
    .unwrap();
    let before = service.accounts(org).await.unwrap();

    let result = service.recalculate(org).await;
    assert!(matches!(result, Err(LedgerError::Corruption { .. })));
    assert_eq!(service.accounts(org).await.unwrap(), before);
});

db_test!(test_organizations_do_not_share_books, |db| {
    let (service, first) = service(&db).await;
    let second = OrganizationId::new();
    service.initialize_chart(second).await.unwrap();

    let invoice = InvoiceBuilder::new(first).build();
    service.save_document(&invoice).await.unwrap();
    service.post_invoice(first, invoice.id, None).await.unwrap();

    let result = service.post_invoice(second, invoice.id, None).await;
    assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    assert!(service.entries(second, None).await.unwrap().is_empty());
    assert!(service.trial_balance(second).await.unwrap().lines.is_empty());
});
