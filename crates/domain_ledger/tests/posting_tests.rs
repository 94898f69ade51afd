//! Comprehensive tests for domain_ledger posting
//!
//! Runs the service end to end over the in-memory store: manual entries,
//! every document translator, cancellation and reconciliation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::OrganizationId;
use domain_ledger::chart::DefaultAccount;
use domain_ledger::documents::assets::{DepreciationStatus, FixedAsset};
use domain_ledger::documents::inventory::{AdjustmentDirection, AdjustmentStatus, Product};
use domain_ledger::documents::projects::{Project, ProjectTransaction, ProjectTransactionKind};
use domain_ledger::documents::purchases::{BillStatus, Expense, ExpenseStatus};
use domain_ledger::documents::sales::{CreditNote, Invoice, InvoiceStatus, SalesReceipt};
use domain_ledger::{
    Account, AccountType, ActionResponse, DocumentKind, EntryStatus, EntryType, IssueKind, LedgerError,
    Severity,
};

use test_utils::{
    assert_account_balance, assert_accounts_match_ledger, assert_amount_eq, assert_entry_balanced,
    assert_error_contains, assert_ledger_balanced, bill_payment_for, stock_adjustment, AmountFixtures,
    BillBuilder, DateFixtures, EntryBuilder, InvoiceBuilder, LedgerHarness, PaymentBuilder, ProductBuilder,
    SalesOrderBuilder,
};

async fn posted_invoice(h: &LedgerHarness) -> Invoice {
    let invoice = InvoiceBuilder::new(h.organization_id).build();
    h.service.save_document(&invoice).await.unwrap();
    h.service
        .post_invoice(h.organization_id, invoice.id, Some("clerk"))
        .await
        .unwrap()
        .document
}

async fn saved_product(h: &LedgerHarness, product: Product) -> Product {
    h.service.save_document(&product).await.unwrap();
    product
}

// ============================================================================
// Manual Entry Tests
// ============================================================================

mod manual_entry_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_post_updates_both_accounts() {
        let h = LedgerHarness::new().await;
        let entry = h
            .post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(5000))
            .await;

        assert_eq!(entry.status, EntryStatus::Posted);
        assert_eq!(entry.entry_type, EntryType::Manual);
        assert_entry_balanced(&entry);
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(5000));
        assert_amount_eq(h.balance(DefaultAccount::OwnersEquity).await, dec!(5000));
    }

    #[tokio::test]
    async fn test_entry_numbers_are_sequential() {
        let h = LedgerHarness::new().await;
        let first = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(10)).await;
        let second = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(20)).await;

        assert_eq!(first.entry_number, "JE-000001");
        assert_eq!(second.entry_number, "JE-000002");
    }

    #[tokio::test]
    async fn test_one_ledger_row_per_line_with_running_balance() {
        let h = LedgerHarness::new().await;
        h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(100)).await;
        h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(50)).await;

        let cash = h.account_id(DefaultAccount::Cash).await;
        let rows: Vec<_> = h.ledger_rows().await.into_iter().filter(|r| r.account_id == cash).collect();
        assert_eq!(rows.len(), 2);
        assert_amount_eq(rows[0].running_balance, dec!(100));
        assert_amount_eq(rows[1].running_balance, dec!(150));
        assert_eq!(rows[0].fiscal_year, 2024);
        assert_eq!(rows[0].fiscal_period, 1);
    }

    #[tokio::test]
    async fn test_unbalanced_draft_is_stored_but_cannot_post() {
        let h = LedgerHarness::new().await;
        let cash = h.account_id(DefaultAccount::Cash).await;
        let equity = h.account_id(DefaultAccount::OwnersEquity).await;
        let request = EntryBuilder::new("Off by one").debit(cash, dec!(100)).credit(equity, dec!(99)).build();

        let draft = h.service.create_entry(h.organization_id, request).await.unwrap();
        assert!(!draft.is_balanced);
        assert_eq!(draft.status, EntryStatus::Draft);

        let result = h.service.post_entry(h.organization_id, draft.id, None).await;
        assert!(matches!(
            result,
            Err(LedgerError::UnbalancedEntry { difference, .. }) if difference == dec!(1)
        ));
        assert!(h.ledger_rows().await.is_empty());
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_fractions_of_a_cent_are_rejected() {
        let h = LedgerHarness::new().await;
        let cash = h.account_id(DefaultAccount::Cash).await;
        let equity = h.account_id(DefaultAccount::OwnersEquity).await;

        for _ in 0..2 {
            let request = EntryBuilder::new("Rounding")
                .debit(cash, dec!(100.009))
                .credit(equity, dec!(100.00))
                .build();
            let result = h.service.create_and_post(h.organization_id, request).await;
            assert_error_contains(&result, "fractions of a cent");
        }

        assert!(h.ledger_rows().await.is_empty());
        assert!(h.service.health_check(h.organization_id).await.unwrap().is_healthy);
        assert!(h.service.recalculate(h.organization_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_trailing_zeros_are_whole_cents() {
        let h = LedgerHarness::new().await;
        let cash = h.account_id(DefaultAccount::Cash).await;
        let equity = h.account_id(DefaultAccount::OwnersEquity).await;
        let request = EntryBuilder::new("Scaled")
            .debit(cash, dec!(100.0100))
            .credit(equity, dec!(100.01))
            .build();

        let entry = h.service.create_and_post(h.organization_id, request).await.unwrap();
        assert_eq!(entry.status, EntryStatus::Posted);
        assert!(h.service.trial_balance(h.organization_id).await.unwrap().is_balanced);
    }

    #[tokio::test]
    async fn test_document_total_must_equal_subtotal_plus_tax() {
        let h = LedgerHarness::new().await;
        let mut invoice = InvoiceBuilder::new(h.organization_id)
            .amounts(dec!(1000), dec!(100))
            .build();
        invoice.total = dec!(1100.009);
        h.service.save_document(&invoice).await.unwrap();

        let result = h.service.post_invoice(h.organization_id, invoice.id, None).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert!(h.service.entries(h.organization_id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_negative_lines_rejected() {
        let h = LedgerHarness::new().await;
        let cash = h.account_id(DefaultAccount::Cash).await;

        let empty = h.service.create_entry(h.organization_id, EntryBuilder::default().build()).await;
        assert_error_contains(&empty, "at least one line");

        let negative = EntryBuilder::default().debit(cash, dec!(-5)).build();
        let result = h.service.create_entry(h.organization_id, negative).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let h = LedgerHarness::new().await;
        let request = EntryBuilder::default()
            .transfer(core_kernel::AccountId::new(), h.account_id(DefaultAccount::Cash).await, dec!(1))
            .build();
        let result = h.service.create_and_post(h.organization_id, request).await;
        assert!(matches!(result, Err(LedgerError::NotFound { entity: "Account", .. })));
    }

    #[tokio::test]
    async fn test_parent_account_cannot_take_postings() {
        let h = LedgerHarness::new().await;
        let parent = Account::new(h.organization_id, "1900", "Other Assets", AccountType::Asset).as_parent();
        let parent = h.service.create_account(parent).await.unwrap();

        let request = EntryBuilder::default()
            .transfer(parent.id, h.account_id(DefaultAccount::OwnersEquity).await, dec!(10))
            .build();
        let result = h.service.create_and_post(h.organization_id, request).await;
        assert_error_contains(&result, "cannot take postings");
    }

    #[tokio::test]
    async fn test_draft_can_be_edited_and_deleted() {
        let h = LedgerHarness::new().await;
        let cash = h.account_id(DefaultAccount::Cash).await;
        let equity = h.account_id(DefaultAccount::OwnersEquity).await;
        let draft = h
            .service
            .create_entry(h.organization_id, EntryBuilder::default().transfer(cash, equity, dec!(10)).build())
            .await
            .unwrap();

        let updated = h
            .service
            .update_entry(
                h.organization_id,
                draft.id,
                EntryBuilder::default().transfer(cash, equity, dec!(25)).build().lines,
            )
            .await
            .unwrap();
        assert_amount_eq(updated.total_debit, dec!(25));

        h.service.delete_entry(h.organization_id, draft.id).await.unwrap();
        let result = h.service.entry(h.organization_id, draft.id).await;
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_posted_entry_cannot_be_edited_deleted_or_reposted() {
        let h = LedgerHarness::new().await;
        let entry = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(10)).await;

        let edit = h.service.update_entry(h.organization_id, entry.id, entry.lines.clone()).await;
        assert!(matches!(edit, Err(LedgerError::InvalidStateTransition { .. })));

        let delete = h.service.delete_entry(h.organization_id, entry.id).await;
        assert!(matches!(delete, Err(LedgerError::InvalidStateTransition { .. })));

        let repost = h.service.post_entry(h.organization_id, entry.id, None).await;
        assert!(matches!(repost, Err(LedgerError::InvalidStateTransition { .. })));
    }
}

// ============================================================================
// Void and Reversal Tests
// ============================================================================

mod void_and_reversal_tests {
    use super::*;

    #[tokio::test]
    async fn test_void_restores_balances_and_tombstones_rows() {
        let h = LedgerHarness::new().await;
        h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(300)).await;
        let entry = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(200)).await;

        let voided = h
            .service
            .void_entry(h.organization_id, entry.id, "Keyed twice", Some("auditor"))
            .await
            .unwrap();

        assert_eq!(voided.status, EntryStatus::Voided);
        assert_eq!(voided.void_reason.as_deref(), Some("Keyed twice"));
        assert_eq!(voided.voided_by.as_deref(), Some("auditor"));
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(300));
        assert_amount_eq(h.balance(DefaultAccount::OwnersEquity).await, dec!(300));

        let books = h.books().await;
        let rows: Vec<_> = books.rows.iter().filter(|r| r.journal_entry_id == entry.id).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.deleted_at.is_some()));
        assert_accounts_match_ledger(&h.accounts().await, &h.ledger_rows().await);
    }

    #[tokio::test]
    async fn test_void_requires_reason_and_posted_status() {
        let h = LedgerHarness::new().await;
        let entry = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(10)).await;

        let blank = h.service.void_entry(h.organization_id, entry.id, "  ", None).await;
        assert_error_contains(&blank, "reason");

        h.service.void_entry(h.organization_id, entry.id, "error", None).await.unwrap();
        let twice = h.service.void_entry(h.organization_id, entry.id, "again", None).await;
        assert!(matches!(twice, Err(LedgerError::InvalidStateTransition { .. })));
    }

    #[tokio::test]
    async fn test_reversal_offsets_original() {
        let h = LedgerHarness::new().await;
        let entry = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(80)).await;

        let reversal = h
            .service
            .reverse_entry(h.organization_id, entry.id, Some(DateFixtures::next_month()), None)
            .await
            .unwrap();

        assert_eq!(reversal.entry_type, EntryType::Reversal);
        assert_eq!(reversal.reversal_of, Some(entry.id));
        assert!(reversal.reference.is_none());
        assert_eq!(reversal.entry_date, DateFixtures::next_month());
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, Decimal::ZERO);

        let original = h.service.entry(h.organization_id, entry.id).await.unwrap();
        assert_eq!(original.status, EntryStatus::Posted);
        assert_eq!(original.reversed_by, Some(reversal.id));

        let again = h.service.reverse_entry(h.organization_id, entry.id, None, None).await;
        assert_error_contains(&again, "already reversed");
        let of_reversal = h.service.reverse_entry(h.organization_id, reversal.id, None, None).await;
        assert_error_contains(&of_reversal, "is a reversal");
    }

    #[tokio::test]
    async fn test_reversed_entry_cannot_be_voided() {
        let h = LedgerHarness::new().await;
        let entry = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(80)).await;
        h.service.reverse_entry(h.organization_id, entry.id, None, None).await.unwrap();

        let result = h.service.void_entry(h.organization_id, entry.id, "Duplicate", None).await;

        assert!(matches!(result, Err(LedgerError::InvalidStateTransition { .. })));
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, Decimal::ZERO);
        assert_amount_eq(h.balance(DefaultAccount::OwnersEquity).await, Decimal::ZERO);
        let original = h.service.entry(h.organization_id, entry.id).await.unwrap();
        assert_eq!(original.status, EntryStatus::Posted);
    }

    #[tokio::test]
    async fn test_voiding_reversal_frees_original() {
        let h = LedgerHarness::new().await;
        let entry = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(80)).await;
        let reversal = h.service.reverse_entry(h.organization_id, entry.id, None, None).await.unwrap();

        h.service
            .void_entry(h.organization_id, reversal.id, "Reversed the wrong entry", None)
            .await
            .unwrap();

        let original = h.service.entry(h.organization_id, entry.id).await.unwrap();
        assert_eq!(original.reversed_by, None);
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(80));

        h.service.void_entry(h.organization_id, entry.id, "Not needed", None).await.unwrap();
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, Decimal::ZERO);
        assert_amount_eq(h.balance(DefaultAccount::OwnersEquity).await, Decimal::ZERO);
        assert_accounts_match_ledger(&h.accounts().await, &h.ledger_rows().await);
    }
}

// ============================================================================
// Sales Translator Tests
// ============================================================================

mod sales_tests {
    use super::*;

    #[tokio::test]
    async fn test_invoice_posts_receivable_revenue_and_tax() {
        let h = LedgerHarness::new().await;
        let invoice = InvoiceBuilder::new(h.organization_id).build();
        h.service.save_document(&invoice).await.unwrap();

        let outcome = h.service.post_invoice(h.organization_id, invoice.id, Some("clerk")).await.unwrap();

        assert!(!outcome.already_posted);
        assert_eq!(outcome.document.status, InvoiceStatus::Sent);
        assert_eq!(outcome.document.journal_entry_id, Some(outcome.entry.id));
        assert_eq!(outcome.entry.entry_type, EntryType::Automated);
        assert_eq!(outcome.entry.posted_by.as_deref(), Some("clerk"));
        assert!(outcome.entry.references(DocumentKind::Invoice, *invoice.id.as_uuid()));
        assert_entry_balanced(&outcome.entry);

        let receivable = h.account(DefaultAccount::AccountsReceivable).await;
        assert_eq!(receivable.code, "1100");
        assert_account_balance(&receivable, dec!(1100), Decimal::ZERO, dec!(1100));
        assert_amount_eq(h.balance(DefaultAccount::SalesRevenue).await, AmountFixtures::subtotal());
        assert_amount_eq(h.balance(DefaultAccount::TaxPayable).await, AmountFixtures::tax());

        let stored: Invoice = h.service.document(h.organization_id, *invoice.id.as_uuid()).await.unwrap();
        assert_eq!(stored.receivable_account_id, Some(receivable.id));
    }

    #[tokio::test]
    async fn test_invoice_without_tax_has_two_lines() {
        let h = LedgerHarness::new().await;
        let invoice = InvoiceBuilder::new(h.organization_id).amounts(dec!(400), Decimal::ZERO).build();
        h.service.save_document(&invoice).await.unwrap();

        let outcome = h.service.post_invoice(h.organization_id, invoice.id, None).await.unwrap();
        assert_eq!(outcome.entry.lines.len(), 2);
        assert_amount_eq(h.balance(DefaultAccount::TaxPayable).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_posting_twice_returns_existing_entry() {
        let h = LedgerHarness::new().await;
        let invoice = InvoiceBuilder::new(h.organization_id).build();
        h.service.save_document(&invoice).await.unwrap();

        let first = h.service.post_invoice(h.organization_id, invoice.id, None).await.unwrap();
        let second = h.service.post_invoice(h.organization_id, invoice.id, None).await.unwrap();

        assert!(second.already_posted);
        assert_eq!(first.entry.id, second.entry.id);
        assert_eq!(h.service.entries(h.organization_id, None).await.unwrap().len(), 1);
        assert_amount_eq(h.balance(DefaultAccount::AccountsReceivable).await, dec!(1100));
    }

    #[tokio::test]
    async fn test_missing_invoice_is_not_found() {
        let h = LedgerHarness::new().await;
        let invoice = InvoiceBuilder::new(h.organization_id).build();
        let result = h.service.post_invoice(h.organization_id, invoice.id, None).await;
        assert!(matches!(result, Err(LedgerError::NotFound { entity: "Invoice", .. })));
    }

    #[tokio::test]
    async fn test_invoice_with_wrong_total_is_rejected_without_side_effects() {
        let h = LedgerHarness::new().await;
        let mut invoice = InvoiceBuilder::new(h.organization_id).build();
        invoice.total = dec!(1200);
        h.service.save_document(&invoice).await.unwrap();

        let result = h.service.post_invoice(h.organization_id, invoice.id, None).await;
        assert_error_contains(&result, "does not equal subtotal");
        assert!(h.service.entries(h.organization_id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_payment_marks_invoice_paid() {
        let h = LedgerHarness::new().await;
        let invoice = posted_invoice(&h).await;
        let payment = PaymentBuilder::for_invoice(&invoice).build();
        h.service.save_document(&payment).await.unwrap();

        let outcome = h.service.record_invoice_payment(h.organization_id, payment.id, None).await.unwrap();

        assert_entry_balanced(&outcome.entry);
        let stored: Invoice = h.service.document(h.organization_id, *invoice.id.as_uuid()).await.unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_amount_eq(stored.paid_amount, dec!(1100));
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(1100));
        assert_amount_eq(h.balance(DefaultAccount::AccountsReceivable).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_partial_then_final_payment() {
        let h = LedgerHarness::new().await;
        let invoice = posted_invoice(&h).await;

        let first = PaymentBuilder::for_invoice(&invoice).number("PAY-0001").amount(dec!(600)).build();
        h.service.save_document(&first).await.unwrap();
        h.service.record_invoice_payment(h.organization_id, first.id, None).await.unwrap();
        let stored: Invoice = h.service.document(h.organization_id, *invoice.id.as_uuid()).await.unwrap();
        assert_eq!(stored.status, InvoiceStatus::PartiallyPaid);

        let second = PaymentBuilder::for_invoice(&stored).number("PAY-0002").build();
        assert_amount_eq(second.amount, dec!(500));
        h.service.save_document(&second).await.unwrap();
        h.service.record_invoice_payment(h.organization_id, second.id, None).await.unwrap();
        let stored: Invoice = h.service.document(h.organization_id, *invoice.id.as_uuid()).await.unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_overpayment_is_rejected() {
        let h = LedgerHarness::new().await;
        let invoice = posted_invoice(&h).await;
        let payment = PaymentBuilder::for_invoice(&invoice).amount(dec!(1100.01)).build();
        h.service.save_document(&payment).await.unwrap();

        let result = h.service.record_invoice_payment(h.organization_id, payment.id, None).await;
        assert_error_contains(&result, "exceeds invoice");
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_payment_against_draft_invoice_is_rejected() {
        let h = LedgerHarness::new().await;
        let invoice = InvoiceBuilder::new(h.organization_id).build();
        h.service.save_document(&invoice).await.unwrap();
        let payment = PaymentBuilder::for_invoice(&invoice).build();
        h.service.save_document(&payment).await.unwrap();

        let result = h.service.record_invoice_payment(h.organization_id, payment.id, None).await;
        assert!(matches!(result, Err(LedgerError::InvalidStateTransition { entity: "Invoice", .. })));
    }

    #[tokio::test]
    async fn test_cancel_sent_invoice_voids_its_entry() {
        let h = LedgerHarness::new().await;
        let invoice = posted_invoice(&h).await;

        let outcome = h
            .service
            .cancel_invoice(h.organization_id, invoice.id, "Customer withdrew", None)
            .await
            .unwrap();

        assert_eq!(outcome.document.status, InvoiceStatus::Void);
        let voided = outcome.voided_entry.expect("posted invoice has an entry");
        assert_eq!(voided.status, EntryStatus::Voided);
        assert_amount_eq(h.balance(DefaultAccount::AccountsReceivable).await, Decimal::ZERO);
        assert_amount_eq(h.balance(DefaultAccount::SalesRevenue).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_cancel_draft_invoice_posts_nothing() {
        let h = LedgerHarness::new().await;
        let invoice = InvoiceBuilder::new(h.organization_id).build();
        h.service.save_document(&invoice).await.unwrap();

        let outcome = h.service.cancel_invoice(h.organization_id, invoice.id, "Duplicate", None).await.unwrap();
        assert!(outcome.voided_entry.is_none());
        assert_eq!(outcome.document.status, InvoiceStatus::Void);
    }

    #[tokio::test]
    async fn test_paid_invoice_cannot_be_cancelled() {
        let h = LedgerHarness::new().await;
        let invoice = posted_invoice(&h).await;
        let payment = PaymentBuilder::for_invoice(&invoice).build();
        h.service.save_document(&payment).await.unwrap();
        h.service.record_invoice_payment(h.organization_id, payment.id, None).await.unwrap();

        let result = h.service.cancel_invoice(h.organization_id, invoice.id, "Too late", None).await;
        assert!(matches!(result, Err(LedgerError::InvalidStateTransition { .. })));
    }

    #[tokio::test]
    async fn test_posted_document_cannot_be_deleted() {
        let h = LedgerHarness::new().await;
        let invoice = posted_invoice(&h).await;

        let result = h.service.delete_document::<Invoice>(h.organization_id, *invoice.id.as_uuid()).await;
        assert_error_contains(&result, "cancel it instead");

        let draft = InvoiceBuilder::new(h.organization_id).number("INV-0002").build();
        h.service.save_document(&draft).await.unwrap();
        h.service.delete_document::<Invoice>(h.organization_id, *draft.id.as_uuid()).await.unwrap();
    }

    #[tokio::test]
    async fn test_sales_receipt_debits_cash() {
        let h = LedgerHarness::new().await;
        let receipt = SalesReceipt::new(h.organization_id, "SR-0001", DateFixtures::posting_date(), dec!(200), dec!(20));
        h.service.save_document(&receipt).await.unwrap();

        h.service.complete_sales_receipt(h.organization_id, receipt.id, None).await.unwrap();

        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(220));
        assert_amount_eq(h.balance(DefaultAccount::SalesRevenue).await, dec!(200));
        assert_amount_eq(h.balance(DefaultAccount::AccountsReceivable).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_credit_note_mirrors_invoice_accounts() {
        let h = LedgerHarness::new().await;
        let invoice = posted_invoice(&h).await;
        let note = CreditNote::new(h.organization_id, "CN-0001", DateFixtures::next_month(), dec!(100), dec!(10))
            .for_invoice(invoice.id);
        h.service.save_document(&note).await.unwrap();

        let outcome = h.service.issue_credit_note(h.organization_id, note.id, None).await.unwrap();

        let stored: Invoice = h.service.document(h.organization_id, *invoice.id.as_uuid()).await.unwrap();
        assert_eq!(outcome.document.receivable_account_id, stored.receivable_account_id);
        assert_amount_eq(h.balance(DefaultAccount::AccountsReceivable).await, dec!(990));
        assert_amount_eq(h.balance(DefaultAccount::SalesRevenue).await, dec!(900));
        assert_amount_eq(h.balance(DefaultAccount::TaxPayable).await, dec!(90));
    }

    #[tokio::test]
    async fn test_sales_order_books_sale_and_cost() {
        let h = LedgerHarness::new().await;
        let product = saved_product(&h, ProductBuilder::new(h.organization_id).stock(dec!(10)).build()).await;
        let order = SalesOrderBuilder::new(h.organization_id)
            .line(product.id, dec!(4), dec!(12.50))
            .tax(dec!(5))
            .build();
        h.service.save_document(&order).await.unwrap();

        let outcome = h.service.confirm_sales_order(h.organization_id, order.id, None).await.unwrap();

        assert_eq!(outcome.entry.lines.len(), 5);
        assert_amount_eq(h.balance(DefaultAccount::AccountsReceivable).await, dec!(55));
        assert_amount_eq(h.balance(DefaultAccount::SalesRevenue).await, dec!(50));
        assert_amount_eq(h.balance(DefaultAccount::CostOfGoodsSold).await, dec!(20));
        assert_amount_eq(h.balance(DefaultAccount::Inventory).await, dec!(-20));

        let stored: Product = h.service.document(h.organization_id, *product.id.as_uuid()).await.unwrap();
        assert_amount_eq(stored.stock_quantity, dec!(6));
    }

    #[tokio::test]
    async fn test_paid_sales_order_debits_cash() {
        let h = LedgerHarness::new().await;
        let product = saved_product(&h, ProductBuilder::new(h.organization_id).untracked().build()).await;
        let order = SalesOrderBuilder::new(h.organization_id)
            .line(product.id, dec!(2), dec!(12.50))
            .paid()
            .build();
        h.service.save_document(&order).await.unwrap();

        h.service.confirm_sales_order(h.organization_id, order.id, None).await.unwrap();
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(25));
    }

    #[tokio::test]
    async fn test_sales_order_over_stock_writes_nothing() {
        let h = LedgerHarness::new().await;
        let product = saved_product(&h, ProductBuilder::new(h.organization_id).stock(dec!(3)).build()).await;
        let order = SalesOrderBuilder::new(h.organization_id)
            .line(product.id, dec!(2), dec!(12.50))
            .line(product.id, dec!(2), dec!(12.50))
            .build();
        h.service.save_document(&order).await.unwrap();

        let result = h.service.confirm_sales_order(h.organization_id, order.id, None).await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientStock { required, available, .. })
                if required == dec!(4) && available == dec!(3)
        ));
        assert!(h.ledger_rows().await.is_empty());
    }
}

// ============================================================================
// Purchase Translator Tests
// ============================================================================

mod purchase_tests {
    use super::*;

    #[tokio::test]
    async fn test_bill_approval_posts_expense_tax_and_payable() {
        let h = LedgerHarness::new().await;
        let bill = BillBuilder::new(h.organization_id).build();
        h.service.save_document(&bill).await.unwrap();

        let outcome = h.service.approve_bill(h.organization_id, bill.id, None).await.unwrap();

        assert_eq!(outcome.document.status, BillStatus::Approved);
        assert_amount_eq(h.balance(DefaultAccount::OperatingExpense).await, dec!(1000));
        assert_amount_eq(h.balance(DefaultAccount::InputTax).await, dec!(100));
        assert_amount_eq(h.balance(DefaultAccount::AccountsPayable).await, dec!(1100));
    }

    #[tokio::test]
    async fn test_bill_payment_settles_payable() {
        let h = LedgerHarness::new().await;
        let bill = BillBuilder::new(h.organization_id).build();
        h.service.save_document(&bill).await.unwrap();
        let bill = h.service.approve_bill(h.organization_id, bill.id, None).await.unwrap().document;

        let payment = bill_payment_for(&bill, Some(dec!(400)));
        h.service.save_document(&payment).await.unwrap();
        h.service.pay_bill(h.organization_id, payment.id, None).await.unwrap();

        assert_amount_eq(h.balance(DefaultAccount::AccountsPayable).await, dec!(700));
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(-400));
    }

    #[tokio::test]
    async fn test_cancel_approved_bill_voids_entry() {
        let h = LedgerHarness::new().await;
        let bill = BillBuilder::new(h.organization_id).build();
        h.service.save_document(&bill).await.unwrap();
        h.service.approve_bill(h.organization_id, bill.id, None).await.unwrap();

        let outcome = h.service.cancel_bill(h.organization_id, bill.id, "Disputed", None).await.unwrap();
        assert!(outcome.voided_entry.is_some());
        assert_amount_eq(h.balance(DefaultAccount::AccountsPayable).await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_expense_paid_from_cash() {
        let h = LedgerHarness::new().await;
        let expense = Expense::new(h.organization_id, "EXP-0001", DateFixtures::posting_date(), dec!(80), dec!(8))
            .with_category("Travel");
        h.service.save_document(&expense).await.unwrap();

        let outcome = h.service.approve_expense(h.organization_id, expense.id, None).await.unwrap();
        assert_eq!(outcome.document.status, ExpenseStatus::Approved);
        assert!(outcome.entry.description.contains("Travel"));
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(-88));
    }

    #[tokio::test]
    async fn test_rejected_expense_posts_nothing() {
        let h = LedgerHarness::new().await;
        let expense = Expense::new(h.organization_id, "EXP-0002", DateFixtures::posting_date(), dec!(80), dec!(0));
        h.service.save_document(&expense).await.unwrap();

        let rejected = h.service.reject_expense(h.organization_id, expense.id).await.unwrap();
        assert_eq!(rejected.status, ExpenseStatus::Rejected);
        let approve = h.service.approve_expense(h.organization_id, expense.id, None).await;
        assert!(matches!(approve, Err(LedgerError::InvalidStateTransition { .. })));
        assert!(h.ledger_rows().await.is_empty());
    }
}

// ============================================================================
// Inventory, Asset and Project Tests
// ============================================================================

mod inventory_tests {
    use super::*;

    #[tokio::test]
    async fn test_stock_increase_values_at_cost() {
        let h = LedgerHarness::new().await;
        let product = saved_product(&h, ProductBuilder::new(h.organization_id).build()).await;
        let adjustment = stock_adjustment(&product, AdjustmentDirection::Increase, dec!(10));
        h.service.save_document(&adjustment).await.unwrap();

        let outcome = h.service.apply_stock_adjustment(h.organization_id, adjustment.id, None).await.unwrap();

        assert_eq!(outcome.document.status, AdjustmentStatus::Applied);
        assert_eq!(outcome.document.previous_stock, Some(Decimal::ZERO));
        assert_eq!(outcome.document.new_stock, Some(dec!(10)));
        assert_amount_eq(outcome.entry.total_debit, dec!(50));
        assert_amount_eq(h.balance(DefaultAccount::Inventory).await, dec!(50));
        assert_amount_eq(h.balance(DefaultAccount::InventoryGain).await, dec!(50));

        let stored: Product = h.service.document(h.organization_id, *product.id.as_uuid()).await.unwrap();
        assert_amount_eq(stored.stock_quantity, dec!(10));
    }

    #[tokio::test]
    async fn test_stock_decrease_below_zero_is_refused() {
        let h = LedgerHarness::new().await;
        let product = saved_product(&h, ProductBuilder::new(h.organization_id).stock(dec!(2)).build()).await;
        let adjustment = stock_adjustment(&product, AdjustmentDirection::Decrease, dec!(3));
        h.service.save_document(&adjustment).await.unwrap();

        let result = h.service.apply_stock_adjustment(h.organization_id, adjustment.id, None).await;

        assert!(matches!(result, Err(LedgerError::InsufficientStock { .. })));
        let stored: Product = h.service.document(h.organization_id, *product.id.as_uuid()).await.unwrap();
        assert_amount_eq(stored.stock_quantity, dec!(2));
        assert!(h.service.entries(h.organization_id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_decrease_posts_loss() {
        let h = LedgerHarness::new().await;
        let product = saved_product(&h, ProductBuilder::new(h.organization_id).stock(dec!(5)).build()).await;
        let mut adjustment = stock_adjustment(&product, AdjustmentDirection::Decrease, dec!(2));
        adjustment.unit_cost = Some(dec!(7.5));
        h.service.save_document(&adjustment).await.unwrap();

        h.service.apply_stock_adjustment(h.organization_id, adjustment.id, None).await.unwrap();
        assert_amount_eq(h.balance(DefaultAccount::InventoryLoss).await, dec!(15));
        assert_amount_eq(h.balance(DefaultAccount::Inventory).await, dec!(-15));
    }

    #[tokio::test]
    async fn test_adjustment_without_cost_is_rejected() {
        let h = LedgerHarness::new().await;
        let product = saved_product(&h, ProductBuilder::new(h.organization_id).cost_price(Decimal::ZERO).build()).await;
        let adjustment = stock_adjustment(&product, AdjustmentDirection::Increase, dec!(1));
        h.service.save_document(&adjustment).await.unwrap();

        let result = h.service.apply_stock_adjustment(h.organization_id, adjustment.id, None).await;
        assert_error_contains(&result, "has no value");
    }
}

mod asset_and_project_tests {
    use super::*;

    #[tokio::test]
    async fn test_depreciation_posts_and_accumulates() {
        let h = LedgerHarness::new().await;
        let asset = FixedAsset::new(h.organization_id, "FA-001", "Delivery van", DateFixtures::year_start(), dec!(12000), 60)
            .with_salvage_value(dec!(2400));
        h.service.save_document(&asset).await.unwrap();

        let charge = h
            .service
            .schedule_depreciation(h.organization_id, asset.id, DateFixtures::january())
            .await
            .unwrap();
        assert_amount_eq(charge.amount, dec!(160));
        assert_eq!(charge.depreciation_date, DateFixtures::month_end());

        let outcome = h.service.post_depreciation(h.organization_id, charge.id, None).await.unwrap();
        assert_eq!(outcome.document.status, DepreciationStatus::Posted);
        assert_amount_eq(h.balance(DefaultAccount::DepreciationExpense).await, dec!(160));

        let stored: FixedAsset = h.service.document(h.organization_id, *asset.id.as_uuid()).await.unwrap();
        assert_amount_eq(stored.accumulated_depreciation, dec!(160));
        assert_amount_eq(stored.book_value(), dec!(11840));
    }

    #[tokio::test]
    async fn test_project_transactions_update_aggregates() {
        let h = LedgerHarness::new().await;
        let project = Project::new(h.organization_id, "PRJ-1", "Office fit-out");
        h.service.save_document(&project).await.unwrap();

        for (number, kind, amount) in [
            ("PT-1", ProjectTransactionKind::Revenue, dec!(900)),
            ("PT-2", ProjectTransactionKind::Expense, dec!(350)),
        ] {
            let transaction =
                ProjectTransaction::new(h.organization_id, number, project.id, DateFixtures::posting_date(), kind, amount);
            h.service.save_document(&transaction).await.unwrap();
            h.service
                .record_project_transaction(h.organization_id, transaction.id, None)
                .await
                .unwrap();
        }

        let stored: Project = h.service.document(h.organization_id, *project.id.as_uuid()).await.unwrap();
        assert_amount_eq(stored.profit(), dec!(550));
        assert_amount_eq(h.balance(DefaultAccount::Cash).await, dec!(550));
        assert_amount_eq(h.balance(DefaultAccount::ProjectRevenue).await, dec!(900));
        assert_amount_eq(h.balance(DefaultAccount::ProjectExpense).await, dec!(350));
    }
}

// ============================================================================
// Reconciliation Tests
// ============================================================================

mod reconciliation_tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_books_are_healthy() {
        let h = LedgerHarness::new().await;
        posted_invoice(&h).await;

        let report = h.service.health_check(h.organization_id).await.unwrap();
        assert!(report.is_healthy, "issues: {:?}", report.issues);

        let trial = h.service.trial_balance(h.organization_id).await.unwrap();
        assert!(trial.is_balanced);
        assert_amount_eq(trial.total_debit, dec!(1100));
        assert_eq!(trial.lines.len(), 3);
    }

    #[tokio::test]
    async fn test_recalculate_corrects_drifted_account() {
        let h = LedgerHarness::new().await;
        posted_invoice(&h).await;
        let receivable = h.account_id(DefaultAccount::AccountsReceivable).await;
        h.store
            .edit(h.organization_id, |books| {
                let account = books.accounts.iter_mut().find(|a| a.id == receivable).unwrap();
                account.set_balances(dec!(999), Decimal::ZERO);
            })
            .await;

        let report = h.service.health_check(h.organization_id).await.unwrap();
        assert_eq!(report.issues_of(IssueKind::BalanceMismatch).count(), 1);

        let recalculated = h.service.recalculate(h.organization_id).await.unwrap();
        assert_eq!(recalculated.corrections.len(), 1);
        assert_amount_eq(recalculated.corrections[0].previous_debit, dec!(999));
        assert_amount_eq(h.balance(DefaultAccount::AccountsReceivable).await, dec!(1100));
        assert!(h.service.health_check(h.organization_id).await.unwrap().is_healthy);
    }

    #[tokio::test]
    async fn test_skewed_posted_entry_is_reported() {
        let h = LedgerHarness::new().await;
        let entry = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(250)).await;
        h.store
            .edit(h.organization_id, |books| {
                let stored = books.entries.iter_mut().find(|e| e.id == entry.id).unwrap();
                stored.lines[0].debit += dec!(7);
            })
            .await;

        let report = h.service.health_check(h.organization_id).await.unwrap();

        assert!(!report.is_healthy);
        assert_eq!(report.issues.len(), 1, "issues: {:?}", report.issues);
        let issue = &report.issues[0];
        assert_eq!(issue.kind, IssueKind::UnbalancedEntry);
        assert_eq!(issue.severity, Severity::High);
        assert_eq!(issue.journal_entry_id, Some(entry.id));
        assert_eq!(issue.difference, Some(dec!(7)));
    }

    #[tokio::test]
    async fn test_trial_balance_drift_is_reported() {
        let h = LedgerHarness::new().await;
        h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(250)).await;
        let cash = h.account_id(DefaultAccount::Cash).await;
        h.store
            .edit(h.organization_id, |books| {
                let account = books.accounts.iter_mut().find(|a| a.id == cash).unwrap();
                account.set_balances(dec!(260), Decimal::ZERO);
            })
            .await;

        let report = h.service.health_check(h.organization_id).await.unwrap();

        let trial: Vec<_> = report.issues_of(IssueKind::TrialBalanceUnbalanced).collect();
        assert_eq!(trial.len(), 1);
        assert_eq!(trial[0].severity, Severity::High);
        assert_eq!(trial[0].difference, Some(dec!(10)));
        assert_eq!(report.issues_of(IssueKind::BalanceMismatch).count(), 1);
        assert!(!h.service.trial_balance(h.organization_id).await.unwrap().is_balanced);
    }

    #[tokio::test]
    async fn test_recalculate_refuses_unbalanced_ledger() {
        let h = LedgerHarness::new().await;
        posted_invoice(&h).await;
        h.store
            .edit(h.organization_id, |books| books.rows[0].debit += dec!(10))
            .await;
        let before = h.accounts().await;

        let result = h.service.recalculate(h.organization_id).await;

        assert!(matches!(
            result,
            Err(LedgerError::Corruption { difference, .. }) if difference == dec!(10)
        ));
        assert_eq!(h.accounts().await, before);

        let response = ActionResponse::from(result);
        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("corruption"));
    }

    #[tokio::test]
    async fn test_orphaned_row_is_reported() {
        let h = LedgerHarness::new().await;
        let entry = h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(10)).await;
        h.store
            .edit(h.organization_id, |books| books.entries.retain(|e| e.id != entry.id))
            .await;

        let report = h.service.health_check(h.organization_id).await.unwrap();
        assert!(!report.is_healthy);
        assert_eq!(report.issues_of(IssueKind::OrphanedEntry).count(), 2);
    }

    #[tokio::test]
    async fn test_accounting_equation_holds_after_mixed_activity() {
        let h = LedgerHarness::new().await;
        h.post_transfer(DefaultAccount::Cash, DefaultAccount::OwnersEquity, dec!(2000)).await;
        posted_invoice(&h).await;
        let bill = BillBuilder::new(h.organization_id).amounts(dec!(300), dec!(0)).build();
        h.service.save_document(&bill).await.unwrap();
        h.service.approve_bill(h.organization_id, bill.id, None).await.unwrap();

        let equation = h.service.accounting_equation(h.organization_id).await.unwrap();
        assert!(equation.is_balanced);
        assert_amount_eq(equation.net_income, dec!(700));
        assert_ledger_balanced(&h.ledger_rows().await);
        assert_accounts_match_ledger(&h.accounts().await, &h.ledger_rows().await);
    }

    #[tokio::test]
    async fn test_organizations_are_isolated() {
        let h = LedgerHarness::new().await;
        posted_invoice(&h).await;

        let other = OrganizationId::new();
        h.service.initialize_chart(other).await.unwrap();
        let trial = h.service.trial_balance(other).await.unwrap();
        assert!(trial.lines.is_empty());
    }
}
