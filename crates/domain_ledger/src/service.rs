//! Ledger service
//!
//! The entry point for callers. Each method opens exactly one transaction on
//! the store, runs the operation through it and commits on success. Any error
//! rolls everything back, so a failed posting leaves neither an entry, ledger
//! rows, balance changes nor document changes behind.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use core_kernel::{
    AccountId, AssetId, BillId, BillPaymentId, CreditNoteId, DateRange, DepreciationId, ExpenseId,
    FiscalPeriod, InvoiceId, JournalEntryId, OrganizationId, PaymentId, ProjectTransactionId,
    ReceiptId, SalesOrderId, StockAdjustmentId,
};

use crate::account::Account;
use crate::chart::{self, DefaultAccount};
use crate::config::LedgerConfig;
use crate::documents::assets::{AssetDepreciation, FixedAsset};
use crate::documents::inventory::StockAdjustment;
use crate::documents::projects::ProjectTransaction;
use crate::documents::purchases::{Bill, BillPayment, Expense};
use crate::documents::sales::{CreditNote, Invoice, Payment, SalesOrder, SalesReceipt};
use crate::documents::{load_document, save_document, SourceDocument};
use crate::engine;
use crate::error::LedgerError;
use crate::journal::{EntryStatus, JournalEntry, LineItem, NewJournalEntry};
use crate::ports::{LedgerStore, LedgerTransaction};
use crate::reconciliation::{self, HealthReport, RecalculationReport};
use crate::reports::{self, AccountStatement, AccountingEquation, TrialBalance};
use crate::translators::{self, CancellationOutcome, PostingOutcome};

/// Runs `$body` inside one transaction of `$org`, committing on success
macro_rules! in_transaction {
    ($service:expr, $org:expr, |$tx:ident| $body:expr) => {{
        let mut transaction = $service.store.begin($org).await?;
        let result = {
            let $tx: &mut dyn LedgerTransaction = transaction.as_mut();
            $body.await
        };
        $service.finish(transaction, result).await
    }};
}

/// Like `in_transaction!`, but replays once in a fresh transaction when the
/// store reports that the document was posted concurrently
macro_rules! posting {
    ($service:expr, $org:expr, |$tx:ident| $body:expr) => {{
        match in_transaction!($service, $org, |$tx| $body) {
            Err(error) if error.is_already_posted() => {
                debug!(%error, "Posting lost a race; replaying");
                in_transaction!($service, $org, |$tx| $body)
            }
            other => other,
        }
    }};
}

/// General ledger service over a storage port
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    config: LedgerConfig,
}

impl LedgerService {
    /// Creates a service over a store
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    async fn finish<T>(
        &self,
        mut tx: Box<dyn LedgerTransaction>,
        result: Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(%rollback, %error, "Rollback failed");
                }
                Err(error)
            }
        }
    }

    // Chart of accounts

    /// Creates the standard default accounts that are missing
    #[instrument(skip_all, fields(organization_id = %organization_id))]
    pub async fn initialize_chart(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Account>, LedgerError> {
        in_transaction!(self, organization_id, |tx| chart::initialize_chart(tx, &self.config))
    }

    /// Adds an account to the chart
    ///
    /// The account starts with zero balances whatever it was built with.
    ///
    /// # Errors
    ///
    /// * `Validation` - empty code or name, a taken code, or a parent that is
    ///   not flagged as a parent account
    /// * `NotFound` - the parent does not exist
    #[instrument(skip_all, fields(organization_id = %account.organization_id, code = %account.code))]
    pub async fn create_account(&self, account: Account) -> Result<Account, LedgerError> {
        in_transaction!(self, account.organization_id, |tx| create_account(tx, account))
    }

    /// Tombstones an account with no balance and no active children
    #[instrument(skip_all, fields(organization_id = %organization_id, account_id = %id))]
    pub async fn delete_account(
        &self,
        organization_id: OrganizationId,
        id: AccountId,
    ) -> Result<Account, LedgerError> {
        in_transaction!(self, organization_id, |tx| delete_account(tx, id))
    }

    pub async fn accounts(&self, organization_id: OrganizationId) -> Result<Vec<Account>, LedgerError> {
        in_transaction!(self, organization_id, |tx| async move {
            Ok::<_, LedgerError>(tx.accounts().await?)
        })
    }

    pub async fn account(
        &self,
        organization_id: OrganizationId,
        id: AccountId,
    ) -> Result<Account, LedgerError> {
        in_transaction!(self, organization_id, |tx| async move {
            tx.account(id)
                .await?
                .ok_or_else(|| LedgerError::not_found("Account", id))
        })
    }

    /// Finds or creates the default account for a role
    #[instrument(skip_all, fields(organization_id = %organization_id, role = ?role))]
    pub async fn resolve_default_account(
        &self,
        organization_id: OrganizationId,
        role: DefaultAccount,
    ) -> Result<Account, LedgerError> {
        in_transaction!(self, organization_id, |tx| chart::resolve_default(tx, &self.config, role))
    }

    // Journal entries

    #[instrument(skip_all, fields(organization_id = %organization_id))]
    pub async fn create_entry(
        &self,
        organization_id: OrganizationId,
        request: NewJournalEntry,
    ) -> Result<JournalEntry, LedgerError> {
        in_transaction!(self, organization_id, |tx| engine::create_entry(tx, &self.config, request))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, entry_id = %id))]
    pub async fn update_entry(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
        lines: Vec<LineItem>,
    ) -> Result<JournalEntry, LedgerError> {
        in_transaction!(self, organization_id, |tx| engine::update_entry(tx, &self.config, id, lines))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, entry_id = %id))]
    pub async fn delete_entry(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        in_transaction!(self, organization_id, |tx| engine::delete_entry(tx, id))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, entry_id = %id))]
    pub async fn post_entry(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
        actor: Option<&str>,
    ) -> Result<JournalEntry, LedgerError> {
        in_transaction!(self, organization_id, |tx| engine::post_entry(tx, id, actor))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id))]
    pub async fn create_and_post(
        &self,
        organization_id: OrganizationId,
        request: NewJournalEntry,
    ) -> Result<JournalEntry, LedgerError> {
        in_transaction!(self, organization_id, |tx| engine::create_and_post(tx, &self.config, request))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, entry_id = %id))]
    pub async fn void_entry(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
        reason: &str,
        actor: Option<&str>,
    ) -> Result<JournalEntry, LedgerError> {
        in_transaction!(self, organization_id, |tx| engine::void_entry(tx, id, reason, actor))
    }

    /// Posts a reversal of a posted entry, dated `entry_date` or the original date
    #[instrument(skip_all, fields(organization_id = %organization_id, entry_id = %id))]
    pub async fn reverse_entry(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
        entry_date: Option<NaiveDate>,
        actor: Option<&str>,
    ) -> Result<JournalEntry, LedgerError> {
        in_transaction!(self, organization_id, |tx| engine::reverse_entry(
            tx,
            &self.config,
            id,
            entry_date,
            actor
        ))
    }

    pub async fn entry(
        &self,
        organization_id: OrganizationId,
        id: JournalEntryId,
    ) -> Result<JournalEntry, LedgerError> {
        in_transaction!(self, organization_id, |tx| async move {
            tx.entry(id)
                .await?
                .ok_or_else(|| LedgerError::not_found("Journal entry", id))
        })
    }

    pub async fn entries(
        &self,
        organization_id: OrganizationId,
        status: Option<EntryStatus>,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        in_transaction!(self, organization_id, |tx| async move {
            Ok::<_, LedgerError>(tx.entries(status).await?)
        })
    }

    // Source documents

    /// Stores a document on behalf of the CRUD side
    pub async fn save_document<D: SourceDocument>(&self, document: &D) -> Result<(), LedgerError> {
        in_transaction!(self, document.organization_id(), |tx| save_document(tx, document))
    }

    pub async fn document<D: SourceDocument>(
        &self,
        organization_id: OrganizationId,
        id: Uuid,
    ) -> Result<D, LedgerError> {
        in_transaction!(self, organization_id, |tx| load_document::<D>(tx, id))
    }

    /// Tombstones a document that has no live journal entry
    pub async fn delete_document<D: SourceDocument>(
        &self,
        organization_id: OrganizationId,
        id: Uuid,
    ) -> Result<(), LedgerError> {
        in_transaction!(self, organization_id, |tx| delete_document::<D>(tx, id))
    }

    /// Schedules the straight-line charge of one period for an asset
    #[instrument(skip_all, fields(organization_id = %organization_id, asset_id = %asset_id, period = %period))]
    pub async fn schedule_depreciation(
        &self,
        organization_id: OrganizationId,
        asset_id: AssetId,
        period: FiscalPeriod,
    ) -> Result<AssetDepreciation, LedgerError> {
        in_transaction!(self, organization_id, |tx| async move {
            let asset: FixedAsset = load_document(tx, *asset_id.as_uuid()).await?;
            let charge = asset.schedule_depreciation(period);
            save_document(tx, &charge).await?;
            Ok::<_, LedgerError>(charge)
        })
    }

    // Translators

    #[instrument(skip_all, fields(organization_id = %organization_id, invoice_id = %id))]
    pub async fn post_invoice(
        &self,
        organization_id: OrganizationId,
        id: InvoiceId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<Invoice>, LedgerError> {
        posting!(self, organization_id, |tx| translators::sales::post_invoice(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, payment_id = %id))]
    pub async fn record_invoice_payment(
        &self,
        organization_id: OrganizationId,
        id: PaymentId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<Payment>, LedgerError> {
        posting!(self, organization_id, |tx| translators::sales::record_invoice_payment(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, invoice_id = %id))]
    pub async fn cancel_invoice(
        &self,
        organization_id: OrganizationId,
        id: InvoiceId,
        reason: &str,
        actor: Option<&str>,
    ) -> Result<CancellationOutcome<Invoice>, LedgerError> {
        in_transaction!(self, organization_id, |tx| translators::sales::cancel_invoice(
            tx, id, reason, actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, receipt_id = %id))]
    pub async fn complete_sales_receipt(
        &self,
        organization_id: OrganizationId,
        id: ReceiptId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<SalesReceipt>, LedgerError> {
        posting!(self, organization_id, |tx| translators::sales::complete_sales_receipt(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, credit_note_id = %id))]
    pub async fn issue_credit_note(
        &self,
        organization_id: OrganizationId,
        id: CreditNoteId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<CreditNote>, LedgerError> {
        posting!(self, organization_id, |tx| translators::sales::issue_credit_note(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, sales_order_id = %id))]
    pub async fn confirm_sales_order(
        &self,
        organization_id: OrganizationId,
        id: SalesOrderId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<SalesOrder>, LedgerError> {
        posting!(self, organization_id, |tx| translators::sales::confirm_sales_order(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, bill_id = %id))]
    pub async fn approve_bill(
        &self,
        organization_id: OrganizationId,
        id: BillId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<Bill>, LedgerError> {
        posting!(self, organization_id, |tx| translators::purchases::approve_bill(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, bill_payment_id = %id))]
    pub async fn pay_bill(
        &self,
        organization_id: OrganizationId,
        id: BillPaymentId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<BillPayment>, LedgerError> {
        posting!(self, organization_id, |tx| translators::purchases::pay_bill(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, bill_id = %id))]
    pub async fn cancel_bill(
        &self,
        organization_id: OrganizationId,
        id: BillId,
        reason: &str,
        actor: Option<&str>,
    ) -> Result<CancellationOutcome<Bill>, LedgerError> {
        in_transaction!(self, organization_id, |tx| translators::purchases::cancel_bill(
            tx, id, reason, actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, expense_id = %id))]
    pub async fn approve_expense(
        &self,
        organization_id: OrganizationId,
        id: ExpenseId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<Expense>, LedgerError> {
        posting!(self, organization_id, |tx| translators::purchases::approve_expense(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, expense_id = %id))]
    pub async fn reject_expense(
        &self,
        organization_id: OrganizationId,
        id: ExpenseId,
    ) -> Result<Expense, LedgerError> {
        in_transaction!(self, organization_id, |tx| translators::purchases::reject_expense(tx, id))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, adjustment_id = %id))]
    pub async fn apply_stock_adjustment(
        &self,
        organization_id: OrganizationId,
        id: StockAdjustmentId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<StockAdjustment>, LedgerError> {
        posting!(self, organization_id, |tx| translators::inventory::apply_stock_adjustment(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, depreciation_id = %id))]
    pub async fn post_depreciation(
        &self,
        organization_id: OrganizationId,
        id: DepreciationId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<AssetDepreciation>, LedgerError> {
        posting!(self, organization_id, |tx| translators::assets::post_depreciation(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    #[instrument(skip_all, fields(organization_id = %organization_id, project_transaction_id = %id))]
    pub async fn record_project_transaction(
        &self,
        organization_id: OrganizationId,
        id: ProjectTransactionId,
        actor: Option<&str>,
    ) -> Result<PostingOutcome<ProjectTransaction>, LedgerError> {
        posting!(self, organization_id, |tx| translators::projects::record_project_transaction(
            tx,
            &self.config,
            id,
            actor
        ))
    }

    // Reconciliation

    /// Runs the read-only health checks; nothing is written
    #[instrument(skip_all, fields(organization_id = %organization_id))]
    pub async fn health_check(&self, organization_id: OrganizationId) -> Result<HealthReport, LedgerError> {
        let report: HealthReport = in_transaction!(self, organization_id, |tx| reconciliation::health_check(
            tx,
            &self.config
        ))?;
        info!(
            healthy = report.is_healthy,
            issues = report.issues.len(),
            "Ledger health check finished"
        );
        Ok(report)
    }

    /// Rebuilds account balances from the ledger
    ///
    /// # Errors
    ///
    /// `Corruption` if the ledger itself is unbalanced; no account changes
    #[instrument(skip_all, fields(organization_id = %organization_id))]
    pub async fn recalculate(
        &self,
        organization_id: OrganizationId,
    ) -> Result<RecalculationReport, LedgerError> {
        in_transaction!(self, organization_id, |tx| reconciliation::recalculate(tx, &self.config))
    }

    // Reports

    pub async fn trial_balance(&self, organization_id: OrganizationId) -> Result<TrialBalance, LedgerError> {
        in_transaction!(self, organization_id, |tx| reports::trial_balance(tx, &self.config))
    }

    pub async fn accounting_equation(
        &self,
        organization_id: OrganizationId,
    ) -> Result<AccountingEquation, LedgerError> {
        in_transaction!(self, organization_id, |tx| reports::accounting_equation(tx, &self.config))
    }

    pub async fn account_statement(
        &self,
        organization_id: OrganizationId,
        account_id: AccountId,
        dates: DateRange,
    ) -> Result<AccountStatement, LedgerError> {
        in_transaction!(self, organization_id, |tx| reports::account_statement(tx, account_id, dates))
    }

    /// Total balance of the leaf accounts below a parent
    pub async fn rollup_balance(
        &self,
        organization_id: OrganizationId,
        root: AccountId,
    ) -> Result<Decimal, LedgerError> {
        in_transaction!(self, organization_id, |tx| async move {
            let accounts = tx.accounts().await?;
            if !accounts.iter().any(|a| a.id == root) {
                return Err(LedgerError::not_found("Account", root));
            }
            Ok(reports::rollup_balance(&accounts, root))
        })
    }
}

async fn create_account(
    tx: &mut dyn LedgerTransaction,
    mut account: Account,
) -> Result<Account, LedgerError> {
    if account.code.trim().is_empty() || account.name.trim().is_empty() {
        return Err(LedgerError::validation("account code and name are required"));
    }
    if tx.account_by_code(&account.code).await?.is_some() {
        return Err(LedgerError::validation(format!(
            "account code {} already exists",
            account.code
        )));
    }
    if let Some(parent_id) = account.parent_id {
        let parent = tx
            .account(parent_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Account", parent_id))?;
        if !parent.is_parent {
            return Err(LedgerError::validation(format!(
                "account {} is not a parent account",
                parent.code
            )));
        }
        if parent.account_type != account.account_type {
            return Err(LedgerError::validation(format!(
                "account {} is {} but its parent {} is {}",
                account.code, account.account_type, parent.code, parent.account_type
            )));
        }
    }

    account.set_balances(Decimal::ZERO, Decimal::ZERO);
    account.deleted_at = None;
    tx.insert_account(&account).await?;
    info!(code = %account.code, name = %account.name, "Created account");
    Ok(account)
}

async fn delete_account(tx: &mut dyn LedgerTransaction, id: AccountId) -> Result<Account, LedgerError> {
    let accounts = tx.accounts().await?;
    let mut account = accounts
        .iter()
        .find(|a| a.id == id)
        .cloned()
        .ok_or_else(|| LedgerError::not_found("Account", id))?;
    if !account.has_zero_balances() {
        return Err(LedgerError::validation(format!(
            "account {} has a balance of {} and cannot be deleted",
            account.code, account.current_balance
        )));
    }
    if accounts.iter().any(|a| a.parent_id == Some(id)) {
        return Err(LedgerError::validation(format!(
            "account {} still has child accounts",
            account.code
        )));
    }

    let now = Utc::now();
    account.is_active = false;
    account.updated_at = now;
    account.deleted_at = Some(now);
    tx.update_account(&account).await?;
    info!(code = %account.code, "Deleted account");
    Ok(account)
}

async fn delete_document<D: SourceDocument>(
    tx: &mut dyn LedgerTransaction,
    id: Uuid,
) -> Result<(), LedgerError> {
    let document: D = load_document(tx, id).await?;
    if let Some(entry) = tx.entry_by_reference(D::KIND, id).await? {
        return Err(LedgerError::validation(format!(
            "{} {} is posted as {}; cancel it instead",
            D::KIND.entity_name(),
            document.document_number().unwrap_or("?"),
            entry.entry_number
        )));
    }
    tx.delete_document(D::KIND, id).await?;
    Ok(())
}
