//! Document-to-entry translators
//!
//! Every translator follows the same contract:
//!
//! 1. Load the source document (`NotFound` if missing).
//! 2. If a live journal entry already references it, return that entry.
//! 3. Check the lifecycle transition that triggers posting.
//! 4. Resolve accounts: the document's override, else the default for the role.
//! 5. Build the line items with a pure function of (document, accounts).
//! 6. Create and post the entry, then stamp accounts and the entry id back
//!    onto the document and update its aggregates.
//!
//! Translators run inside the caller's transaction, so any failure leaves no
//! trace once the caller rolls back.

pub mod sales;
pub mod purchases;
pub mod inventory;
pub mod assets;
pub mod projects;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{ensure_cents, AccountId};

use crate::config::LedgerConfig;
use crate::documents::SourceDocument;
use crate::engine;
use crate::error::LedgerError;
use crate::journal::{EntryType, JournalEntry, LineItem, NewJournalEntry};
use crate::lifecycle::Effect;
use crate::ports::LedgerTransaction;

/// Result of posting a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingOutcome<D> {
    /// The document as stored after posting
    pub document: D,
    /// The entry that references the document
    pub entry: JournalEntry,
    /// True if the document had been posted before this call
    pub already_posted: bool,
}

/// Result of cancelling a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationOutcome<D> {
    pub document: D,
    /// The voided entry, if the document had been posted
    pub voided_entry: Option<JournalEntry>,
}

/// Returns the live entry already posted for a document, if any
pub(crate) async fn existing_posting<D: SourceDocument>(
    tx: &mut dyn LedgerTransaction,
    document: &D,
) -> Result<Option<JournalEntry>, LedgerError> {
    let existing = tx.entry_by_reference(D::KIND, document.document_id()).await?;
    if let Some(entry) = &existing {
        debug!(
            kind = %D::KIND,
            document_id = %document.document_id(),
            entry_number = %entry.entry_number,
            "Document already posted"
        );
    }
    Ok(existing)
}

/// Creates and posts the automated entry for a document
pub(crate) async fn post_document<D: SourceDocument>(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    document: &D,
    entry_date: NaiveDate,
    description: String,
    lines: Vec<LineItem>,
    actor: Option<&str>,
) -> Result<JournalEntry, LedgerError> {
    let mut request = NewJournalEntry::new(entry_date, description)
        .with_type(EntryType::Automated)
        .with_reference(document.entry_reference())
        .with_lines(lines);
    request.actor = actor.map(str::to_string);
    engine::create_and_post(tx, config, request).await
}

/// Voids the live entry of a document when the transition calls for it
pub(crate) async fn void_posting<D: SourceDocument>(
    tx: &mut dyn LedgerTransaction,
    document: &D,
    effect: Effect,
    reason: &str,
    actor: Option<&str>,
) -> Result<Option<JournalEntry>, LedgerError> {
    if effect != Effect::VoidLedger {
        return Ok(None);
    }
    match tx.entry_by_reference(D::KIND, document.document_id()).await? {
        Some(entry) => Ok(Some(engine::void_entry(tx, entry.id, reason, actor).await?)),
        None => Ok(None),
    }
}

/// Rejects a document total that is not exactly subtotal plus tax, amounts
/// below zero, and fractions of a cent
pub(crate) fn check_amounts(what: &str, subtotal: Decimal, tax: Decimal, total: Decimal) -> Result<(), LedgerError> {
    if subtotal.is_sign_negative() || tax.is_sign_negative() {
        return Err(LedgerError::validation(format!(
            "{} amounts must not be negative (subtotal {}, tax {})",
            what, subtotal, tax
        )));
    }
    if total <= Decimal::ZERO {
        return Err(LedgerError::validation(format!("{} total must be greater than zero", what)));
    }
    ensure_cents(subtotal, "subtotal")?;
    ensure_cents(tax, "tax")?;
    ensure_cents(total, "total")?;
    if subtotal + tax != total {
        return Err(LedgerError::validation(format!(
            "{} total {} does not equal subtotal {} plus tax {}",
            what, total, subtotal, tax
        )));
    }
    Ok(())
}

/// Lines for a sale: receivable or cash debited with the total, revenue and
/// tax credited
pub fn sale_lines(
    debit_account: AccountId,
    revenue_account: AccountId,
    tax_account: Option<AccountId>,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
) -> Vec<LineItem> {
    let mut lines = vec![LineItem::debit(debit_account, total)];
    if !subtotal.is_zero() {
        lines.push(LineItem::credit(revenue_account, subtotal));
    }
    if let Some(tax_account) = tax_account.filter(|_| tax > Decimal::ZERO) {
        lines.push(LineItem::credit(tax_account, tax));
    }
    lines
}

/// Lines for a purchase: expense and input tax debited, the paying or owing
/// account credited with the total
pub fn purchase_lines(
    expense_account: AccountId,
    tax_account: Option<AccountId>,
    credit_account: AccountId,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
) -> Vec<LineItem> {
    let mut lines = Vec::with_capacity(3);
    if !subtotal.is_zero() {
        lines.push(LineItem::debit(expense_account, subtotal));
    }
    if let Some(tax_account) = tax_account.filter(|_| tax > Decimal::ZERO) {
        lines.push(LineItem::debit(tax_account, tax));
    }
    lines.push(LineItem::credit(credit_account, total));
    lines
}

/// Two-line transfer: debit one account, credit another
pub fn transfer_lines(debit_account: AccountId, credit_account: AccountId, amount: Decimal) -> Vec<LineItem> {
    vec![
        LineItem::debit(debit_account, amount),
        LineItem::credit(credit_account, amount),
    ]
}
