//! Journal entry engine
//!
//! Transaction-level operations on journal entries. Callers own the
//! transaction; every function here either completes all of its writes or
//! returns an error, after which the caller rolls back.
//!
//! State machine: `Draft -> Posted -> Voided`. Drafts may be edited or
//! deleted. Posted entries are changed only by voiding or by a separate
//! reversal entry.

use chrono::Utc;
use tracing::{error, info};

use core_kernel::money::{ensure_cents, ensure_non_negative};
use core_kernel::JournalEntryId;

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::journal::{EntryStatus, EntryType, JournalEntry, LineItem, NewJournalEntry};
use crate::ledger::{post_entry_lines, unpost_entry_lines};
use crate::ports::LedgerTransaction;

/// Checks a set of lines before they are stored
///
/// # Errors
///
/// * `Validation` - no lines, a negative amount or a fraction of a cent, a
///   line with both sides zero, or an account that cannot take postings
/// * `NotFound` - a referenced account does not exist
pub async fn validate_lines(
    tx: &mut dyn LedgerTransaction,
    lines: &[LineItem],
) -> Result<(), LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::validation("journal entry must have at least one line item"));
    }
    for (index, line) in lines.iter().enumerate() {
        ensure_non_negative(line.debit, "debit")?;
        ensure_non_negative(line.credit, "credit")?;
        ensure_cents(line.debit, "debit")?;
        ensure_cents(line.credit, "credit")?;
        if line.debit.is_zero() && line.credit.is_zero() {
            return Err(LedgerError::validation(format!(
                "line {} has neither a debit nor a credit amount",
                index + 1
            )));
        }
        let account = tx
            .account(line.account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Account", line.account_id))?;
        if !account.can_post() {
            return Err(LedgerError::validation(format!(
                "account {} ({}) is a parent or inactive account and cannot take postings",
                account.code, account.name
            )));
        }
    }
    Ok(())
}

async fn load_entry(
    tx: &mut dyn LedgerTransaction,
    id: JournalEntryId,
) -> Result<JournalEntry, LedgerError> {
    tx.entry(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Journal entry", id))
}

fn require_status(entry: &JournalEntry, required: EntryStatus, target: EntryStatus) -> Result<(), LedgerError> {
    if entry.status != required {
        error!(
            entry_number = %entry.entry_number,
            from = ?entry.status,
            to = ?target,
            "Rejected journal entry transition"
        );
        return Err(LedgerError::invalid_transition("Journal entry", entry.status, target));
    }
    Ok(())
}

/// Creates a draft entry with the next sequential number
///
/// # Errors
///
/// Line validation errors, or `AlreadyPosted` if a live entry already
/// references the same document
pub async fn create_entry(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    request: NewJournalEntry,
) -> Result<JournalEntry, LedgerError> {
    validate_lines(tx, &request.lines).await?;

    let last = tx.last_entry_number().await?;
    let number = config.next_entry_number(last.as_deref());
    let entry = JournalEntry::draft(tx.organization_id(), number, request, config.balance_tolerance);

    match tx.insert_entry(&entry).await {
        Ok(()) => Ok(entry),
        Err(e) if e.is_conflict() => match &entry.reference {
            Some(reference) => Err(LedgerError::AlreadyPosted {
                reference: reference.to_string(),
            }),
            None => Err(e.into()),
        },
        Err(e) => Err(e.into()),
    }
}

/// Replaces the lines of a draft entry
pub async fn update_entry(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: JournalEntryId,
    lines: Vec<LineItem>,
) -> Result<JournalEntry, LedgerError> {
    let mut entry = load_entry(tx, id).await?;
    require_status(&entry, EntryStatus::Draft, EntryStatus::Draft)?;
    validate_lines(tx, &lines).await?;

    entry.set_lines(lines, config.balance_tolerance);
    tx.update_entry(&entry).await?;
    Ok(entry)
}

/// Deletes a draft entry; returns the deleted record
pub async fn delete_entry(
    tx: &mut dyn LedgerTransaction,
    id: JournalEntryId,
) -> Result<JournalEntry, LedgerError> {
    let entry = load_entry(tx, id).await?;
    if !entry.is_draft() {
        error!(entry_number = %entry.entry_number, status = ?entry.status, "Refused to delete non-draft entry");
        return Err(LedgerError::InvalidStateTransition {
            entity: "Journal entry",
            from: format!("{:?}", entry.status),
            to: "Deleted".to_string(),
        });
    }
    tx.delete_entry(id).await?;
    Ok(entry)
}

/// Posts a balanced draft entry
///
/// Writes one ledger row per line, in line order, updating each account as
/// it goes, then marks the entry posted.
///
/// # Errors
///
/// * `InvalidStateTransition` - the entry is not a draft
/// * `UnbalancedEntry` - debits and credits are not equal
pub async fn post_entry(
    tx: &mut dyn LedgerTransaction,
    id: JournalEntryId,
    actor: Option<&str>,
) -> Result<JournalEntry, LedgerError> {
    let mut entry = load_entry(tx, id).await?;
    require_status(&entry, EntryStatus::Draft, EntryStatus::Posted)?;
    validate_lines(tx, &entry.lines).await?;
    // Whole-cent lines: anything inside the tolerance but not equal is drift
    if !entry.is_balanced || entry.total_debit != entry.total_credit {
        return Err(LedgerError::UnbalancedEntry {
            entry_number: entry.entry_number.clone(),
            debits: entry.total_debit,
            credits: entry.total_credit,
            difference: entry.difference(),
        });
    }

    post_entry_lines(tx, &entry).await?;

    let now = Utc::now();
    entry.status = EntryStatus::Posted;
    entry.posted_at = Some(now);
    entry.posted_by = actor.map(str::to_string);
    entry.updated_at = now;
    tx.update_entry(&entry).await?;

    info!(
        entry_number = %entry.entry_number,
        total = %entry.total_debit,
        lines = entry.lines.len(),
        "Posted journal entry"
    );
    Ok(entry)
}

/// Creates and immediately posts an entry
pub async fn create_and_post(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    request: NewJournalEntry,
) -> Result<JournalEntry, LedgerError> {
    let actor = request.actor.clone();
    let entry = create_entry(tx, config, request).await?;
    post_entry(tx, entry.id, actor.as_deref()).await
}

/// Voids a posted entry
///
/// Every line's effect on its account is subtracted and the entry's ledger
/// rows are tombstoned. The entry itself is kept with status `Voided`.
/// Voiding a reversal frees its original to be reversed or voided again.
///
/// # Errors
///
/// * `InvalidStateTransition` - the entry is not posted, or it has been
///   reversed (void the reversal first)
/// * `Validation` - blank reason
pub async fn void_entry(
    tx: &mut dyn LedgerTransaction,
    id: JournalEntryId,
    reason: &str,
    actor: Option<&str>,
) -> Result<JournalEntry, LedgerError> {
    let mut entry = load_entry(tx, id).await?;
    require_status(&entry, EntryStatus::Posted, EntryStatus::Voided)?;
    if let Some(reversal) = entry.reversed_by {
        error!(
            entry_number = %entry.entry_number,
            reversal = %reversal,
            "Refused to void a reversed entry"
        );
        return Err(LedgerError::InvalidStateTransition {
            entity: "Journal entry",
            from: format!("Reversed by {}", reversal),
            to: format!("{:?}", EntryStatus::Voided),
        });
    }
    if reason.trim().is_empty() {
        return Err(LedgerError::validation("a reason is required to void an entry"));
    }

    unpost_entry_lines(tx, &entry).await?;

    if let Some(original_id) = entry.reversal_of {
        let mut original = load_entry(tx, original_id).await?;
        if original.reversed_by == Some(entry.id) {
            original.reversed_by = None;
            original.updated_at = Utc::now();
            tx.update_entry(&original).await?;
        }
    }

    let now = Utc::now();
    entry.status = EntryStatus::Voided;
    entry.voided_at = Some(now);
    entry.voided_by = actor.map(str::to_string);
    entry.void_reason = Some(reason.to_string());
    entry.updated_at = now;
    tx.update_entry(&entry).await?;

    info!(entry_number = %entry.entry_number, reason, "Voided journal entry");
    Ok(entry)
}

/// Posts a separate reversal entry that offsets a posted entry
///
/// The original stays posted and records the reversal in `reversed_by`.
/// Returns the reversal entry.
///
/// # Errors
///
/// * `InvalidStateTransition` - the original is not posted
/// * `Validation` - the original was already reversed, or is itself a reversal
pub async fn reverse_entry(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: JournalEntryId,
    entry_date: Option<chrono::NaiveDate>,
    actor: Option<&str>,
) -> Result<JournalEntry, LedgerError> {
    let mut original = load_entry(tx, id).await?;
    require_status(&original, EntryStatus::Posted, EntryStatus::Posted)?;
    if let Some(existing) = original.reversed_by {
        return Err(LedgerError::validation(format!(
            "entry {} was already reversed by {}",
            original.entry_number, existing
        )));
    }
    if original.reversal_of.is_some() {
        return Err(LedgerError::validation(format!(
            "entry {} is a reversal and cannot be reversed again",
            original.entry_number
        )));
    }

    let mut request = NewJournalEntry::new(
        entry_date.unwrap_or(original.entry_date),
        format!("Reversal of {}", original.entry_number),
    )
    .with_type(EntryType::Reversal)
    .with_lines(original.lines.iter().map(LineItem::reversed).collect());
    request.reversal_of = Some(original.id);
    request.actor = actor.map(str::to_string);

    let reversal = create_and_post(tx, config, request).await?;

    original.reversed_by = Some(reversal.id);
    original.updated_at = Utc::now();
    tx.update_entry(&original).await?;

    info!(
        original = %original.entry_number,
        reversal = %reversal.entry_number,
        "Reversed journal entry"
    );
    Ok(reversal)
}
