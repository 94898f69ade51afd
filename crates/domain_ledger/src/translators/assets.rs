//! Asset depreciation translator

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use core_kernel::DepreciationId;

use crate::chart::{resolve_account, DefaultAccount};
use crate::config::LedgerConfig;
use crate::documents::assets::{AssetDepreciation, DepreciationStatus, FixedAsset};
use crate::documents::{load_document, save_document};
use crate::error::LedgerError;
use crate::lifecycle::check_transition;
use crate::ports::LedgerTransaction;
use crate::translators::{existing_posting, post_document, transfer_lines, PostingOutcome};

/// Posts a scheduled depreciation charge
///
/// Debit Depreciation Expense; Credit Accumulated Depreciation. The asset's
/// accumulated depreciation grows by the charge.
///
/// # Errors
///
/// `Validation` if the charge is not positive or exceeds what remains to be
/// depreciated
pub async fn post_depreciation(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: DepreciationId,
    actor: Option<&str>,
) -> Result<PostingOutcome<AssetDepreciation>, LedgerError> {
    let mut charge: AssetDepreciation = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &charge).await? {
        return Ok(PostingOutcome { document: charge, entry, already_posted: true });
    }
    check_transition(charge.status, DepreciationStatus::Posted)?;

    let mut asset: FixedAsset = load_document(tx, *charge.asset_id.as_uuid()).await?;
    if charge.amount <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "depreciation {} has no amount",
            charge.depreciation_number
        )));
    }
    let remaining = asset.remaining_depreciable();
    if charge.amount - remaining >= config.balance_tolerance {
        return Err(LedgerError::validation(format!(
            "depreciation of {} exceeds the {} remaining on asset {}",
            charge.amount, remaining, asset.asset_number
        )));
    }

    let expense = resolve_account(
        tx,
        config,
        asset.depreciation_expense_account_id,
        DefaultAccount::DepreciationExpense,
    )
    .await?;
    let accumulated = resolve_account(
        tx,
        config,
        asset.accumulated_depreciation_account_id,
        DefaultAccount::AccumulatedDepreciation,
    )
    .await?;

    let entry = post_document(
        tx,
        config,
        &charge,
        charge.depreciation_date,
        format!("Depreciation of {} for {}", asset.name, charge.period),
        transfer_lines(expense, accumulated, charge.amount),
        actor,
    )
    .await?;

    let now = Utc::now();
    asset.accumulated_depreciation += charge.amount;
    asset.depreciation_expense_account_id = Some(expense);
    asset.accumulated_depreciation_account_id = Some(accumulated);
    asset.updated_at = now;
    save_document(tx, &asset).await?;

    charge.journal_entry_id = Some(entry.id);
    charge.status = DepreciationStatus::Posted;
    charge.updated_at = now;
    save_document(tx, &charge).await?;

    info!(
        asset = %asset.asset_number,
        period = %charge.period,
        amount = %charge.amount,
        book_value = %asset.book_value(),
        "Posted depreciation"
    );
    Ok(PostingOutcome { document: charge, entry, already_posted: false })
}
