//! Stock adjustment translator

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use core_kernel::{round_amount, AccountId, StockAdjustmentId};

use crate::chart::{resolve_account, DefaultAccount};
use crate::config::LedgerConfig;
use crate::documents::inventory::{AdjustmentDirection, AdjustmentStatus, Product, StockAdjustment};
use crate::documents::{load_document, save_document};
use crate::error::LedgerError;
use crate::journal::LineItem;
use crate::lifecycle::check_transition;
use crate::ports::LedgerTransaction;
use crate::translators::{existing_posting, post_document, transfer_lines, PostingOutcome};

/// Lines for a stock adjustment valued at `value`
///
/// Increase: Debit Inventory / Credit gain. Decrease: Debit loss / Credit
/// Inventory.
pub fn adjustment_lines(
    direction: AdjustmentDirection,
    inventory: AccountId,
    adjustment: AccountId,
    value: Decimal,
) -> Vec<LineItem> {
    match direction {
        AdjustmentDirection::Increase => transfer_lines(inventory, adjustment, value),
        AdjustmentDirection::Decrease => transfer_lines(adjustment, inventory, value),
    }
}

/// Applies a stock adjustment to its product and posts its value
///
/// The movement is valued at quantity times the adjustment's unit cost, or
/// the product's cost price when none is given.
///
/// # Errors
///
/// * `Validation` - non-positive quantity, or the movement has no value
/// * `InsufficientStock` - a decrease would take a tracked product below zero
pub async fn apply_stock_adjustment(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: StockAdjustmentId,
    actor: Option<&str>,
) -> Result<PostingOutcome<StockAdjustment>, LedgerError> {
    let mut adjustment: StockAdjustment = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &adjustment).await? {
        return Ok(PostingOutcome { document: adjustment, entry, already_posted: true });
    }
    check_transition(adjustment.status, AdjustmentStatus::Applied)?;
    if adjustment.quantity <= Decimal::ZERO {
        return Err(LedgerError::validation("adjustment quantity must be greater than zero"));
    }

    let mut product: Product = load_document(tx, *adjustment.product_id.as_uuid()).await?;
    let previous_stock = product.stock_quantity;
    let new_stock = previous_stock + adjustment.stock_delta();
    if product.track_inventory && new_stock < Decimal::ZERO {
        return Err(LedgerError::InsufficientStock {
            product: format!("{} ({})", product.name, product.sku),
            required: adjustment.quantity,
            available: previous_stock,
        });
    }

    let unit_cost = adjustment.unit_cost.unwrap_or(product.cost_price);
    let value = round_amount(adjustment.quantity * unit_cost);
    if value <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "adjustment {} has no value: product {} has no cost price",
            adjustment.adjustment_number, product.sku
        )));
    }

    let inventory = resolve_account(
        tx,
        config,
        adjustment.inventory_account_id.or(product.inventory_account_id),
        DefaultAccount::Inventory,
    )
    .await?;
    let role = match adjustment.direction {
        AdjustmentDirection::Increase => DefaultAccount::InventoryGain,
        AdjustmentDirection::Decrease => DefaultAccount::InventoryLoss,
    };
    let counter = resolve_account(tx, config, adjustment.adjustment_account_id, role).await?;

    let description = match &adjustment.reason {
        Some(reason) => format!("Stock adjustment {}: {}", adjustment.adjustment_number, reason),
        None => format!("Stock adjustment {}", adjustment.adjustment_number),
    };
    let entry = post_document(
        tx,
        config,
        &adjustment,
        adjustment.adjustment_date,
        description,
        adjustment_lines(adjustment.direction, inventory, counter, value),
        actor,
    )
    .await?;

    let now = Utc::now();
    product.stock_quantity = new_stock;
    product.inventory_account_id = Some(inventory);
    product.updated_at = now;
    save_document(tx, &product).await?;

    adjustment.previous_stock = Some(previous_stock);
    adjustment.new_stock = Some(new_stock);
    adjustment.inventory_account_id = Some(inventory);
    adjustment.adjustment_account_id = Some(counter);
    adjustment.journal_entry_id = Some(entry.id);
    adjustment.status = AdjustmentStatus::Applied;
    adjustment.updated_at = now;
    save_document(tx, &adjustment).await?;

    info!(
        adjustment = %adjustment.adjustment_number,
        product = %product.sku,
        previous_stock = %previous_stock,
        new_stock = %new_stock,
        "Applied stock adjustment"
    );
    Ok(PostingOutcome { document: adjustment, entry, already_posted: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_increase_debits_inventory() {
        let (inventory, gain) = (AccountId::new(), AccountId::new());
        let lines = adjustment_lines(AdjustmentDirection::Increase, inventory, gain, dec!(50));
        assert_eq!(lines[0].account_id, inventory);
        assert_eq!(lines[0].debit, dec!(50));
        assert_eq!(lines[1].account_id, gain);
        assert_eq!(lines[1].credit, dec!(50));
    }

    #[test]
    fn test_decrease_credits_inventory() {
        let (inventory, loss) = (AccountId::new(), AccountId::new());
        let lines = adjustment_lines(AdjustmentDirection::Decrease, inventory, loss, dec!(20));
        assert_eq!(lines[0].account_id, loss);
        assert_eq!(lines[1].account_id, inventory);
        assert_eq!(lines[1].credit, dec!(20));
    }
}
