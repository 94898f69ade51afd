//! Products and stock adjustments

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, JournalEntryId, OrganizationId, ProductId, StockAdjustmentId};

use crate::documents::DocumentKind;

/// A sellable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub organization_id: OrganizationId,
    pub sku: String,
    pub name: String,
    /// Stock levels are enforced only for tracked products
    pub track_inventory: bool,
    pub stock_quantity: Decimal,
    /// Unit cost used to value inventory movements
    pub cost_price: Decimal,
    pub unit_price: Decimal,
    pub inventory_account_id: Option<AccountId>,
    pub cogs_account_id: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a tracked product with no stock
    pub fn new(
        organization_id: OrganizationId,
        sku: impl Into<String>,
        name: impl Into<String>,
        cost_price: Decimal,
        unit_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            organization_id,
            sku: sku.into(),
            name: name.into(),
            track_inventory: true,
            stock_quantity: Decimal::ZERO,
            cost_price,
            unit_price,
            inventory_account_id: None,
            cogs_account_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the stock on hand
    pub fn with_stock(mut self, quantity: Decimal) -> Self {
        self.stock_quantity = quantity;
        self
    }

    /// Disables stock tracking (services, non-stock items)
    pub fn untracked(mut self) -> Self {
        self.track_inventory = false;
        self
    }
}

source_document!(Product, DocumentKind::Product, sku);

/// Direction of a stock adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

/// Stock adjustment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentStatus {
    Draft,
    /// Stock changed and posted
    Applied,
}

/// A manual correction of a product's stock level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub id: StockAdjustmentId,
    pub organization_id: OrganizationId,
    pub adjustment_number: String,
    pub product_id: ProductId,
    pub adjustment_date: NaiveDate,
    pub direction: AdjustmentDirection,
    /// Units moved; always positive
    pub quantity: Decimal,
    /// Overrides the product's cost price when valuing the movement
    pub unit_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub status: AdjustmentStatus,
    /// Stock before the adjustment, recorded when applied
    pub previous_stock: Option<Decimal>,
    /// Stock after the adjustment, recorded when applied
    pub new_stock: Option<Decimal>,
    pub inventory_account_id: Option<AccountId>,
    /// Gain account for increases, loss account for decreases
    pub adjustment_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockAdjustment {
    /// Creates a draft adjustment
    pub fn new(
        organization_id: OrganizationId,
        adjustment_number: impl Into<String>,
        product_id: ProductId,
        adjustment_date: NaiveDate,
        direction: AdjustmentDirection,
        quantity: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: StockAdjustmentId::new(),
            organization_id,
            adjustment_number: adjustment_number.into(),
            product_id,
            adjustment_date,
            direction,
            quantity,
            unit_cost: None,
            reason: None,
            status: AdjustmentStatus::Draft,
            previous_stock: None,
            new_stock: None,
            inventory_account_id: None,
            adjustment_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Signed change in stock
    pub fn stock_delta(&self) -> Decimal {
        match self.direction {
            AdjustmentDirection::Increase => self.quantity,
            AdjustmentDirection::Decrease => -self.quantity,
        }
    }
}

source_document!(StockAdjustment, DocumentKind::StockAdjustment, adjustment_number);
