//! Fixed assets and their periodic depreciation

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    round_amount, AccountId, AssetId, DepreciationId, FiscalPeriod, JournalEntryId, OrganizationId,
};

use crate::documents::DocumentKind;

/// A depreciable fixed asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedAsset {
    pub id: AssetId,
    pub organization_id: OrganizationId,
    pub asset_number: String,
    pub name: String,
    pub purchase_date: NaiveDate,
    pub purchase_cost: Decimal,
    pub salvage_value: Decimal,
    pub useful_life_months: u32,
    pub accumulated_depreciation: Decimal,
    pub depreciation_expense_account_id: Option<AccountId>,
    pub accumulated_depreciation_account_id: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FixedAsset {
    pub fn new(
        organization_id: OrganizationId,
        asset_number: impl Into<String>,
        name: impl Into<String>,
        purchase_date: NaiveDate,
        purchase_cost: Decimal,
        useful_life_months: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AssetId::new(),
            organization_id,
            asset_number: asset_number.into(),
            name: name.into(),
            purchase_date,
            purchase_cost,
            salvage_value: Decimal::ZERO,
            useful_life_months,
            accumulated_depreciation: Decimal::ZERO,
            depreciation_expense_account_id: None,
            accumulated_depreciation_account_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the salvage value
    pub fn with_salvage_value(mut self, salvage_value: Decimal) -> Self {
        self.salvage_value = salvage_value;
        self
    }

    /// Cost less salvage value
    pub fn depreciable_amount(&self) -> Decimal {
        self.purchase_cost - self.salvage_value
    }

    /// Depreciation not yet charged
    pub fn remaining_depreciable(&self) -> Decimal {
        (self.depreciable_amount() - self.accumulated_depreciation).max(Decimal::ZERO)
    }

    /// Cost less accumulated depreciation
    pub fn book_value(&self) -> Decimal {
        self.purchase_cost - self.accumulated_depreciation
    }

    /// Straight-line monthly charge, capped at what remains
    pub fn monthly_depreciation(&self) -> Decimal {
        if self.useful_life_months == 0 {
            return Decimal::ZERO;
        }
        let monthly = round_amount(self.depreciable_amount() / Decimal::from(self.useful_life_months));
        monthly.min(self.remaining_depreciable())
    }

    /// Schedules the charge for one period
    pub fn schedule_depreciation(&self, period: FiscalPeriod) -> AssetDepreciation {
        let now = Utc::now();
        AssetDepreciation {
            id: DepreciationId::new(),
            organization_id: self.organization_id,
            depreciation_number: format!("{}-{}", self.asset_number, period),
            asset_id: self.id,
            period,
            depreciation_date: period.end_date().unwrap_or(self.purchase_date),
            amount: self.monthly_depreciation(),
            status: DepreciationStatus::Scheduled,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

source_document!(FixedAsset, DocumentKind::FixedAsset, asset_number);

/// Depreciation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationStatus {
    Scheduled,
    Posted,
}

/// One period's depreciation charge for an asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDepreciation {
    pub id: DepreciationId,
    pub organization_id: OrganizationId,
    pub depreciation_number: String,
    pub asset_id: AssetId,
    pub period: FiscalPeriod,
    pub depreciation_date: NaiveDate,
    pub amount: Decimal,
    pub status: DepreciationStatus,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

source_document!(AssetDepreciation, DocumentKind::AssetDepreciation, depreciation_number);
