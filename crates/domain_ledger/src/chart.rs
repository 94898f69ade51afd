//! Default chart of accounts and account resolution
//!
//! Translators never look accounts up on their own. They pass the document's
//! explicit override, if any, and the [`DefaultAccount`] role they need to
//! [`resolve_account`], which is the one place default accounts are found or
//! created.
//!
//! Resolution rule: among active, postable accounts of the role's type, the
//! first (by code) whose name contains one of the role's patterns,
//! case-insensitively. If there is none, the account is created with the
//! role's standard name and code and flagged as a system account. A taken
//! code is incremented numerically; the configured fallback code is the last
//! resort.

use tracing::info;

use core_kernel::AccountId;

use crate::account::{Account, AccountType};
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::ports::LedgerTransaction;

/// How many successors of a standard code are tried before the fallback
const CODE_SEARCH_SPAN: u32 = 99;

/// Accounts the translators need by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultAccount {
    Cash,
    AccountsReceivable,
    Inventory,
    InputTax,
    AccumulatedDepreciation,
    AccountsPayable,
    TaxPayable,
    OwnersEquity,
    RetainedEarnings,
    SalesRevenue,
    ProjectRevenue,
    InventoryGain,
    CostOfGoodsSold,
    OperatingExpense,
    InventoryLoss,
    DepreciationExpense,
    ProjectExpense,
}

/// Standard definition of a default account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleDefinition {
    pub account_type: AccountType,
    pub name: &'static str,
    pub code: &'static str,
    pub subtype: &'static str,
    /// Lowercase name fragments that identify an existing account for the role
    pub patterns: &'static [&'static str],
}

impl DefaultAccount {
    /// Every role, in chart order
    pub const ALL: [DefaultAccount; 17] = [
        DefaultAccount::Cash,
        DefaultAccount::AccountsReceivable,
        DefaultAccount::Inventory,
        DefaultAccount::InputTax,
        DefaultAccount::AccumulatedDepreciation,
        DefaultAccount::AccountsPayable,
        DefaultAccount::TaxPayable,
        DefaultAccount::OwnersEquity,
        DefaultAccount::RetainedEarnings,
        DefaultAccount::SalesRevenue,
        DefaultAccount::ProjectRevenue,
        DefaultAccount::InventoryGain,
        DefaultAccount::CostOfGoodsSold,
        DefaultAccount::OperatingExpense,
        DefaultAccount::InventoryLoss,
        DefaultAccount::DepreciationExpense,
        DefaultAccount::ProjectExpense,
    ];

    /// Standard definition for the role
    pub fn definition(&self) -> RoleDefinition {
        use AccountType::*;
        let define = |account_type, name, code, subtype, patterns: &'static [&'static str]| RoleDefinition {
            account_type,
            name,
            code,
            subtype,
            patterns,
        };
        match self {
            DefaultAccount::Cash => define(Asset, "Cash", "1000", "cash", &["cash", "bank"]),
            DefaultAccount::AccountsReceivable => define(
                Asset,
                "Accounts Receivable",
                "1100",
                "receivable",
                &["accounts receivable", "trade receivable"],
            ),
            DefaultAccount::Inventory => define(Asset, "Inventory", "1200", "inventory", &["inventory", "stock on hand"]),
            DefaultAccount::InputTax => define(
                Asset,
                "Input Tax Receivable",
                "1300",
                "tax",
                &["input tax", "tax receivable"],
            ),
            DefaultAccount::AccumulatedDepreciation => define(
                Asset,
                "Accumulated Depreciation",
                "1590",
                "fixed_asset",
                &["accumulated depreciation"],
            ),
            DefaultAccount::AccountsPayable => define(
                Liability,
                "Accounts Payable",
                "2000",
                "payable",
                &["accounts payable", "trade payable"],
            ),
            DefaultAccount::TaxPayable => define(Liability, "Tax Payable", "2100", "tax", &["tax payable", "sales tax"]),
            DefaultAccount::OwnersEquity => define(Equity, "Owner's Equity", "3000", "capital", &["owner", "capital"]),
            DefaultAccount::RetainedEarnings => define(
                Equity,
                "Retained Earnings",
                "3100",
                "retained_earnings",
                &["retained earnings"],
            ),
            DefaultAccount::SalesRevenue => define(Revenue, "Sales Revenue", "4000", "sales", &["sales revenue", "sales"]),
            DefaultAccount::ProjectRevenue => define(
                Revenue,
                "Project Revenue",
                "4100",
                "project",
                &["project revenue", "project income"],
            ),
            DefaultAccount::InventoryGain => define(
                Revenue,
                "Inventory Adjustment Gain",
                "4200",
                "other_income",
                &["inventory adjustment gain", "inventory gain"],
            ),
            DefaultAccount::CostOfGoodsSold => define(
                Expense,
                "Cost of Goods Sold",
                "5000",
                "cost_of_sales",
                &["cost of goods", "cost of sales", "cogs"],
            ),
            DefaultAccount::OperatingExpense => define(
                Expense,
                "Operating Expenses",
                "6000",
                "operating",
                &["operating expense", "general expense"],
            ),
            DefaultAccount::InventoryLoss => define(
                Expense,
                "Inventory Adjustment Loss",
                "6100",
                "operating",
                &["inventory adjustment loss", "inventory loss", "shrinkage"],
            ),
            DefaultAccount::DepreciationExpense => define(
                Expense,
                "Depreciation Expense",
                "6200",
                "depreciation",
                &["depreciation expense"],
            ),
            DefaultAccount::ProjectExpense => define(
                Expense,
                "Project Costs",
                "6300",
                "project",
                &["project cost", "project expense"],
            ),
        }
    }

    /// Returns true if the account is a candidate for this role
    pub fn matches(&self, account: &Account) -> bool {
        let def = self.definition();
        if account.account_type != def.account_type || !account.can_post() {
            return false;
        }
        let name = account.name.to_lowercase();
        def.patterns.iter().any(|pattern| name.contains(pattern))
    }
}

/// Resolves the account a translator should use for a role
///
/// An explicit override wins and must be postable. Otherwise the role is
/// looked up by name pattern and created if missing.
///
/// # Errors
///
/// * `NotFound` - the override does not exist
/// * `Validation` - the override is a parent or inactive account, or no code is free
pub async fn resolve_account(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    explicit: Option<AccountId>,
    role: DefaultAccount,
) -> Result<AccountId, LedgerError> {
    if let Some(id) = explicit {
        let account = tx
            .account(id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Account", id))?;
        if !account.can_post() {
            return Err(LedgerError::validation(format!(
                "account {} ({}) cannot take postings",
                account.code, account.name
            )));
        }
        return Ok(account.id);
    }
    Ok(resolve_default(tx, config, role).await?.id)
}

/// Finds or creates the default account for a role
pub async fn resolve_default(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    role: DefaultAccount,
) -> Result<Account, LedgerError> {
    let accounts = tx.accounts().await?;
    if let Some(existing) = accounts.iter().find(|a| role.matches(a)) {
        return Ok(existing.clone());
    }

    let def = role.definition();
    let code = free_code(&accounts, def.code, &config.fallback_account_code).ok_or_else(|| {
        LedgerError::validation(format!("no free account code for {}", def.name))
    })?;

    let account = Account::new(tx.organization_id(), code, def.name, def.account_type)
        .with_subtype(def.subtype)
        .as_system();
    tx.insert_account(&account).await?;

    info!(
        organization_id = %account.organization_id,
        code = %account.code,
        name = %account.name,
        "Created default account"
    );
    Ok(account)
}

/// First unused code starting at `preferred`, then the fallback
fn free_code(accounts: &[Account], preferred: &str, fallback: &str) -> Option<String> {
    let taken = |code: &str| accounts.iter().any(|a| a.code == code);
    if !taken(preferred) {
        return Some(preferred.to_string());
    }
    if let Ok(base) = preferred.parse::<u32>() {
        let width = preferred.len();
        for offset in 1..=CODE_SEARCH_SPAN {
            let candidate = format!("{:0width$}", base + offset, width = width);
            if !taken(&candidate) {
                return Some(candidate);
            }
        }
    }
    if !taken(fallback) {
        return Some(fallback.to_string());
    }
    None
}

/// Creates every default account that is missing; a no-op on a full chart
pub async fn initialize_chart(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
) -> Result<Vec<Account>, LedgerError> {
    let mut chart = Vec::with_capacity(DefaultAccount::ALL.len());
    for role in DefaultAccount::ALL {
        chart.push(resolve_default(tx, config, role).await?);
    }
    Ok(chart)
}
