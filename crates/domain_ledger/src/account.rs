//! Account types for the chart of accounts
//!
//! Each account carries its own running debit and credit totals. These totals
//! are a cache of the ledger: they are only ever changed by the ledger poster
//! (`apply_delta`) or rebuilt from ledger rows by recalculation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, OrganizationId};

/// Types of accounts in the chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Asset accounts (debit normal balance)
    Asset,
    /// Liability accounts (credit normal balance)
    Liability,
    /// Equity accounts (credit normal balance)
    Equity,
    /// Revenue accounts (credit normal balance)
    Revenue,
    /// Expense accounts (debit normal balance)
    Expense,
}

impl AccountType {
    /// All account types in chart order
    pub const ALL: [AccountType; 5] = [
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Revenue,
        AccountType::Expense,
    ];

    /// Returns true if this account type has a debit normal balance
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }

    /// Net balance for the type's sign rule
    pub fn net_balance(&self, debit: Decimal, credit: Decimal) -> Decimal {
        if self.is_debit_normal() {
            debit - credit
        } else {
            credit - debit
        }
    }

    /// Lowercase name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account in the chart of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Account code, unique per organization (e.g., "1000")
    pub code: String,
    /// Account name
    pub name: String,
    /// Account type
    pub account_type: AccountType,
    /// Free-text classification used for report bucketing
    pub subtype: Option<String>,
    /// Parent account ID (for hierarchical charts)
    pub parent_id: Option<AccountId>,
    /// Parent accounts group children and never take postings
    pub is_parent: bool,
    /// Whether account is active
    pub is_active: bool,
    /// Created by the ledger itself rather than by a user
    pub is_system_account: bool,
    /// Description
    pub description: Option<String>,
    /// Sum of debits posted
    pub debit_balance: Decimal,
    /// Sum of credits posted
    pub credit_balance: Decimal,
    /// Net balance per the type's sign rule
    pub current_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Tombstone; set by the store, never seen by domain code
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Creates a new leaf account with zero balances
    ///
    /// # Arguments
    ///
    /// * `organization_id` - Owning organization
    /// * `code` - Account code
    /// * `name` - Account name
    /// * `account_type` - Type of account
    pub fn new(
        organization_id: OrganizationId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            organization_id,
            code: code.into(),
            name: name.into(),
            account_type,
            subtype: None,
            parent_id: None,
            is_parent: false,
            is_active: true,
            is_system_account: false,
            description: None,
            debit_balance: Decimal::ZERO,
            credit_balance: Decimal::ZERO,
            current_balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Sets the subtype
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Sets the parent account
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Marks the account as a parent (non-postable)
    pub fn as_parent(mut self) -> Self {
        self.is_parent = true;
        self
    }

    /// Marks the account as system-created
    pub fn as_system(mut self) -> Self {
        self.is_system_account = true;
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds debit and credit to the running totals and recomputes the net balance
    ///
    /// Negative arguments subtract, which is how voiding reverses a posting.
    pub fn apply_delta(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_balance += debit;
        self.credit_balance += credit;
        self.current_balance = self.account_type.net_balance(self.debit_balance, self.credit_balance);
        self.updated_at = Utc::now();
    }

    /// Overwrites the running totals, as recalculation does
    pub fn set_balances(&mut self, debit: Decimal, credit: Decimal) {
        self.debit_balance = debit;
        self.credit_balance = credit;
        self.current_balance = self.account_type.net_balance(debit, credit);
        self.updated_at = Utc::now();
    }

    /// Returns true if journal lines may reference this account
    pub fn can_post(&self) -> bool {
        self.is_active && !self.is_parent && self.deleted_at.is_none()
    }

    /// Returns true if both running totals are zero
    pub fn has_zero_balances(&self) -> bool {
        self.debit_balance.is_zero() && self.credit_balance.is_zero()
    }

    /// Places the net balance in the trial balance debit or credit column
    ///
    /// A positive balance sits in the type's normal column; a negative balance
    /// flips to the other column as its absolute value.
    pub fn trial_balance_columns(&self) -> (Decimal, Decimal) {
        let balance = self.current_balance;
        let normal_debit = self.account_type.is_debit_normal();
        if balance.is_sign_negative() && !balance.is_zero() {
            if normal_debit {
                (Decimal::ZERO, balance.abs())
            } else {
                (balance.abs(), Decimal::ZERO)
            }
        } else if normal_debit {
            (balance, Decimal::ZERO)
        } else {
            (Decimal::ZERO, balance)
        }
    }
}
