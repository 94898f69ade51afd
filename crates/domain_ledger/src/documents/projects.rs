//! Projects and the revenue or cost transactions recorded against them

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, JournalEntryId, OrganizationId, ProjectId, ProjectTransactionId};

use crate::documents::DocumentKind;

/// A project with running revenue and cost aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub organization_id: OrganizationId,
    pub project_code: String,
    pub name: String,
    pub budget: Option<Decimal>,
    /// Sum of recorded expense transactions
    pub actual_cost: Decimal,
    /// Sum of recorded revenue transactions
    pub revenue: Decimal,
    pub revenue_account_id: Option<AccountId>,
    pub expense_account_id: Option<AccountId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(organization_id: OrganizationId, project_code: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            organization_id,
            project_code: project_code.into(),
            name: name.into(),
            budget: None,
            actual_cost: Decimal::ZERO,
            revenue: Decimal::ZERO,
            revenue_account_id: None,
            expense_account_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Revenue less cost
    pub fn profit(&self) -> Decimal {
        self.revenue - self.actual_cost
    }
}

source_document!(Project, DocumentKind::Project, project_code);

/// Whether a project transaction earns or spends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectTransactionKind {
    Revenue,
    Expense,
}

/// Project transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectTransactionStatus {
    Draft,
    /// Posted and added to the project aggregates
    Recorded,
}

/// Revenue earned or cost incurred on a project, settled in cash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTransaction {
    pub id: ProjectTransactionId,
    pub organization_id: OrganizationId,
    pub transaction_number: String,
    pub project_id: ProjectId,
    pub transaction_date: NaiveDate,
    pub kind: ProjectTransactionKind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub status: ProjectTransactionStatus,
    /// Revenue or expense account, depending on kind
    pub project_account_id: Option<AccountId>,
    pub cash_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectTransaction {
    pub fn new(
        organization_id: OrganizationId,
        transaction_number: impl Into<String>,
        project_id: ProjectId,
        transaction_date: NaiveDate,
        kind: ProjectTransactionKind,
        amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectTransactionId::new(),
            organization_id,
            transaction_number: transaction_number.into(),
            project_id,
            transaction_date,
            kind,
            amount,
            description: None,
            status: ProjectTransactionStatus::Draft,
            project_account_id: None,
            cash_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

source_document!(ProjectTransaction, DocumentKind::ProjectTransaction, transaction_number);
