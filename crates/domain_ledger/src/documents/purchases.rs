//! Purchase-side documents: vendor bills, bill payments and expenses

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, BillId, BillPaymentId, ExpenseId, JournalEntryId, OrganizationId};

use crate::documents::sales::{PaymentMethod, PaymentStatus};
use crate::documents::DocumentKind;

/// Bill status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Draft,
    /// Approved and posted to payables
    Approved,
    PartiallyPaid,
    Paid,
    Void,
}

/// A vendor bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub organization_id: OrganizationId,
    pub bill_number: String,
    pub vendor_name: Option<String>,
    pub bill_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub paid_amount: Decimal,
    pub status: BillStatus,
    pub expense_account_id: Option<AccountId>,
    pub tax_account_id: Option<AccountId>,
    pub payable_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Creates a draft bill; the total is derived from subtotal and tax
    pub fn new(
        organization_id: OrganizationId,
        bill_number: impl Into<String>,
        bill_date: NaiveDate,
        subtotal: Decimal,
        tax_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BillId::new(),
            organization_id,
            bill_number: bill_number.into(),
            vendor_name: None,
            bill_date,
            due_date: None,
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
            paid_amount: Decimal::ZERO,
            status: BillStatus::Draft,
            expense_account_id: None,
            tax_account_id: None,
            payable_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the vendor name
    pub fn with_vendor(mut self, name: impl Into<String>) -> Self {
        self.vendor_name = Some(name.into());
        self
    }

    /// Sets the expense account override
    pub fn with_expense_account(mut self, account_id: AccountId) -> Self {
        self.expense_account_id = Some(account_id);
        self
    }

    /// Returns the balance still owed
    pub fn balance_due(&self) -> Decimal {
        self.total - self.paid_amount
    }
}

source_document!(Bill, DocumentKind::Bill, bill_number);

/// A payment made against a vendor bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPayment {
    pub id: BillPaymentId,
    pub organization_id: OrganizationId,
    pub payment_number: String,
    pub bill_id: BillId,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Cash or bank account paying the money
    pub payment_account_id: Option<AccountId>,
    pub payable_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BillPayment {
    /// Creates a pending bill payment
    pub fn new(
        organization_id: OrganizationId,
        payment_number: impl Into<String>,
        bill_id: BillId,
        payment_date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BillPaymentId::new(),
            organization_id,
            payment_number: payment_number.into(),
            bill_id,
            payment_date,
            amount,
            method: PaymentMethod::BankTransfer,
            status: PaymentStatus::Pending,
            payment_account_id: None,
            payable_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

source_document!(BillPayment, DocumentKind::BillPayment, payment_number);

/// Expense claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Pending,
    /// Approved and posted
    Approved,
    Rejected,
}

/// A directly paid expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub organization_id: OrganizationId,
    pub expense_number: String,
    pub expense_date: NaiveDate,
    pub category: Option<String>,
    pub description: Option<String>,
    /// Amount before tax
    pub amount: Decimal,
    pub tax_amount: Decimal,
    pub status: ExpenseStatus,
    pub expense_account_id: Option<AccountId>,
    pub tax_account_id: Option<AccountId>,
    pub payment_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// Creates a pending expense
    pub fn new(
        organization_id: OrganizationId,
        expense_number: impl Into<String>,
        expense_date: NaiveDate,
        amount: Decimal,
        tax_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::new(),
            organization_id,
            expense_number: expense_number.into(),
            expense_date,
            category: None,
            description: None,
            amount,
            tax_amount,
            status: ExpenseStatus::Pending,
            expense_account_id: None,
            tax_account_id: None,
            payment_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Amount plus tax
    pub fn total(&self) -> Decimal {
        self.amount + self.tax_amount
    }
}

source_document!(Expense, DocumentKind::Expense, expense_number);
