//! Sales-side documents: invoices, payments, receipts, credit notes and orders

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{
    AccountId, CreditNoteId, InvoiceId, JournalEntryId, OrganizationId, PaymentId, ProductId,
    ReceiptId, SalesOrderId,
};

use crate::documents::DocumentKind;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Invoice is being drafted
    Draft,
    /// Invoice has been sent to the customer and posted
    Sent,
    /// Partial payment received
    PartiallyPaid,
    /// Fully paid
    Paid,
    /// Cancelled
    Void,
}

/// A customer invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub organization_id: OrganizationId,
    /// Invoice number (human-readable)
    pub invoice_number: String,
    pub customer_name: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// Taxable subtotal
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    /// Subtotal plus tax
    pub total: Decimal,
    pub paid_amount: Decimal,
    pub status: InvoiceStatus,
    pub receivable_account_id: Option<AccountId>,
    pub revenue_account_id: Option<AccountId>,
    pub tax_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a draft invoice; the total is derived from subtotal and tax
    pub fn new(
        organization_id: OrganizationId,
        invoice_number: impl Into<String>,
        issue_date: NaiveDate,
        subtotal: Decimal,
        tax_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InvoiceId::new(),
            organization_id,
            invoice_number: invoice_number.into(),
            customer_name: None,
            issue_date,
            due_date: None,
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
            paid_amount: Decimal::ZERO,
            status: InvoiceStatus::Draft,
            receivable_account_id: None,
            revenue_account_id: None,
            tax_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the customer name
    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Sets the revenue account override
    pub fn with_revenue_account(mut self, account_id: AccountId) -> Self {
        self.revenue_account_id = Some(account_id);
        self
    }

    /// Returns the balance due
    pub fn balance_due(&self) -> Decimal {
        self.total - self.paid_amount
    }
}

source_document!(Invoice, DocumentKind::Invoice, invoice_number);

/// How a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Cheque,
    Other,
}

/// Payment status, shared by customer and vendor payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Recorded but not yet applied
    Pending,
    /// Applied and posted
    Completed,
}

/// A customer payment against an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub organization_id: OrganizationId,
    pub payment_number: String,
    pub invoice_id: InvoiceId,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Cash or bank account receiving the money
    pub deposit_account_id: Option<AccountId>,
    pub receivable_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a pending payment
    pub fn new(
        organization_id: OrganizationId,
        payment_number: impl Into<String>,
        invoice_id: InvoiceId,
        payment_date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            organization_id,
            payment_number: payment_number.into(),
            invoice_id,
            payment_date,
            amount,
            method: PaymentMethod::BankTransfer,
            status: PaymentStatus::Pending,
            deposit_account_id: None,
            receivable_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the payment method
    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the deposit account override
    pub fn with_deposit_account(mut self, account_id: AccountId) -> Self {
        self.deposit_account_id = Some(account_id);
        self
    }
}

source_document!(Payment, DocumentKind::Payment, payment_number);

/// Sales receipt status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Draft,
    Completed,
}

/// A cash sale: paid at the point of sale, no receivable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReceipt {
    pub id: ReceiptId,
    pub organization_id: OrganizationId,
    pub receipt_number: String,
    pub receipt_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub status: ReceiptStatus,
    pub deposit_account_id: Option<AccountId>,
    pub revenue_account_id: Option<AccountId>,
    pub tax_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalesReceipt {
    /// Creates a draft receipt
    pub fn new(
        organization_id: OrganizationId,
        receipt_number: impl Into<String>,
        receipt_date: NaiveDate,
        subtotal: Decimal,
        tax_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ReceiptId::new(),
            organization_id,
            receipt_number: receipt_number.into(),
            receipt_date,
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
            status: ReceiptStatus::Draft,
            deposit_account_id: None,
            revenue_account_id: None,
            tax_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

source_document!(SalesReceipt, DocumentKind::SalesReceipt, receipt_number);

/// Credit note status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditNoteStatus {
    Draft,
    Issued,
}

/// A credit note reversing (part of) a sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditNote {
    pub id: CreditNoteId,
    pub organization_id: OrganizationId,
    pub credit_note_number: String,
    /// Invoice being credited; its stamped accounts are reused
    pub invoice_id: Option<InvoiceId>,
    pub issue_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub status: CreditNoteStatus,
    pub reason: Option<String>,
    pub receivable_account_id: Option<AccountId>,
    pub revenue_account_id: Option<AccountId>,
    pub tax_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditNote {
    /// Creates a draft credit note
    pub fn new(
        organization_id: OrganizationId,
        credit_note_number: impl Into<String>,
        issue_date: NaiveDate,
        subtotal: Decimal,
        tax_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CreditNoteId::new(),
            organization_id,
            credit_note_number: credit_note_number.into(),
            invoice_id: None,
            issue_date,
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
            status: CreditNoteStatus::Draft,
            reason: None,
            receivable_account_id: None,
            revenue_account_id: None,
            tax_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Links the credit note to an invoice
    pub fn for_invoice(mut self, invoice_id: InvoiceId) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }
}

source_document!(CreditNote, DocumentKind::CreditNote, credit_note_number);

/// Sales order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesOrderStatus {
    Draft,
    Confirmed,
}

/// One product line of a sales order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    pub product_id: ProductId,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl SalesOrderLine {
    pub fn new(product_id: ProductId, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            product_id,
            description: None,
            quantity,
            unit_price,
        }
    }

    /// Quantity times unit price
    pub fn amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// A sales order; confirming it books the sale and relieves inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: SalesOrderId,
    pub organization_id: OrganizationId,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub lines: Vec<SalesOrderLine>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    /// Paid at confirmation; debits cash instead of the receivable
    pub paid_on_confirmation: bool,
    pub status: SalesOrderStatus,
    pub receivable_account_id: Option<AccountId>,
    pub revenue_account_id: Option<AccountId>,
    pub tax_account_id: Option<AccountId>,
    pub cogs_account_id: Option<AccountId>,
    pub inventory_account_id: Option<AccountId>,
    pub journal_entry_id: Option<JournalEntryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalesOrder {
    /// Creates a draft order; the subtotal is derived from the lines
    pub fn new(
        organization_id: OrganizationId,
        order_number: impl Into<String>,
        order_date: NaiveDate,
        lines: Vec<SalesOrderLine>,
        tax_amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        let subtotal = lines.iter().map(SalesOrderLine::amount).sum::<Decimal>();
        Self {
            id: SalesOrderId::new(),
            organization_id,
            order_number: order_number.into(),
            order_date,
            lines,
            subtotal,
            tax_amount,
            total: subtotal + tax_amount,
            paid_on_confirmation: false,
            status: SalesOrderStatus::Draft,
            receivable_account_id: None,
            revenue_account_id: None,
            tax_account_id: None,
            cogs_account_id: None,
            inventory_account_id: None,
            journal_entry_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks the order as paid on confirmation
    pub fn paid(mut self) -> Self {
        self.paid_on_confirmation = true;
        self
    }
}

source_document!(SalesOrder, DocumentKind::SalesOrder, order_number);
