//! Document lifecycle tables
//!
//! Every document status enum has one table listing the transitions it
//! allows and the ledger effect each transition carries. Translators ask
//! [`check_transition`] before touching anything.

use std::fmt::Debug;

use crate::documents::assets::DepreciationStatus;
use crate::documents::inventory::AdjustmentStatus;
use crate::documents::projects::ProjectTransactionStatus;
use crate::documents::purchases::{BillStatus, ExpenseStatus};
use crate::documents::sales::{
    CreditNoteStatus, InvoiceStatus, PaymentStatus, ReceiptStatus, SalesOrderStatus,
};
use crate::error::LedgerError;

/// Ledger side effect of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Status change only
    None,
    /// Create and post a journal entry for the document
    PostToLedger,
    /// Void the document's posted journal entry
    VoidLedger,
}

/// One allowed status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
    pub effect: Effect,
}

impl<S> Transition<S> {
    pub const fn new(from: S, to: S, effect: Effect) -> Self {
        Self { from, to, effect }
    }
}

/// A status enum with a transition table
pub trait Lifecycle: Copy + Eq + Debug + 'static {
    /// Entity name used in errors
    const ENTITY: &'static str;

    /// All allowed transitions
    fn transitions() -> &'static [Transition<Self>];
}

/// Returns the effect of moving from `from` to `to`
///
/// # Errors
///
/// Returns `InvalidStateTransition` if the table has no such transition
pub fn check_transition<S: Lifecycle>(from: S, to: S) -> Result<Effect, LedgerError> {
    S::transitions()
        .iter()
        .find(|t| t.from == from && t.to == to)
        .map(|t| t.effect)
        .ok_or_else(|| {
            tracing::error!(entity = S::ENTITY, ?from, ?to, "Rejected lifecycle transition");
            LedgerError::invalid_transition(S::ENTITY, from, to)
        })
}

/// Returns true if the table allows the transition
pub fn can_transition<S: Lifecycle>(from: S, to: S) -> bool {
    S::transitions().iter().any(|t| t.from == from && t.to == to)
}

use Effect::{PostToLedger, VoidLedger};

const INVOICE: &[Transition<InvoiceStatus>] = &[
    Transition::new(InvoiceStatus::Draft, InvoiceStatus::Sent, PostToLedger),
    Transition::new(InvoiceStatus::Draft, InvoiceStatus::Void, Effect::None),
    Transition::new(InvoiceStatus::Sent, InvoiceStatus::PartiallyPaid, Effect::None),
    Transition::new(InvoiceStatus::Sent, InvoiceStatus::Paid, Effect::None),
    Transition::new(InvoiceStatus::Sent, InvoiceStatus::Void, VoidLedger),
    Transition::new(InvoiceStatus::PartiallyPaid, InvoiceStatus::PartiallyPaid, Effect::None),
    Transition::new(InvoiceStatus::PartiallyPaid, InvoiceStatus::Paid, Effect::None),
];

const BILL: &[Transition<BillStatus>] = &[
    Transition::new(BillStatus::Draft, BillStatus::Approved, PostToLedger),
    Transition::new(BillStatus::Draft, BillStatus::Void, Effect::None),
    Transition::new(BillStatus::Approved, BillStatus::PartiallyPaid, Effect::None),
    Transition::new(BillStatus::Approved, BillStatus::Paid, Effect::None),
    Transition::new(BillStatus::Approved, BillStatus::Void, VoidLedger),
    Transition::new(BillStatus::PartiallyPaid, BillStatus::PartiallyPaid, Effect::None),
    Transition::new(BillStatus::PartiallyPaid, BillStatus::Paid, Effect::None),
];

const PAYMENT: &[Transition<PaymentStatus>] = &[
    Transition::new(PaymentStatus::Pending, PaymentStatus::Completed, PostToLedger),
];

const RECEIPT: &[Transition<ReceiptStatus>] = &[
    Transition::new(ReceiptStatus::Draft, ReceiptStatus::Completed, PostToLedger),
];

const CREDIT_NOTE: &[Transition<CreditNoteStatus>] = &[
    Transition::new(CreditNoteStatus::Draft, CreditNoteStatus::Issued, PostToLedger),
];

const SALES_ORDER: &[Transition<SalesOrderStatus>] = &[
    Transition::new(SalesOrderStatus::Draft, SalesOrderStatus::Confirmed, PostToLedger),
];

const EXPENSE: &[Transition<ExpenseStatus>] = &[
    Transition::new(ExpenseStatus::Pending, ExpenseStatus::Approved, PostToLedger),
    Transition::new(ExpenseStatus::Pending, ExpenseStatus::Rejected, Effect::None),
];

const STOCK_ADJUSTMENT: &[Transition<AdjustmentStatus>] = &[
    Transition::new(AdjustmentStatus::Draft, AdjustmentStatus::Applied, PostToLedger),
];

const DEPRECIATION: &[Transition<DepreciationStatus>] = &[
    Transition::new(DepreciationStatus::Scheduled, DepreciationStatus::Posted, PostToLedger),
];

const PROJECT_TRANSACTION: &[Transition<ProjectTransactionStatus>] = &[
    Transition::new(ProjectTransactionStatus::Draft, ProjectTransactionStatus::Recorded, PostToLedger),
];

macro_rules! lifecycle {
    ($status:ty, $entity:literal, $table:ident) => {
        impl Lifecycle for $status {
            const ENTITY: &'static str = $entity;

            fn transitions() -> &'static [Transition<Self>] {
                $table
            }
        }
    };
}

lifecycle!(InvoiceStatus, "Invoice", INVOICE);
lifecycle!(BillStatus, "Bill", BILL);
lifecycle!(PaymentStatus, "Payment", PAYMENT);
lifecycle!(ReceiptStatus, "Sales receipt", RECEIPT);
lifecycle!(CreditNoteStatus, "Credit note", CREDIT_NOTE);
lifecycle!(SalesOrderStatus, "Sales order", SALES_ORDER);
lifecycle!(ExpenseStatus, "Expense", EXPENSE);
lifecycle!(AdjustmentStatus, "Stock adjustment", STOCK_ADJUSTMENT);
lifecycle!(DepreciationStatus, "Asset depreciation", DEPRECIATION);
lifecycle!(ProjectTransactionStatus, "Project transaction", PROJECT_TRANSACTION);
