//! Purchase translators: vendor bills, bill payments and expenses
//!
//! There is exactly one bill translator; approval is the only transition
//! that posts a bill.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use core_kernel::{within_tolerance, BillId, BillPaymentId, ExpenseId};

use crate::chart::{resolve_account, DefaultAccount};
use crate::config::LedgerConfig;
use crate::documents::purchases::{Bill, BillPayment, BillStatus, Expense, ExpenseStatus};
use crate::documents::sales::PaymentStatus;
use crate::documents::{load_document, save_document};
use crate::error::LedgerError;
use crate::lifecycle::check_transition;
use crate::ports::LedgerTransaction;
use crate::translators::{
    check_amounts, existing_posting, post_document, purchase_lines, transfer_lines, void_posting,
    CancellationOutcome, PostingOutcome,
};

/// Posts a bill when it is approved
///
/// Debit Expense (subtotal); Debit Input Tax (tax, when positive); Credit
/// Payable (total).
pub async fn approve_bill(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: BillId,
    actor: Option<&str>,
) -> Result<PostingOutcome<Bill>, LedgerError> {
    let mut bill: Bill = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &bill).await? {
        return Ok(PostingOutcome { document: bill, entry, already_posted: true });
    }
    check_transition(bill.status, BillStatus::Approved)?;
    check_amounts("Bill", bill.subtotal, bill.tax_amount, bill.total)?;

    let expense = resolve_account(tx, config, bill.expense_account_id, DefaultAccount::OperatingExpense).await?;
    let tax = if bill.tax_amount > Decimal::ZERO {
        Some(resolve_account(tx, config, bill.tax_account_id, DefaultAccount::InputTax).await?)
    } else {
        None
    };
    let payable = resolve_account(tx, config, bill.payable_account_id, DefaultAccount::AccountsPayable).await?;

    let lines = purchase_lines(expense, tax, payable, bill.subtotal, bill.tax_amount, bill.total);
    let entry = post_document(
        tx,
        config,
        &bill,
        bill.bill_date,
        format!("Bill {}", bill.bill_number),
        lines,
        actor,
    )
    .await?;

    bill.expense_account_id = Some(expense);
    bill.tax_account_id = tax.or(bill.tax_account_id);
    bill.payable_account_id = Some(payable);
    bill.journal_entry_id = Some(entry.id);
    bill.status = BillStatus::Approved;
    bill.updated_at = Utc::now();
    save_document(tx, &bill).await?;

    info!(bill = %bill.bill_number, entry_number = %entry.entry_number, "Posted bill");
    Ok(PostingOutcome { document: bill, entry, already_posted: false })
}

/// Pays (part of) an approved bill
///
/// Debit Payable (amount); Credit Cash (amount). The bill's paid amount
/// grows and its status moves to `PartiallyPaid` or `Paid`.
///
/// # Errors
///
/// `Validation` if the amount is not positive or exceeds the balance owed
pub async fn pay_bill(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: BillPaymentId,
    actor: Option<&str>,
) -> Result<PostingOutcome<BillPayment>, LedgerError> {
    let mut payment: BillPayment = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &payment).await? {
        return Ok(PostingOutcome { document: payment, entry, already_posted: true });
    }
    check_transition(payment.status, PaymentStatus::Completed)?;

    let mut bill: Bill = load_document(tx, *payment.bill_id.as_uuid()).await?;
    if payment.amount <= Decimal::ZERO {
        return Err(LedgerError::validation("payment amount must be greater than zero"));
    }
    let balance_due = bill.balance_due();
    if payment.amount - balance_due >= config.balance_tolerance {
        return Err(LedgerError::validation(format!(
            "payment of {} exceeds bill {} balance due of {}",
            payment.amount, bill.bill_number, balance_due
        )));
    }
    let paid_amount = bill.paid_amount + payment.amount;
    let next_status = if within_tolerance(paid_amount, bill.total, config.balance_tolerance) || paid_amount > bill.total {
        BillStatus::Paid
    } else {
        BillStatus::PartiallyPaid
    };
    check_transition(bill.status, next_status)?;

    let payable = resolve_account(
        tx,
        config,
        payment.payable_account_id.or(bill.payable_account_id),
        DefaultAccount::AccountsPayable,
    )
    .await?;
    let cash = resolve_account(tx, config, payment.payment_account_id, DefaultAccount::Cash).await?;

    let entry = post_document(
        tx,
        config,
        &payment,
        payment.payment_date,
        format!("Payment {} for bill {}", payment.payment_number, bill.bill_number),
        transfer_lines(payable, cash, payment.amount),
        actor,
    )
    .await?;

    let now = Utc::now();
    payment.payable_account_id = Some(payable);
    payment.payment_account_id = Some(cash);
    payment.journal_entry_id = Some(entry.id);
    payment.status = PaymentStatus::Completed;
    payment.updated_at = now;
    save_document(tx, &payment).await?;

    bill.paid_amount = paid_amount;
    bill.status = next_status;
    bill.updated_at = now;
    save_document(tx, &bill).await?;

    info!(
        payment = %payment.payment_number,
        bill = %bill.bill_number,
        balance_due = %bill.balance_due(),
        "Recorded bill payment"
    );
    Ok(PostingOutcome { document: payment, entry, already_posted: false })
}

/// Cancels a bill, voiding its entry if it was approved
pub async fn cancel_bill(
    tx: &mut dyn LedgerTransaction,
    id: BillId,
    reason: &str,
    actor: Option<&str>,
) -> Result<CancellationOutcome<Bill>, LedgerError> {
    let mut bill: Bill = load_document(tx, *id.as_uuid()).await?;
    let effect = check_transition(bill.status, BillStatus::Void)?;
    let voided_entry = void_posting(tx, &bill, effect, reason, actor).await?;

    bill.status = BillStatus::Void;
    bill.updated_at = Utc::now();
    save_document(tx, &bill).await?;
    Ok(CancellationOutcome { document: bill, voided_entry })
}

/// Posts an approved expense paid directly from cash
///
/// Debit Expense (amount); Debit Input Tax (tax); Credit Cash (total).
pub async fn approve_expense(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: ExpenseId,
    actor: Option<&str>,
) -> Result<PostingOutcome<Expense>, LedgerError> {
    let mut expense: Expense = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &expense).await? {
        return Ok(PostingOutcome { document: expense, entry, already_posted: true });
    }
    check_transition(expense.status, ExpenseStatus::Approved)?;
    check_amounts("Expense", expense.amount, expense.tax_amount, expense.total())?;

    let expense_account =
        resolve_account(tx, config, expense.expense_account_id, DefaultAccount::OperatingExpense).await?;
    let tax = if expense.tax_amount > Decimal::ZERO {
        Some(resolve_account(tx, config, expense.tax_account_id, DefaultAccount::InputTax).await?)
    } else {
        None
    };
    let cash = resolve_account(tx, config, expense.payment_account_id, DefaultAccount::Cash).await?;

    let lines = purchase_lines(expense_account, tax, cash, expense.amount, expense.tax_amount, expense.total());
    let description = match &expense.category {
        Some(category) => format!("Expense {} ({})", expense.expense_number, category),
        None => format!("Expense {}", expense.expense_number),
    };
    let entry = post_document(tx, config, &expense, expense.expense_date, description, lines, actor).await?;

    expense.expense_account_id = Some(expense_account);
    expense.tax_account_id = tax.or(expense.tax_account_id);
    expense.payment_account_id = Some(cash);
    expense.journal_entry_id = Some(entry.id);
    expense.status = ExpenseStatus::Approved;
    expense.updated_at = Utc::now();
    save_document(tx, &expense).await?;

    info!(expense = %expense.expense_number, entry_number = %entry.entry_number, "Posted expense");
    Ok(PostingOutcome { document: expense, entry, already_posted: false })
}

/// Rejects a pending expense; nothing is posted
pub async fn reject_expense(
    tx: &mut dyn LedgerTransaction,
    id: ExpenseId,
) -> Result<Expense, LedgerError> {
    let mut expense: Expense = load_document(tx, *id.as_uuid()).await?;
    check_transition(expense.status, ExpenseStatus::Rejected)?;
    expense.status = ExpenseStatus::Rejected;
    expense.updated_at = Utc::now();
    save_document(tx, &expense).await?;
    Ok(expense)
}
