//! Sales translators: invoices, customer payments, cash sales, credit notes
//! and sales-order confirmation

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use core_kernel::{
    round_amount, within_tolerance, AccountId, CreditNoteId, InvoiceId, PaymentId, ProductId,
    ReceiptId, SalesOrderId,
};

use crate::chart::{resolve_account, DefaultAccount};
use crate::config::LedgerConfig;
use crate::documents::inventory::Product;
use crate::documents::sales::{
    CreditNote, CreditNoteStatus, Invoice, InvoiceStatus, Payment, PaymentStatus, ReceiptStatus,
    SalesOrder, SalesOrderStatus, SalesReceipt,
};
use crate::documents::{load_document, save_document};
use crate::error::LedgerError;
use crate::journal::LineItem;
use crate::lifecycle::check_transition;
use crate::ports::LedgerTransaction;
use crate::translators::{
    check_amounts, existing_posting, post_document, sale_lines, transfer_lines, void_posting,
    CancellationOutcome, PostingOutcome,
};

/// Posts an invoice when it is sent
///
/// Debit Receivable (total); Credit Revenue (subtotal); Credit Tax Payable
/// (tax, when positive).
pub async fn post_invoice(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: InvoiceId,
    actor: Option<&str>,
) -> Result<PostingOutcome<Invoice>, LedgerError> {
    let mut invoice: Invoice = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &invoice).await? {
        return Ok(PostingOutcome { document: invoice, entry, already_posted: true });
    }
    check_transition(invoice.status, InvoiceStatus::Sent)?;
    check_amounts("Invoice", invoice.subtotal, invoice.tax_amount, invoice.total)?;

    let receivable = resolve_account(tx, config, invoice.receivable_account_id, DefaultAccount::AccountsReceivable).await?;
    let revenue = resolve_account(tx, config, invoice.revenue_account_id, DefaultAccount::SalesRevenue).await?;
    let tax = if invoice.tax_amount > Decimal::ZERO {
        Some(resolve_account(tx, config, invoice.tax_account_id, DefaultAccount::TaxPayable).await?)
    } else {
        None
    };

    let lines = sale_lines(receivable, revenue, tax, invoice.subtotal, invoice.tax_amount, invoice.total);
    let entry = post_document(
        tx,
        config,
        &invoice,
        invoice.issue_date,
        format!("Invoice {}", invoice.invoice_number),
        lines,
        actor,
    )
    .await?;

    invoice.receivable_account_id = Some(receivable);
    invoice.revenue_account_id = Some(revenue);
    invoice.tax_account_id = tax.or(invoice.tax_account_id);
    invoice.journal_entry_id = Some(entry.id);
    invoice.status = InvoiceStatus::Sent;
    invoice.updated_at = Utc::now();
    save_document(tx, &invoice).await?;

    info!(invoice = %invoice.invoice_number, entry_number = %entry.entry_number, "Posted invoice");
    Ok(PostingOutcome { document: invoice, entry, already_posted: false })
}

/// Applies a customer payment to its invoice
///
/// Debit Cash (amount); Credit Receivable (amount). The invoice's paid
/// amount grows and its status moves to `PartiallyPaid` or `Paid`.
///
/// # Errors
///
/// `Validation` if the amount is not positive or exceeds the balance due
pub async fn record_invoice_payment(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: PaymentId,
    actor: Option<&str>,
) -> Result<PostingOutcome<Payment>, LedgerError> {
    let mut payment: Payment = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &payment).await? {
        return Ok(PostingOutcome { document: payment, entry, already_posted: true });
    }
    check_transition(payment.status, PaymentStatus::Completed)?;

    let mut invoice: Invoice = load_document(tx, *payment.invoice_id.as_uuid()).await?;
    if payment.amount <= Decimal::ZERO {
        return Err(LedgerError::validation("payment amount must be greater than zero"));
    }
    let balance_due = invoice.balance_due();
    if payment.amount - balance_due >= config.balance_tolerance {
        return Err(LedgerError::validation(format!(
            "payment of {} exceeds invoice {} balance due of {}",
            payment.amount, invoice.invoice_number, balance_due
        )));
    }
    let paid_amount = invoice.paid_amount + payment.amount;
    let next_status = if within_tolerance(paid_amount, invoice.total, config.balance_tolerance) || paid_amount > invoice.total {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    };
    check_transition(invoice.status, next_status)?;

    let deposit = resolve_account(tx, config, payment.deposit_account_id, DefaultAccount::Cash).await?;
    let receivable = resolve_account(
        tx,
        config,
        payment.receivable_account_id.or(invoice.receivable_account_id),
        DefaultAccount::AccountsReceivable,
    )
    .await?;

    let entry = post_document(
        tx,
        config,
        &payment,
        payment.payment_date,
        format!("Payment {} for invoice {}", payment.payment_number, invoice.invoice_number),
        transfer_lines(deposit, receivable, payment.amount),
        actor,
    )
    .await?;

    let now = Utc::now();
    payment.deposit_account_id = Some(deposit);
    payment.receivable_account_id = Some(receivable);
    payment.journal_entry_id = Some(entry.id);
    payment.status = PaymentStatus::Completed;
    payment.updated_at = now;
    save_document(tx, &payment).await?;

    invoice.paid_amount = paid_amount;
    invoice.status = next_status;
    invoice.updated_at = now;
    save_document(tx, &invoice).await?;

    info!(
        payment = %payment.payment_number,
        invoice = %invoice.invoice_number,
        status = ?invoice.status,
        "Recorded invoice payment"
    );
    Ok(PostingOutcome { document: payment, entry, already_posted: false })
}

/// Cancels an invoice, voiding its entry if it was posted
pub async fn cancel_invoice(
    tx: &mut dyn LedgerTransaction,
    id: InvoiceId,
    reason: &str,
    actor: Option<&str>,
) -> Result<CancellationOutcome<Invoice>, LedgerError> {
    let mut invoice: Invoice = load_document(tx, *id.as_uuid()).await?;
    let effect = check_transition(invoice.status, InvoiceStatus::Void)?;
    let voided_entry = void_posting(tx, &invoice, effect, reason, actor).await?;

    invoice.status = InvoiceStatus::Void;
    invoice.updated_at = Utc::now();
    save_document(tx, &invoice).await?;
    Ok(CancellationOutcome { document: invoice, voided_entry })
}

/// Posts a cash sale
///
/// Debit Cash (total); Credit Revenue (subtotal); Credit Tax Payable (tax).
pub async fn complete_sales_receipt(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: ReceiptId,
    actor: Option<&str>,
) -> Result<PostingOutcome<SalesReceipt>, LedgerError> {
    let mut receipt: SalesReceipt = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &receipt).await? {
        return Ok(PostingOutcome { document: receipt, entry, already_posted: true });
    }
    check_transition(receipt.status, ReceiptStatus::Completed)?;
    check_amounts("Sales receipt", receipt.subtotal, receipt.tax_amount, receipt.total)?;

    let deposit = resolve_account(tx, config, receipt.deposit_account_id, DefaultAccount::Cash).await?;
    let revenue = resolve_account(tx, config, receipt.revenue_account_id, DefaultAccount::SalesRevenue).await?;
    let tax = if receipt.tax_amount > Decimal::ZERO {
        Some(resolve_account(tx, config, receipt.tax_account_id, DefaultAccount::TaxPayable).await?)
    } else {
        None
    };

    let lines = sale_lines(deposit, revenue, tax, receipt.subtotal, receipt.tax_amount, receipt.total);
    let entry = post_document(
        tx,
        config,
        &receipt,
        receipt.receipt_date,
        format!("Sales receipt {}", receipt.receipt_number),
        lines,
        actor,
    )
    .await?;

    receipt.deposit_account_id = Some(deposit);
    receipt.revenue_account_id = Some(revenue);
    receipt.tax_account_id = tax.or(receipt.tax_account_id);
    receipt.journal_entry_id = Some(entry.id);
    receipt.status = ReceiptStatus::Completed;
    receipt.updated_at = Utc::now();
    save_document(tx, &receipt).await?;

    info!(receipt = %receipt.receipt_number, entry_number = %entry.entry_number, "Posted sales receipt");
    Ok(PostingOutcome { document: receipt, entry, already_posted: false })
}

/// Lines for a credit note: the mirror image of a sale
pub fn credit_note_lines(
    receivable: AccountId,
    revenue: AccountId,
    tax: Option<AccountId>,
    note: &CreditNote,
) -> Vec<LineItem> {
    sale_lines(receivable, revenue, tax, note.subtotal, note.tax_amount, note.total)
        .iter()
        .map(LineItem::reversed)
        .collect()
}

/// Issues a credit note
///
/// Debit Revenue (subtotal); Debit Tax Payable (tax); Credit Receivable
/// (total). Accounts stamped on the credited invoice are reused.
pub async fn issue_credit_note(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: CreditNoteId,
    actor: Option<&str>,
) -> Result<PostingOutcome<CreditNote>, LedgerError> {
    let mut note: CreditNote = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &note).await? {
        return Ok(PostingOutcome { document: note, entry, already_posted: true });
    }
    check_transition(note.status, CreditNoteStatus::Issued)?;
    check_amounts("Credit note", note.subtotal, note.tax_amount, note.total)?;

    let invoice: Option<Invoice> = match note.invoice_id {
        Some(invoice_id) => Some(load_document(tx, *invoice_id.as_uuid()).await?),
        None => None,
    };
    let stamped = |pick: fn(&Invoice) -> Option<AccountId>| invoice.as_ref().and_then(pick);

    let receivable = resolve_account(
        tx,
        config,
        note.receivable_account_id.or(stamped(|i| i.receivable_account_id)),
        DefaultAccount::AccountsReceivable,
    )
    .await?;
    let revenue = resolve_account(
        tx,
        config,
        note.revenue_account_id.or(stamped(|i| i.revenue_account_id)),
        DefaultAccount::SalesRevenue,
    )
    .await?;
    let tax = if note.tax_amount > Decimal::ZERO {
        let explicit = note.tax_account_id.or(stamped(|i| i.tax_account_id));
        Some(resolve_account(tx, config, explicit, DefaultAccount::TaxPayable).await?)
    } else {
        None
    };

    let lines = credit_note_lines(receivable, revenue, tax, &note);
    let entry = post_document(
        tx,
        config,
        &note,
        note.issue_date,
        format!("Credit note {}", note.credit_note_number),
        lines,
        actor,
    )
    .await?;

    note.receivable_account_id = Some(receivable);
    note.revenue_account_id = Some(revenue);
    note.tax_account_id = tax.or(note.tax_account_id);
    note.journal_entry_id = Some(entry.id);
    note.status = CreditNoteStatus::Issued;
    note.updated_at = Utc::now();
    save_document(tx, &note).await?;

    info!(credit_note = %note.credit_note_number, entry_number = %entry.entry_number, "Issued credit note");
    Ok(PostingOutcome { document: note, entry, already_posted: false })
}

/// Accounts used by a sales-order confirmation
#[derive(Debug, Clone, Copy)]
pub struct SalesOrderAccounts {
    /// Receivable, or cash when paid on confirmation
    pub debit: AccountId,
    pub revenue: AccountId,
    pub tax: Option<AccountId>,
    pub cogs: AccountId,
    pub inventory: AccountId,
}

/// Lines for a sales-order confirmation
///
/// The sale part mirrors an invoice; the cost part moves `cost` from
/// inventory to cost of goods sold and is omitted when the cost is zero.
pub fn sales_order_lines(order: &SalesOrder, accounts: &SalesOrderAccounts, cost: Decimal) -> Vec<LineItem> {
    let mut lines = sale_lines(
        accounts.debit,
        accounts.revenue,
        accounts.tax,
        order.subtotal,
        order.tax_amount,
        order.total,
    );
    if cost > Decimal::ZERO {
        lines.push(LineItem::debit(accounts.cogs, cost).with_description("Cost of goods sold"));
        lines.push(LineItem::credit(accounts.inventory, cost).with_description("Inventory relieved"));
    }
    lines
}

/// Confirms a sales order
///
/// Books the sale and its cost in one entry and decrements stock of tracked
/// products. Every tracked product is checked for sufficient stock before
/// anything is written.
///
/// # Errors
///
/// `InsufficientStock` if any tracked product lacks the ordered quantity
pub async fn confirm_sales_order(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: SalesOrderId,
    actor: Option<&str>,
) -> Result<PostingOutcome<SalesOrder>, LedgerError> {
    let mut order: SalesOrder = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &order).await? {
        return Ok(PostingOutcome { document: order, entry, already_posted: true });
    }
    check_transition(order.status, SalesOrderStatus::Confirmed)?;
    if order.lines.is_empty() {
        return Err(LedgerError::validation("sales order has no lines"));
    }
    if order.lines.iter().any(|l| l.quantity <= Decimal::ZERO) {
        return Err(LedgerError::validation("sales order line quantities must be greater than zero"));
    }
    check_amounts("Sales order", order.subtotal, order.tax_amount, order.total)?;

    let mut required: BTreeMap<ProductId, Decimal> = BTreeMap::new();
    for line in &order.lines {
        *required.entry(line.product_id).or_insert(Decimal::ZERO) += line.quantity;
    }

    let mut products = Vec::with_capacity(required.len());
    for (product_id, quantity) in &required {
        let product: Product = load_document(tx, *product_id.as_uuid()).await?;
        if product.track_inventory && *quantity > product.stock_quantity {
            return Err(LedgerError::InsufficientStock {
                product: format!("{} ({})", product.name, product.sku),
                required: *quantity,
                available: product.stock_quantity,
            });
        }
        products.push((product, *quantity));
    }

    let cost = round_amount(
        products
            .iter()
            .map(|(product, quantity)| product.cost_price * *quantity)
            .sum::<Decimal>(),
    );

    let debit_role = if order.paid_on_confirmation {
        DefaultAccount::Cash
    } else {
        DefaultAccount::AccountsReceivable
    };
    let accounts = SalesOrderAccounts {
        debit: resolve_account(tx, config, order.receivable_account_id, debit_role).await?,
        revenue: resolve_account(tx, config, order.revenue_account_id, DefaultAccount::SalesRevenue).await?,
        tax: if order.tax_amount > Decimal::ZERO {
            Some(resolve_account(tx, config, order.tax_account_id, DefaultAccount::TaxPayable).await?)
        } else {
            None
        },
        cogs: resolve_account(tx, config, order.cogs_account_id, DefaultAccount::CostOfGoodsSold).await?,
        inventory: resolve_account(tx, config, order.inventory_account_id, DefaultAccount::Inventory).await?,
    };

    let entry = post_document(
        tx,
        config,
        &order,
        order.order_date,
        format!("Sales order {}", order.order_number),
        sales_order_lines(&order, &accounts, cost),
        actor,
    )
    .await?;

    let now = Utc::now();
    for (mut product, quantity) in products {
        if product.track_inventory {
            product.stock_quantity -= quantity;
            product.updated_at = now;
            save_document(tx, &product).await?;
        }
    }

    order.receivable_account_id = Some(accounts.debit);
    order.revenue_account_id = Some(accounts.revenue);
    order.tax_account_id = accounts.tax.or(order.tax_account_id);
    order.cogs_account_id = Some(accounts.cogs);
    order.inventory_account_id = Some(accounts.inventory);
    order.journal_entry_id = Some(entry.id);
    order.status = SalesOrderStatus::Confirmed;
    order.updated_at = now;
    save_document(tx, &order).await?;

    info!(
        order = %order.order_number,
        entry_number = %entry.entry_number,
        cost = %cost,
        "Confirmed sales order"
    );
    Ok(PostingOutcome { document: order, entry, already_posted: false })
}
