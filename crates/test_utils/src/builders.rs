//! Test Data Builders
//!
//! Builders for source documents and journal entry requests. Tests set only
//! the fields they care about; everything else gets a sensible default from
//! the fixtures.

use chrono::NaiveDate;
use fake::faker::company::en::CompanyName;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AccountId, OrganizationId, ProductId};
use domain_ledger::documents::inventory::{AdjustmentDirection, Product, StockAdjustment};
use domain_ledger::documents::purchases::{Bill, BillPayment};
use domain_ledger::documents::sales::{Invoice, Payment, SalesOrder, SalesOrderLine};
use domain_ledger::{EntryType, LineItem, NewJournalEntry};

use crate::fixtures::{AmountFixtures, DateFixtures, NumberFixtures};

/// Builder for invoices
pub struct InvoiceBuilder {
    organization_id: OrganizationId,
    number: String,
    issue_date: NaiveDate,
    subtotal: Decimal,
    tax: Decimal,
    customer: Option<String>,
    revenue_account: Option<AccountId>,
}

impl InvoiceBuilder {
    /// A 1000 + 100 tax invoice dated mid-January
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            number: NumberFixtures::invoice(1),
            issue_date: DateFixtures::posting_date(),
            subtotal: AmountFixtures::subtotal(),
            tax: AmountFixtures::tax(),
            customer: None,
            revenue_account: None,
        }
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn amounts(mut self, subtotal: Decimal, tax: Decimal) -> Self {
        self.subtotal = subtotal;
        self.tax = tax;
        self
    }

    pub fn customer(mut self, name: impl Into<String>) -> Self {
        self.customer = Some(name.into());
        self
    }

    pub fn revenue_account(mut self, account_id: AccountId) -> Self {
        self.revenue_account = Some(account_id);
        self
    }

    pub fn build(self) -> Invoice {
        let customer = self.customer.unwrap_or_else(|| CompanyName().fake());
        let mut invoice = Invoice::new(self.organization_id, self.number, self.issue_date, self.subtotal, self.tax)
            .with_customer(customer);
        invoice.revenue_account_id = self.revenue_account;
        invoice
    }
}

/// Builder for customer payments against an invoice
pub struct PaymentBuilder {
    invoice: Invoice,
    number: String,
    payment_date: NaiveDate,
    amount: Option<Decimal>,
}

impl PaymentBuilder {
    /// Pays the invoice's full balance by default
    pub fn for_invoice(invoice: &Invoice) -> Self {
        Self {
            invoice: invoice.clone(),
            number: NumberFixtures::payment(1),
            payment_date: DateFixtures::next_month(),
            amount: None,
        }
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn build(self) -> Payment {
        let amount = self.amount.unwrap_or_else(|| self.invoice.balance_due());
        Payment::new(
            self.invoice.organization_id,
            self.number,
            self.invoice.id,
            self.payment_date,
            amount,
        )
    }
}

/// Builder for vendor bills
pub struct BillBuilder {
    organization_id: OrganizationId,
    number: String,
    bill_date: NaiveDate,
    subtotal: Decimal,
    tax: Decimal,
    vendor: Option<String>,
    expense_account: Option<AccountId>,
}

impl BillBuilder {
    /// A 1000 + 100 tax bill dated mid-January
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            number: NumberFixtures::bill(1),
            bill_date: DateFixtures::posting_date(),
            subtotal: AmountFixtures::subtotal(),
            tax: AmountFixtures::tax(),
            vendor: None,
            expense_account: None,
        }
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn amounts(mut self, subtotal: Decimal, tax: Decimal) -> Self {
        self.subtotal = subtotal;
        self.tax = tax;
        self
    }

    pub fn expense_account(mut self, account_id: AccountId) -> Self {
        self.expense_account = Some(account_id);
        self
    }

    pub fn build(self) -> Bill {
        let vendor = self.vendor.unwrap_or_else(|| CompanyName().fake());
        let mut bill = Bill::new(self.organization_id, self.number, self.bill_date, self.subtotal, self.tax)
            .with_vendor(vendor);
        bill.expense_account_id = self.expense_account;
        bill
    }
}

/// Builds a payment for the bill's full balance
pub fn bill_payment_for(bill: &Bill, amount: Option<Decimal>) -> BillPayment {
    BillPayment::new(
        bill.organization_id,
        NumberFixtures::bill_payment(1),
        bill.id,
        DateFixtures::next_month(),
        amount.unwrap_or_else(|| bill.balance_due()),
    )
}

/// Builder for products
pub struct ProductBuilder {
    organization_id: OrganizationId,
    sku: String,
    name: String,
    cost_price: Decimal,
    unit_price: Decimal,
    stock: Decimal,
    tracked: bool,
}

impl ProductBuilder {
    /// A tracked product costing 5.00 with no stock
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            sku: NumberFixtures::sku(1),
            name: "Widget".to_string(),
            cost_price: AmountFixtures::unit_cost(),
            unit_price: AmountFixtures::unit_price(),
            stock: Decimal::ZERO,
            tracked: true,
        }
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub fn cost_price(mut self, cost: Decimal) -> Self {
        self.cost_price = cost;
        self
    }

    pub fn stock(mut self, quantity: Decimal) -> Self {
        self.stock = quantity;
        self
    }

    pub fn untracked(mut self) -> Self {
        self.tracked = false;
        self
    }

    pub fn build(self) -> Product {
        let product = Product::new(self.organization_id, self.sku, self.name, self.cost_price, self.unit_price)
            .with_stock(self.stock);
        if self.tracked {
            product
        } else {
            product.untracked()
        }
    }
}

/// Builds a draft stock adjustment for a product
pub fn stock_adjustment(
    product: &Product,
    direction: AdjustmentDirection,
    quantity: Decimal,
) -> StockAdjustment {
    StockAdjustment::new(
        product.organization_id,
        NumberFixtures::adjustment(1),
        product.id,
        DateFixtures::posting_date(),
        direction,
        quantity,
    )
}

/// Builder for sales orders
pub struct SalesOrderBuilder {
    organization_id: OrganizationId,
    number: String,
    lines: Vec<SalesOrderLine>,
    tax: Decimal,
    paid: bool,
}

impl SalesOrderBuilder {
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            number: "SO-0001".to_string(),
            lines: Vec::new(),
            tax: Decimal::ZERO,
            paid: false,
        }
    }

    /// Adds a line for a product at its unit price
    pub fn line(mut self, product_id: ProductId, quantity: Decimal, unit_price: Decimal) -> Self {
        self.lines.push(SalesOrderLine::new(product_id, quantity, unit_price));
        self
    }

    pub fn tax(mut self, tax: Decimal) -> Self {
        self.tax = tax;
        self
    }

    /// Settled in cash on confirmation
    pub fn paid(mut self) -> Self {
        self.paid = true;
        self
    }

    pub fn build(self) -> SalesOrder {
        let order = SalesOrder::new(
            self.organization_id,
            self.number,
            DateFixtures::posting_date(),
            self.lines,
            self.tax,
        );
        if self.paid {
            order.paid()
        } else {
            order
        }
    }
}

/// Builder for manual journal entry requests
pub struct EntryBuilder {
    request: NewJournalEntry,
}

impl EntryBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            request: NewJournalEntry::new(DateFixtures::posting_date(), description),
        }
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.request.entry_date = date;
        self
    }

    pub fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.request.entry_type = entry_type;
        self
    }

    pub fn debit(mut self, account_id: AccountId, amount: Decimal) -> Self {
        self.request.lines.push(LineItem::debit(account_id, amount));
        self
    }

    pub fn credit(mut self, account_id: AccountId, amount: Decimal) -> Self {
        self.request.lines.push(LineItem::credit(account_id, amount));
        self
    }

    /// Debit one account and credit another for the same amount
    pub fn transfer(self, debit: AccountId, credit: AccountId, amount: Decimal) -> Self {
        self.debit(debit, amount).credit(credit, amount)
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.request.actor = Some(actor.into());
        self
    }

    pub fn build(self) -> NewJournalEntry {
        self.request
    }
}

impl Default for EntryBuilder {
    fn default() -> Self {
        Self::new("Test entry")
    }
}
