//! Source documents handed to the posting engine
//!
//! Documents are owned by the CRUD side of the application. The ledger only
//! loads them, checks their lifecycle, posts them and stamps back the accounts
//! and journal entry it used. They are stored as JSON bodies keyed by
//! organization, kind and id.

macro_rules! source_document {
    ($ty:ty, $kind:expr, $number:ident) => {
        impl $crate::documents::SourceDocument for $ty {
            const KIND: $crate::documents::DocumentKind = $kind;

            fn document_id(&self) -> uuid::Uuid {
                *self.id.as_uuid()
            }

            fn organization_id(&self) -> core_kernel::OrganizationId {
                self.organization_id
            }

            fn document_number(&self) -> Option<&str> {
                Some(&self.$number)
            }
        }
    };
}

pub mod sales;
pub mod purchases;
pub mod inventory;
pub mod assets;
pub mod projects;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::OrganizationId;

use crate::error::LedgerError;
use crate::journal::EntryReference;
use crate::ports::LedgerTransaction;

/// Kinds of stored documents; also the reference type of journal entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Payment,
    SalesReceipt,
    CreditNote,
    SalesOrder,
    Bill,
    BillPayment,
    Expense,
    Product,
    StockAdjustment,
    FixedAsset,
    AssetDepreciation,
    Project,
    ProjectTransaction,
}

impl DocumentKind {
    /// Snake case name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Payment => "payment",
            DocumentKind::SalesReceipt => "sales_receipt",
            DocumentKind::CreditNote => "credit_note",
            DocumentKind::SalesOrder => "sales_order",
            DocumentKind::Bill => "bill",
            DocumentKind::BillPayment => "bill_payment",
            DocumentKind::Expense => "expense",
            DocumentKind::Product => "product",
            DocumentKind::StockAdjustment => "stock_adjustment",
            DocumentKind::FixedAsset => "fixed_asset",
            DocumentKind::AssetDepreciation => "asset_depreciation",
            DocumentKind::Project => "project",
            DocumentKind::ProjectTransaction => "project_transaction",
        }
    }

    /// Name used in error messages
    pub fn entity_name(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "Invoice",
            DocumentKind::Payment => "Payment",
            DocumentKind::SalesReceipt => "Sales receipt",
            DocumentKind::CreditNote => "Credit note",
            DocumentKind::SalesOrder => "Sales order",
            DocumentKind::Bill => "Bill",
            DocumentKind::BillPayment => "Bill payment",
            DocumentKind::Expense => "Expense",
            DocumentKind::Product => "Product",
            DocumentKind::StockAdjustment => "Stock adjustment",
            DocumentKind::FixedAsset => "Fixed asset",
            DocumentKind::AssetDepreciation => "Asset depreciation",
            DocumentKind::Project => "Project",
            DocumentKind::ProjectTransaction => "Project transaction",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "invoice" => DocumentKind::Invoice,
            "payment" => DocumentKind::Payment,
            "sales_receipt" => DocumentKind::SalesReceipt,
            "credit_note" => DocumentKind::CreditNote,
            "sales_order" => DocumentKind::SalesOrder,
            "bill" => DocumentKind::Bill,
            "bill_payment" => DocumentKind::BillPayment,
            "expense" => DocumentKind::Expense,
            "product" => DocumentKind::Product,
            "stock_adjustment" => DocumentKind::StockAdjustment,
            "fixed_asset" => DocumentKind::FixedAsset,
            "asset_depreciation" => DocumentKind::AssetDepreciation,
            "project" => DocumentKind::Project,
            "project_transaction" => DocumentKind::ProjectTransaction,
            other => return Err(LedgerError::validation(format!("unknown document kind '{}'", other))),
        };
        Ok(kind)
    }
}

/// A document the ledger can load and save
pub trait SourceDocument: Serialize + DeserializeOwned + Send + Sync {
    /// Storage kind of the document
    const KIND: DocumentKind;

    /// Raw identifier used as the storage key and journal reference
    fn document_id(&self) -> Uuid;

    /// Owning organization
    fn organization_id(&self) -> OrganizationId;

    /// Human-readable number, if the document has one
    fn document_number(&self) -> Option<&str> {
        None
    }

    /// Journal reference pointing at this document
    fn entry_reference(&self) -> EntryReference {
        let reference = EntryReference::new(Self::KIND, self.document_id());
        match self.document_number() {
            Some(number) => reference.with_number(number),
            None => reference,
        }
    }
}

/// Loads a document of type `D` through the transaction
///
/// # Errors
///
/// Returns `NotFound` if no active document exists in this organization
pub async fn load_document<D: SourceDocument>(
    tx: &mut dyn LedgerTransaction,
    id: Uuid,
) -> Result<D, LedgerError> {
    let body = tx
        .document(D::KIND, id)
        .await?
        .ok_or_else(|| LedgerError::not_found(D::KIND.entity_name(), id))?;
    let document: D = serde_json::from_value(body)?;
    if document.organization_id() != tx.organization_id() {
        return Err(LedgerError::not_found(D::KIND.entity_name(), id));
    }
    Ok(document)
}

/// Saves a document through the transaction
///
/// # Errors
///
/// Returns `Validation` if the document belongs to another organization
pub async fn save_document<D: SourceDocument>(
    tx: &mut dyn LedgerTransaction,
    document: &D,
) -> Result<(), LedgerError> {
    if document.organization_id() != tx.organization_id() {
        return Err(LedgerError::validation(format!(
            "{} {} belongs to another organization",
            D::KIND.entity_name(),
            document.document_id()
        )));
    }
    let body = serde_json::to_value(document)?;
    tx.put_document(D::KIND, document.document_id(), &body).await?;
    Ok(())
}
