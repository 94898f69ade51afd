//! Strongly-typed identifiers for ledger entities and source documents
//!
//! Each id is a UUID newtype displayed with a short prefix (`ACC-…`,
//! `INV-…`). Parsing accepts the prefixed or the bare form. New ids are
//! UUID v7, so they sort by creation time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Display prefix, without the dash
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Tenancy
define_id!(OrganizationId, "ORG");

// Ledger identifiers
define_id!(AccountId, "ACC");
define_id!(JournalEntryId, "JNL");
define_id!(LedgerRowId, "GL");

// Sales documents
define_id!(InvoiceId, "INV");
define_id!(PaymentId, "PAY");
define_id!(ReceiptId, "RCP");
define_id!(CreditNoteId, "CN");
define_id!(SalesOrderId, "SO");

// Purchasing documents
define_id!(BillId, "BILL");
define_id!(BillPaymentId, "BPAY");
define_id!(ExpenseId, "EXP");

// Inventory
define_id!(ProductId, "PRD");
define_id!(StockAdjustmentId, "ADJ");

// Fixed assets and projects
define_id!(AssetId, "AST");
define_id!(DepreciationId, "DEP");
define_id!(ProjectId, "PRJ");
define_id!(ProjectTransactionId, "PTX");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_display() {
        let id = AccountId::new();
        assert!(id.to_string().starts_with("ACC-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = JournalEntryId::new();
        let parsed: JournalEntryId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_new_ids_are_v7() {
        let id = LedgerRowId::new();
        assert_eq!(id.as_uuid().get_version_num(), 7);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let org = OrganizationId::from(uuid);
        let back: Uuid = org.into();
        assert_eq!(uuid, back);
    }
}
