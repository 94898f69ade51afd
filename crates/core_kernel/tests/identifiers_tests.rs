//! Unit tests for the identifier newtypes
//!
//! Covers creation, parsing with and without prefixes, conversion,
//! and serialization.

use core_kernel::{
    AccountId, BillId, InvoiceId, JournalEntryId, LedgerRowId, OrganizationId, ProductId,
};
use uuid::Uuid;

#[test]
fn test_new_generates_unique_ids() {
    let id1 = AccountId::new();
    let id2 = AccountId::new();
    assert_ne!(id1, id2);
}

#[test]
fn test_v7_ids_are_time_ordered() {
    let id1 = JournalEntryId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let id2 = JournalEntryId::new();
    assert!(id1 < id2);
}

#[test]
fn test_prefixes() {
    assert_eq!(OrganizationId::prefix(), "ORG");
    assert_eq!(AccountId::prefix(), "ACC");
    assert_eq!(JournalEntryId::prefix(), "JNL");
    assert_eq!(LedgerRowId::prefix(), "GL");
    assert_eq!(InvoiceId::prefix(), "INV");
    assert_eq!(BillId::prefix(), "BILL");
    assert_eq!(ProductId::prefix(), "PRD");
}

#[test]
fn test_parse_with_and_without_prefix() {
    let uuid = Uuid::new_v4();
    let with_prefix: InvoiceId = format!("INV-{}", uuid).parse().unwrap();
    let without_prefix: InvoiceId = uuid.to_string().parse().unwrap();
    assert_eq!(with_prefix, without_prefix);
    assert_eq!(*with_prefix.as_uuid(), uuid);
}

#[test]
fn test_parse_invalid() {
    assert!("INV-not-a-uuid".parse::<InvoiceId>().is_err());
}

#[test]
fn test_serializes_as_bare_uuid() {
    let uuid = Uuid::new_v4();
    let id = AccountId::from_uuid(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", uuid));

    let back: AccountId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
