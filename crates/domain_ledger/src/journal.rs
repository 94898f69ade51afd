//! Journal entries
//!
//! A journal entry groups the line items of one economic event. It is created
//! in `Draft`, moves to `Posted` once balanced, and may end in `Voided`.
//! Posted entries are never edited in place.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{sum_amounts, within_tolerance, AccountId, JournalEntryId, OrganizationId};

use crate::documents::DocumentKind;

/// Origin of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Manual,
    /// Produced by a document translator
    Automated,
    Adjustment,
    Closing,
    Opening,
    /// Mirror image of an earlier posted entry
    Reversal,
}

/// Journal entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Draft,
    Posted,
    /// Terminal
    Voided,
}

/// Link from an entry to the business document it was produced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReference {
    /// Kind of the source document
    pub reference_type: DocumentKind,
    /// Identifier of the source document
    pub reference_id: Uuid,
    /// Human-readable document number (e.g., "INV-0042")
    pub reference_number: Option<String>,
}

impl EntryReference {
    pub fn new(reference_type: DocumentKind, reference_id: Uuid) -> Self {
        Self {
            reference_type,
            reference_id,
            reference_number: None,
        }
    }

    /// Sets the display number
    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.reference_number = Some(number.into());
        self
    }
}

impl std::fmt::Display for EntryReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.reference_type, self.reference_id)
    }
}

/// One debit or credit against a single account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub account_id: AccountId,
    pub description: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl LineItem {
    /// A debit line
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            description: None,
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// A credit line
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            description: None,
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    /// Sets the line description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The same line with debit and credit swapped
    pub fn reversed(&self) -> Self {
        Self {
            account_id: self.account_id,
            description: self.description.clone(),
            debit: self.credit,
            credit: self.debit,
        }
    }
}

/// Debit and credit totals of a set of lines
pub fn line_totals(lines: &[LineItem]) -> (Decimal, Decimal) {
    (
        sum_amounts(lines.iter().map(|l| l.debit)),
        sum_amounts(lines.iter().map(|l| l.credit)),
    )
}

/// A balanced (or not yet balanced) double-entry record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub organization_id: OrganizationId,
    /// Sequential per-organization number (e.g., "JE-000001")
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub entry_type: EntryType,
    pub reference: Option<EntryReference>,
    pub description: String,
    pub lines: Vec<LineItem>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub is_balanced: bool,
    pub status: EntryStatus,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub posted_by: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub voided_by: Option<String>,
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    /// Reversal entry that offsets this one
    pub reversed_by: Option<JournalEntryId>,
    /// Entry that this reversal offsets
    pub reversal_of: Option<JournalEntryId>,
}

impl JournalEntry {
    /// Builds a draft entry from a request; totals are computed here
    pub fn draft(
        organization_id: OrganizationId,
        entry_number: String,
        request: NewJournalEntry,
        tolerance: Decimal,
    ) -> Self {
        let now = Utc::now();
        let mut entry = Self {
            id: JournalEntryId::new(),
            organization_id,
            entry_number,
            entry_date: request.entry_date,
            entry_type: request.entry_type,
            reference: request.reference,
            description: request.description,
            lines: Vec::new(),
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            is_balanced: false,
            status: EntryStatus::Draft,
            created_by: request.actor,
            created_at: now,
            updated_at: now,
            posted_by: None,
            posted_at: None,
            voided_by: None,
            voided_at: None,
            void_reason: None,
            reversed_by: None,
            reversal_of: request.reversal_of,
        };
        entry.set_lines(request.lines, tolerance);
        entry
    }

    /// Replaces the lines and recomputes totals and the balance flag
    pub fn set_lines(&mut self, lines: Vec<LineItem>, tolerance: Decimal) {
        let (debit, credit) = line_totals(&lines);
        self.lines = lines;
        self.total_debit = debit;
        self.total_credit = credit;
        self.is_balanced = within_tolerance(debit, credit, tolerance);
        self.updated_at = Utc::now();
    }

    /// Absolute difference between the totals
    pub fn difference(&self) -> Decimal {
        (self.total_debit - self.total_credit).abs()
    }

    pub fn is_draft(&self) -> bool {
        self.status == EntryStatus::Draft
    }

    pub fn is_posted(&self) -> bool {
        self.status == EntryStatus::Posted
    }

    /// Returns true if the entry references the given document
    pub fn references(&self, kind: DocumentKind, id: Uuid) -> bool {
        self.reference
            .as_ref()
            .map_or(false, |r| r.reference_type == kind && r.reference_id == id)
    }
}

/// Request to create a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub entry_date: NaiveDate,
    pub entry_type: EntryType,
    pub description: String,
    pub reference: Option<EntryReference>,
    pub lines: Vec<LineItem>,
    pub actor: Option<String>,
    pub reversal_of: Option<JournalEntryId>,
}

impl NewJournalEntry {
    /// Creates a manual entry request with no lines
    pub fn new(entry_date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            entry_date,
            entry_type: EntryType::Manual,
            description: description.into(),
            reference: None,
            lines: Vec::new(),
            actor: None,
            reversal_of: None,
        }
    }

    /// Sets the entry type
    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = entry_type;
        self
    }

    /// Sets the source document reference
    pub fn with_reference(mut self, reference: EntryReference) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Sets the acting user
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Replaces all lines
    pub fn with_lines(mut self, lines: Vec<LineItem>) -> Self {
        self.lines = lines;
        self
    }

    /// Appends a debit line
    pub fn debit(mut self, account_id: AccountId, amount: Decimal) -> Self {
        self.lines.push(LineItem::debit(account_id, amount));
        self
    }

    /// Appends a credit line
    pub fn credit(mut self, account_id: AccountId, amount: Decimal) -> Self {
        self.lines.push(LineItem::credit(account_id, amount));
        self
    }
}
