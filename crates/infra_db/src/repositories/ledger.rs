//! Ledger repository implementation
//!
//! SQL for accounts, journal entries, ledger rows and stored documents. Every
//! function takes the connection of an open transaction; the adapter decides
//! where the transaction starts and ends. Reads go through the `active_*`
//! views so tombstoned rows never leave the database.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgConnection;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Account type as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "snake_case")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Journal entry type as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "entry_type", rename_all = "snake_case")]
pub enum EntryType {
    Manual,
    Automated,
    Adjustment,
    Closing,
    Opening,
    Reversal,
}

/// Journal entry status as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "entry_status", rename_all = "snake_case")]
pub enum EntryStatus {
    Draft,
    Posted,
    Voided,
}

/// Database row for an account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub subtype: Option<String>,
    pub parent_id: Option<Uuid>,
    pub is_parent: bool,
    pub is_active: bool,
    pub is_system_account: bool,
    pub description: Option<String>,
    pub debit_balance: Decimal,
    pub credit_balance: Decimal,
    pub current_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Database row for a journal entry
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JournalEntryRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub entry_type: EntryType,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub reference_number: Option<String>,
    pub description: String,
    /// Line items as a JSON array
    pub lines: Value,
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
    pub reversed_by: Option<Uuid>,
    pub reversal_of: Option<Uuid>,
}

/// Database row for a general ledger row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRowRecord {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub account_id: Uuid,
    pub journal_entry_id: Uuid,
    pub entry_number: String,
    pub transaction_date: NaiveDate,
    pub description: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub running_balance: Decimal,
    pub fiscal_year: i32,
    pub fiscal_period: i32,
    pub is_reconciled: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Filter for ledger row reads; `None` matches everything
#[derive(Debug, Clone, Default)]
pub struct LedgerRowFilter {
    pub account_id: Option<Uuid>,
    pub journal_entry_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

const ACCOUNT_COLUMNS: &str = "id, organization_id, code, name, account_type, subtype, parent_id, \
     is_parent, is_active, is_system_account, description, debit_balance, credit_balance, \
     current_balance, created_at, updated_at, deleted_at";

const ENTRY_COLUMNS: &str = "id, organization_id, entry_number, entry_date, entry_type, \
     reference_type, reference_id, reference_number, description, lines, total_debit, total_credit, \
     is_balanced, status, created_by, created_at, updated_at, posted_by, posted_at, voided_by, \
     voided_at, void_reason, reversed_by, reversal_of";

const LEDGER_ROW_COLUMNS: &str = "id, organization_id, account_id, journal_entry_id, entry_number, \
     transaction_date, description, debit, credit, running_balance, fiscal_year, fiscal_period, \
     is_reconciled, created_at, deleted_at";

/// Repository for the general ledger tables
///
/// Stateless: the connection is passed to each call so that all statements
/// of one operation share a transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerRepository;

impl LedgerRepository {
    /// Serializes writers of one organization until the transaction ends
    pub async fn lock_organization(
        conn: &mut PgConnection,
        organization_id: Uuid,
    ) -> Result<(), DatabaseError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(advisory_key(organization_id))
            .execute(conn)
            .await?;
        Ok(())
    }

    // Accounts

    pub async fn find_account(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<AccountRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM active_accounts WHERE organization_id = $1 AND id = $2",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(organization_id)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn find_account_by_code(
        conn: &mut PgConnection,
        organization_id: Uuid,
        code: &str,
    ) -> Result<Option<AccountRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM active_accounts WHERE organization_id = $1 AND code = $2",
            ACCOUNT_COLUMNS
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(organization_id)
            .bind(code)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn list_accounts(
        conn: &mut PgConnection,
        organization_id: Uuid,
    ) -> Result<Vec<AccountRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM active_accounts WHERE organization_id = $1 ORDER BY code",
            ACCOUNT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(organization_id)
            .fetch_all(conn)
            .await?;
        Ok(rows)
    }

    pub async fn insert_account(conn: &mut PgConnection, row: &AccountRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, organization_id, code, name, account_type, subtype, parent_id,
                is_parent, is_active, is_system_account, description,
                debit_balance, credit_balance, current_balance,
                created_at, updated_at, deleted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(row.id)
        .bind(row.organization_id)
        .bind(&row.code)
        .bind(&row.name)
        .bind(row.account_type)
        .bind(&row.subtype)
        .bind(row.parent_id)
        .bind(row.is_parent)
        .bind(row.is_active)
        .bind(row.is_system_account)
        .bind(&row.description)
        .bind(row.debit_balance)
        .bind(row.credit_balance)
        .bind(row.current_balance)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(row.deleted_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Overwrites an active account; returns the number of rows changed
    pub async fn update_account(conn: &mut PgConnection, row: &AccountRow) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                code = $3, name = $4, account_type = $5, subtype = $6, parent_id = $7,
                is_parent = $8, is_active = $9, is_system_account = $10, description = $11,
                debit_balance = $12, credit_balance = $13, current_balance = $14,
                updated_at = $15, deleted_at = $16
            WHERE organization_id = $1 AND id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(row.organization_id)
        .bind(row.id)
        .bind(&row.code)
        .bind(&row.name)
        .bind(row.account_type)
        .bind(&row.subtype)
        .bind(row.parent_id)
        .bind(row.is_parent)
        .bind(row.is_active)
        .bind(row.is_system_account)
        .bind(&row.description)
        .bind(row.debit_balance)
        .bind(row.credit_balance)
        .bind(row.current_balance)
        .bind(row.updated_at)
        .bind(row.deleted_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    // Journal entries

    pub async fn find_entry(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<JournalEntryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM journal_entries WHERE organization_id = $1 AND id = $2",
            ENTRY_COLUMNS
        );
        let row = sqlx::query_as::<_, JournalEntryRow>(&sql)
            .bind(organization_id)
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    /// Entries in creation order, optionally of one status
    pub async fn list_entries(
        conn: &mut PgConnection,
        organization_id: Uuid,
        status: Option<EntryStatus>,
    ) -> Result<Vec<JournalEntryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM journal_entries \
             WHERE organization_id = $1 AND ($2::entry_status IS NULL OR status = $2) \
             ORDER BY sequence",
            ENTRY_COLUMNS
        );
        let rows = sqlx::query_as::<_, JournalEntryRow>(&sql)
            .bind(organization_id)
            .bind(status)
            .fetch_all(conn)
            .await?;
        Ok(rows)
    }

    /// The non-voided entry referencing a document
    pub async fn find_entry_by_reference(
        conn: &mut PgConnection,
        organization_id: Uuid,
        reference_type: &str,
        reference_id: Uuid,
    ) -> Result<Option<JournalEntryRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM journal_entries \
             WHERE organization_id = $1 AND reference_type = $2 AND reference_id = $3 \
               AND status <> 'voided' \
             ORDER BY sequence DESC LIMIT 1",
            ENTRY_COLUMNS
        );
        let row = sqlx::query_as::<_, JournalEntryRow>(&sql)
            .bind(organization_id)
            .bind(reference_type)
            .bind(reference_id)
            .fetch_optional(conn)
            .await?;
        Ok(row)
    }

    pub async fn last_entry_number(
        conn: &mut PgConnection,
        organization_id: Uuid,
    ) -> Result<Option<String>, DatabaseError> {
        let number = sqlx::query_scalar::<_, String>(
            "SELECT entry_number FROM journal_entries WHERE organization_id = $1 ORDER BY sequence DESC LIMIT 1",
        )
        .bind(organization_id)
        .fetch_optional(conn)
        .await?;
        Ok(number)
    }

    pub async fn insert_entry(conn: &mut PgConnection, row: &JournalEntryRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO journal_entries (
                id, organization_id, entry_number, entry_date, entry_type,
                reference_type, reference_id, reference_number, description, lines,
                total_debit, total_credit, is_balanced, status, created_by,
                created_at, updated_at, posted_by, posted_at, voided_by,
                voided_at, void_reason, reversed_by, reversal_of
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
            )
            "#,
        )
        .bind(row.id)
        .bind(row.organization_id)
        .bind(&row.entry_number)
        .bind(row.entry_date)
        .bind(row.entry_type)
        .bind(&row.reference_type)
        .bind(row.reference_id)
        .bind(&row.reference_number)
        .bind(&row.description)
        .bind(&row.lines)
        .bind(row.total_debit)
        .bind(row.total_credit)
        .bind(row.is_balanced)
        .bind(row.status)
        .bind(&row.created_by)
        .bind(row.created_at)
        .bind(row.updated_at)
        .bind(&row.posted_by)
        .bind(row.posted_at)
        .bind(&row.voided_by)
        .bind(row.voided_at)
        .bind(&row.void_reason)
        .bind(row.reversed_by)
        .bind(row.reversal_of)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update_entry(conn: &mut PgConnection, row: &JournalEntryRow) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE journal_entries SET
                entry_date = $3, entry_type = $4, reference_type = $5, reference_id = $6,
                reference_number = $7, description = $8, lines = $9,
                total_debit = $10, total_credit = $11, is_balanced = $12, status = $13,
                updated_at = $14, posted_by = $15, posted_at = $16, voided_by = $17,
                voided_at = $18, void_reason = $19, reversed_by = $20, reversal_of = $21
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(row.organization_id)
        .bind(row.id)
        .bind(row.entry_date)
        .bind(row.entry_type)
        .bind(&row.reference_type)
        .bind(row.reference_id)
        .bind(&row.reference_number)
        .bind(&row.description)
        .bind(&row.lines)
        .bind(row.total_debit)
        .bind(row.total_credit)
        .bind(row.is_balanced)
        .bind(row.status)
        .bind(row.updated_at)
        .bind(&row.posted_by)
        .bind(row.posted_at)
        .bind(&row.voided_by)
        .bind(row.voided_at)
        .bind(&row.void_reason)
        .bind(row.reversed_by)
        .bind(row.reversal_of)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Removes a draft entry; posted and voided entries are never deleted
    pub async fn delete_draft_entry(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "DELETE FROM journal_entries WHERE organization_id = $1 AND id = $2 AND status = 'draft'",
        )
        .bind(organization_id)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    // Ledger rows

    pub async fn insert_ledger_row(conn: &mut PgConnection, row: &LedgerRowRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_rows (
                id, organization_id, account_id, journal_entry_id, entry_number,
                transaction_date, description, debit, credit, running_balance,
                fiscal_year, fiscal_period, is_reconciled, created_at, deleted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(row.id)
        .bind(row.organization_id)
        .bind(row.account_id)
        .bind(row.journal_entry_id)
        .bind(&row.entry_number)
        .bind(row.transaction_date)
        .bind(&row.description)
        .bind(row.debit)
        .bind(row.credit)
        .bind(row.running_balance)
        .bind(row.fiscal_year)
        .bind(row.fiscal_period)
        .bind(row.is_reconciled)
        .bind(row.created_at)
        .bind(row.deleted_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Active rows in posting order
    pub async fn list_ledger_rows(
        conn: &mut PgConnection,
        organization_id: Uuid,
        filter: &LedgerRowFilter,
    ) -> Result<Vec<LedgerRowRecord>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM active_ledger_rows \
             WHERE organization_id = $1 \
               AND ($2::uuid IS NULL OR account_id = $2) \
               AND ($3::uuid IS NULL OR journal_entry_id = $3) \
               AND ($4::date IS NULL OR transaction_date >= $4) \
               AND ($5::date IS NULL OR transaction_date <= $5) \
             ORDER BY sequence",
            LEDGER_ROW_COLUMNS
        );
        let rows = sqlx::query_as::<_, LedgerRowRecord>(&sql)
            .bind(organization_id)
            .bind(filter.account_id)
            .bind(filter.journal_entry_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(conn)
            .await?;
        Ok(rows)
    }

    pub async fn tombstone_ledger_rows(
        conn: &mut PgConnection,
        organization_id: Uuid,
        journal_entry_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_rows SET deleted_at = $3
            WHERE organization_id = $1 AND journal_entry_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(organization_id)
        .bind(journal_entry_id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    // Documents

    pub async fn find_document(
        conn: &mut PgConnection,
        organization_id: Uuid,
        kind: &str,
        id: Uuid,
    ) -> Result<Option<Value>, DatabaseError> {
        let body = sqlx::query_scalar::<_, Value>(
            "SELECT body FROM active_documents WHERE organization_id = $1 AND kind = $2 AND id = $3",
        )
        .bind(organization_id)
        .bind(kind)
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(body)
    }

    pub async fn upsert_document(
        conn: &mut PgConnection,
        organization_id: Uuid,
        kind: &str,
        id: Uuid,
        body: &Value,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO documents (organization_id, kind, id, body, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, NOW(), NULL)
            ON CONFLICT (organization_id, kind, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW(), deleted_at = NULL
            "#,
        )
        .bind(organization_id)
        .bind(kind)
        .bind(id)
        .bind(body)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn tombstone_document(
        conn: &mut PgConnection,
        organization_id: Uuid,
        kind: &str,
        id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE documents SET deleted_at = NOW()
            WHERE organization_id = $1 AND kind = $2 AND id = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(organization_id)
        .bind(kind)
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Folds an organization id into the 64-bit key space of advisory locks
pub fn advisory_key(organization_id: Uuid) -> i64 {
    let (high, low) = organization_id.as_u64_pair();
    (high ^ low) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_key_is_stable() {
        let id = Uuid::now_v7();
        assert_eq!(advisory_key(id), advisory_key(id));
    }

    #[test]
    fn test_advisory_keys_differ_per_organization() {
        let a = Uuid::from_u64_pair(1, 2);
        let b = Uuid::from_u64_pair(1, 3);
        assert_ne!(advisory_key(a), advisory_key(b));
    }
}
