//! Project revenue and expense translator

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use core_kernel::{AccountId, ProjectTransactionId};

use crate::chart::{resolve_account, DefaultAccount};
use crate::config::LedgerConfig;
use crate::documents::projects::{
    Project, ProjectTransaction, ProjectTransactionKind, ProjectTransactionStatus,
};
use crate::documents::{load_document, save_document};
use crate::error::LedgerError;
use crate::journal::LineItem;
use crate::lifecycle::check_transition;
use crate::ports::LedgerTransaction;
use crate::translators::{existing_posting, post_document, transfer_lines, PostingOutcome};

/// Lines for a project transaction settled in cash
///
/// Revenue: Debit Cash / Credit Project Revenue. Expense: Debit Project
/// Costs / Credit Cash.
pub fn project_lines(
    kind: ProjectTransactionKind,
    project_account: AccountId,
    cash: AccountId,
    amount: Decimal,
) -> Vec<LineItem> {
    match kind {
        ProjectTransactionKind::Revenue => transfer_lines(cash, project_account, amount),
        ProjectTransactionKind::Expense => transfer_lines(project_account, cash, amount),
    }
}

/// Records a project transaction and updates the project aggregates
pub async fn record_project_transaction(
    tx: &mut dyn LedgerTransaction,
    config: &LedgerConfig,
    id: ProjectTransactionId,
    actor: Option<&str>,
) -> Result<PostingOutcome<ProjectTransaction>, LedgerError> {
    let mut transaction: ProjectTransaction = load_document(tx, *id.as_uuid()).await?;
    if let Some(entry) = existing_posting(tx, &transaction).await? {
        return Ok(PostingOutcome { document: transaction, entry, already_posted: true });
    }
    check_transition(transaction.status, ProjectTransactionStatus::Recorded)?;
    if transaction.amount <= Decimal::ZERO {
        return Err(LedgerError::validation("project transaction amount must be greater than zero"));
    }

    let mut project: Project = load_document(tx, *transaction.project_id.as_uuid()).await?;
    let (explicit, role) = match transaction.kind {
        ProjectTransactionKind::Revenue => (
            transaction.project_account_id.or(project.revenue_account_id),
            DefaultAccount::ProjectRevenue,
        ),
        ProjectTransactionKind::Expense => (
            transaction.project_account_id.or(project.expense_account_id),
            DefaultAccount::ProjectExpense,
        ),
    };
    let project_account = resolve_account(tx, config, explicit, role).await?;
    let cash = resolve_account(tx, config, transaction.cash_account_id, DefaultAccount::Cash).await?;

    let description = transaction
        .description
        .clone()
        .unwrap_or_else(|| {
            let label = match transaction.kind {
                ProjectTransactionKind::Revenue => "revenue",
                ProjectTransactionKind::Expense => "expense",
            };
            format!("Project {} {}", project.project_code, label)
        });
    let entry = post_document(
        tx,
        config,
        &transaction,
        transaction.transaction_date,
        description,
        project_lines(transaction.kind, project_account, cash, transaction.amount),
        actor,
    )
    .await?;

    let now = Utc::now();
    match transaction.kind {
        ProjectTransactionKind::Revenue => {
            project.revenue += transaction.amount;
            project.revenue_account_id = Some(project_account);
        }
        ProjectTransactionKind::Expense => {
            project.actual_cost += transaction.amount;
            project.expense_account_id = Some(project_account);
        }
    }
    project.updated_at = now;
    save_document(tx, &project).await?;

    transaction.project_account_id = Some(project_account);
    transaction.cash_account_id = Some(cash);
    transaction.journal_entry_id = Some(entry.id);
    transaction.status = ProjectTransactionStatus::Recorded;
    transaction.updated_at = now;
    save_document(tx, &transaction).await?;

    info!(
        project = %project.project_code,
        kind = ?transaction.kind,
        amount = %transaction.amount,
        "Recorded project transaction"
    );
    Ok(PostingOutcome { document: transaction, entry, already_posted: false })
}
