//! Ledger subcommands
//!
//! Every subcommand except `migrate` runs through the [`LedgerService`] and
//! prints an [`ActionResponse`] envelope as JSON.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use domain_ledger::{ActionResponse, LedgerError, LedgerService};

use crate::cli::Command;
use crate::error::{ledger_exit_code, AdminError};

/// Rendered result of a subcommand
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// The `ActionResponse` envelope as JSON
    pub response: Value,
    pub exit_code: i32,
}

impl CommandOutput {
    fn render<T: Serialize>(result: Result<T, LedgerError>) -> Result<Self, AdminError> {
        let exit_code = match &result {
            Ok(_) => 0,
            Err(err) => ledger_exit_code(err),
        };
        let response = serde_json::to_value(ActionResponse::from(result))?;
        Ok(Self { response, exit_code })
    }
}

/// Runs a ledger subcommand
///
/// # Errors
///
/// Returns `InvalidArgument` for `migrate`, which needs the database pool
/// rather than the service.
pub async fn execute(service: &LedgerService, command: &Command) -> Result<CommandOutput, AdminError> {
    match command {
        Command::Migrate => Err(AdminError::InvalidArgument(
            "migrate does not run through the ledger service".to_string(),
        )),
        Command::InitChart(args) => {
            let result = service.initialize_chart(args.organization).await;
            if let Ok(accounts) = &result {
                info!(organization_id = %args.organization, accounts = accounts.len(), "Chart of accounts ready");
            }
            CommandOutput::render(result)
        }
        Command::HealthCheck(args) => {
            let result = service.health_check(args.organization).await;
            let unhealthy = matches!(&result, Ok(report) if !report.is_healthy);
            if let Ok(report) = &result {
                if unhealthy {
                    warn!(organization_id = %args.organization, issues = report.issues.len(), "Ledger is unhealthy");
                }
            }
            let mut output = CommandOutput::render(result)?;
            if unhealthy {
                output.exit_code = 1;
            }
            Ok(output)
        }
        Command::Recalculate(args) => CommandOutput::render(service.recalculate(args.organization).await),
        Command::TrialBalance(args) => CommandOutput::render(service.trial_balance(args.organization).await),
    }
}
