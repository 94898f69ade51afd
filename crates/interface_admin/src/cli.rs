//! Command line definition

use clap::{Args, Parser, Subcommand};

use core_kernel::OrganizationId;

#[derive(Parser, Debug)]
#[command(name = "ledger-admin")]
#[command(about = "Operator utilities for the general ledger (migrations, chart setup, reconciliation)")]
#[command(version)]
pub struct Cli {
    /// Database connection string; overrides `LEDGER_ADMIN_DATABASE_URL`
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Applies pending schema migrations
    Migrate,
    /// Creates the standard chart of accounts where missing
    InitChart(OrganizationArgs),
    /// Runs the ledger health checks
    HealthCheck(OrganizationArgs),
    /// Rebuilds account balances from the ledger rows
    Recalculate(OrganizationArgs),
    /// Prints the trial balance
    TrialBalance(OrganizationArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct OrganizationArgs {
    /// Organization id, with or without the `ORG-` prefix
    #[arg(long, short = 'o')]
    pub organization: OrganizationId,
}

impl Command {
    /// Organization the command works on, if any
    pub fn organization(&self) -> Option<OrganizationId> {
        match self {
            Command::Migrate => None,
            Command::InitChart(args)
            | Command::HealthCheck(args)
            | Command::Recalculate(args)
            | Command::TrialBalance(args) => Some(args.organization),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_prefixed_organization() {
        let org = OrganizationId::new();
        let cli = Cli::try_parse_from(["ledger-admin", "trial-balance", "--organization", &org.to_string()]).unwrap();
        assert_eq!(cli.command, Command::TrialBalance(OrganizationArgs { organization: org }));
    }

    #[test]
    fn test_parses_bare_uuid() {
        let org = OrganizationId::new();
        let cli = Cli::try_parse_from(["ledger-admin", "recalculate", "-o", &org.as_uuid().to_string()]).unwrap();
        assert_eq!(cli.command.organization(), Some(org));
    }

    #[test]
    fn test_migrate_takes_no_organization() {
        let cli = Cli::try_parse_from(["ledger-admin", "migrate"]).unwrap();
        assert_eq!(cli.command, Command::Migrate);
        assert!(cli.command.organization().is_none());
    }

    #[test]
    fn test_rejects_malformed_organization() {
        assert!(Cli::try_parse_from(["ledger-admin", "health-check", "-o", "not-a-uuid"]).is_err());
    }
}
