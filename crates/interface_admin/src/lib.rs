//! # Ledger Admin
//!
//! Operator command line for the general ledger: schema migrations, chart
//! initialization, health checks, balance recalculation and trial balances.
//! Output is a JSON `ActionResponse` envelope on stdout; logs go to stderr.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command, OrganizationArgs};
pub use commands::{execute, CommandOutput};
pub use config::{AdminConfig, LogFormat};
pub use error::{ledger_exit_code, AdminError};
