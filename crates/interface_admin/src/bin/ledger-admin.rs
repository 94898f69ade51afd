//! General ledger admin binary
//!
//! ```bash
//! ledger-admin migrate
//! ledger-admin health-check --organization ORG-0190...
//! LEDGER_ADMIN_LOG_FORMAT=json ledger-admin recalculate -o ORG-0190...
//! ```
//!
//! # Environment Variables
//!
//! * `DATABASE_URL` / `LEDGER_ADMIN_DATABASE_URL` - PostgreSQL connection string
//! * `LEDGER_ADMIN_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `LEDGER_ADMIN_LOG_FORMAT` - `plain` or `json` (default: plain)
//! * `LEDGER_ADMIN_MAX_CONNECTIONS` - Pool size (default: 5)
//! * `LEDGER_*` - Ledger settings, see `LedgerConfig`

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::HealthCheckable;
use domain_ledger::{LedgerConfig, LedgerService, LedgerStore};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLedgerStore};
use interface_admin::{execute, AdminConfig, AdminError, Cli, Command, CommandOutput, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(exit_byte(err.exit_code()));
        }
    };
    init_tracing(&config.log_level, config.log_format);

    let output = match run(&cli, config).await {
        Ok(output) => output,
        Err(err) => {
            tracing::error!(error = %err, "ledger-admin failed");
            CommandOutput {
                response: json!({ "success": false, "error": err.to_string() }),
                exit_code: err.exit_code(),
            }
        }
    };

    if let Err(err) = print(&output.response, cli.pretty) {
        eprintln!("{err}");
        return ExitCode::from(1);
    }
    ExitCode::from(exit_byte(output.exit_code))
}

async fn run(cli: &Cli, mut config: AdminConfig) -> Result<CommandOutput, AdminError> {
    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }

    let pool = create_pool(DatabaseConfig::new(&config.database_url).max_connections(config.max_connections)).await?;

    if cli.command == Command::Migrate {
        run_migrations(&pool).await?;
        return Ok(CommandOutput {
            response: json!({ "success": true, "data": "migrations applied" }),
            exit_code: 0,
        });
    }

    let ledger_config = LedgerConfig::from_env()?;
    ledger_config
        .validate()
        .map_err(|err| AdminError::Config(err.to_string()))?;

    let store = Arc::new(PostgresLedgerStore::new(pool));
    let service = LedgerService::new(store.clone() as Arc<dyn LedgerStore>, ledger_config);

    let mut output = execute(&service, &cli.command).await?;
    if let Command::HealthCheck(_) = cli.command {
        let adapter = store.health_check().await;
        if let Value::Object(map) = &mut output.response {
            map.insert("adapter".to_string(), serde_json::to_value(&adapter)?);
        }
        if adapter.status != core_kernel::AdapterHealth::Healthy {
            output.exit_code = 3;
        }
    }
    Ok(output)
}

fn print(response: &Value, pretty: bool) -> Result<(), serde_json::Error> {
    let text = if pretty {
        serde_json::to_string_pretty(response)?
    } else {
        serde_json::to_string(response)?
    };
    println!("{text}");
    Ok(())
}

fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

/// Installs the tracing subscriber, writing to stderr
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Plain => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}
