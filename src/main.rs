use clap::Parser;
use ledger_core::application::engine::LedgerEngine;
use ledger_core::config::LedgerConfig;
use ledger_core::domain::ports::LedgerStoreRef;
use ledger_core::infrastructure::in_memory::InMemoryLedgerStore;
use ledger_core::infrastructure::reference_accounts;
use ledger_core::interfaces::csv::operation_reader::OperationReader;
use ledger_core::interfaces::json::statement_writer::StatementWriter;
use ledger_core::telemetry;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file (account,kind,amount,description)
    input: PathBuf,

    /// Postgres connection string. If omitted, an in-memory store is used.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of pooled database connections
    #[arg(long, env = "LEDGER_MAX_CONNECTIONS", default_value_t = 10)]
    max_connections: u32,

    /// Deadline for each operation, in milliseconds
    #[arg(long, env = "LEDGER_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,

    /// Number of recent transactions included in each statement
    #[arg(long, default_value_t = 10)]
    history_limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let timeout = Duration::from_millis(cli.timeout_ms);
    let config = LedgerConfig::default()
        .with_history_limit(cli.history_limit)
        .with_operation_timeout(timeout);

    let store: LedgerStoreRef = match cli.database_url {
        Some(url) => connect_postgres(&url, cli.max_connections, timeout).await?,
        None => Arc::new(InMemoryLedgerStore::with_accounts(reference_accounts().into_diagnostic()?).await),
    };
    let engine = LedgerEngine::new(store, config);

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    let mut touched = BTreeSet::new();
    for row in reader.operations() {
        match row {
            Ok(op) => {
                touched.insert(op.account);
                if let Err(e) = engine
                    .apply(op.account, op.amount, op.kind, &op.description)
                    .await
                {
                    eprintln!("Error applying operation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    let mut snapshots = Vec::with_capacity(touched.len());
    for account in touched {
        match engine.fetch(account).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => eprintln!("Error fetching statement: {}", e),
        }
    }

    let stdout = io::stdout();
    let mut writer = StatementWriter::new(stdout.lock());
    writer.write_statements(&snapshots).into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-postgres")]
async fn connect_postgres(url: &str, max_connections: u32, timeout: Duration) -> Result<LedgerStoreRef> {
    use ledger_core::domain::ports::LedgerStore;
    use ledger_core::infrastructure::postgres::PostgresLedgerStore;

    let store = PostgresLedgerStore::connect(url, max_connections)
        .await
        .into_diagnostic()?
        .with_statement_timeout(timeout);
    store.migrate().await.into_diagnostic()?;
    for account in reference_accounts().into_diagnostic()? {
        store.provision(account).await.into_diagnostic()?;
    }
    Ok(Arc::new(store))
}

#[cfg(not(feature = "storage-postgres"))]
async fn connect_postgres(_url: &str, _max_connections: u32, _timeout: Duration) -> Result<LedgerStoreRef> {
    Err(miette::miette!(
        "--database-url requires the `storage-postgres` feature"
    ))
}
