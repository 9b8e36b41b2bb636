#![allow(dead_code)]

use ledger_core::application::engine::LedgerEngine;
use ledger_core::config::LedgerConfig;
use ledger_core::domain::account::{Account, AccountId, Balance, CreditLimit};
use ledger_core::infrastructure::in_memory::InMemoryLedgerStore;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;

pub fn account(id: i32, limit: i64, balance: i64) -> Account {
    Account {
        id: AccountId::new(id),
        credit_limit: CreditLimit::new(limit).unwrap(),
        balance: Balance::new(balance),
    }
}

/// Engine over a fresh in-memory store holding `accounts`. The store is
/// returned too so tests can inspect the raw log.
pub async fn engine_with(accounts: Vec<Account>) -> (LedgerEngine, InMemoryLedgerStore) {
    let store = InMemoryLedgerStore::with_accounts(accounts).await;
    let engine = LedgerEngine::new(Arc::new(store.clone()), LedgerConfig::default());
    (engine, store)
}

pub fn write_operations(path: &Path, rows: &[[&str; 4]]) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["account", "kind", "amount", "description"])?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
