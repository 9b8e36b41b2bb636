use crate::domain::account::{Account, AccountId, Balance};
use crate::domain::ports::{LedgerStore, LedgerTx, LedgerTxBox};
use crate::domain::snapshot::HistoryRow;
use crate::domain::transaction::{NewTransaction, TransactionRecord};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

struct AccountRow {
    account: Account,
    lock: Arc<Mutex<()>>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<AccountId, AccountRow>,
    log: Vec<TransactionRecord>,
    last_id: i64,
    last_occurred_at: Option<DateTime<Utc>>,
}

impl State {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_occurred_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_occurred_at = Some(ts);
        ts
    }
}

/// A thread-safe in-process ledger store.
///
/// Every account row carries its own async mutex, so transactions on the same
/// account queue up behind each other while other accounts proceed in parallel.
/// Writes are staged inside the transaction and published under a single write
/// lock on commit; readers therefore only ever see committed states.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given accounts.
    pub async fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write().await;
            for account in accounts {
                state.accounts.insert(
                    account.id,
                    AccountRow {
                        account,
                        lock: Arc::new(Mutex::new(())),
                    },
                );
            }
        }
        store
    }

    /// Number of records in the transaction log, across all accounts.
    pub async fn log_len(&self) -> usize {
        self.state.read().await.log.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<LedgerTxBox> {
        Ok(Box::new(InMemoryTx {
            state: Arc::clone(&self.state),
            locked: HashMap::new(),
            pending: Vec::new(),
        }))
    }

    async fn history(&self, id: AccountId, limit: usize) -> Result<Vec<HistoryRow>> {
        let state = self.state.read().await;
        let Some(row) = state.accounts.get(&id) else {
            return Ok(Vec::new());
        };

        // The log is in insertion order with non-decreasing timestamps, so a
        // reverse scan is already newest first.
        let rows: Vec<HistoryRow> = state
            .log
            .iter()
            .rev()
            .filter(|tx| tx.account_id == id)
            .take(limit)
            .map(|tx| HistoryRow {
                account: row.account.clone(),
                transaction: Some(tx.clone()),
            })
            .collect();

        if rows.is_empty() {
            return Ok(vec![HistoryRow {
                account: row.account.clone(),
                transaction: None,
            }]);
        }
        Ok(rows)
    }

    async fn provision(&self, account: Account) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.accounts.entry(account.id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(AccountRow {
                    account,
                    lock: Arc::new(Mutex::new(())),
                });
                Ok(true)
            }
        }
    }
}

struct LockedAccount {
    staged: Account,
    _guard: OwnedMutexGuard<()>,
}

/// Transaction handle of [`InMemoryLedgerStore`]. Holds the row guards of every
/// account it locked until it is committed or dropped.
pub struct InMemoryTx {
    state: Arc<RwLock<State>>,
    locked: HashMap<AccountId, LockedAccount>,
    pending: Vec<NewTransaction>,
}

#[async_trait]
impl LedgerTx for InMemoryTx {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        if let Some(locked) = self.locked.get(&id) {
            return Ok(Some(locked.staged.clone()));
        }

        let lock = {
            let state = self.state.read().await;
            match state.accounts.get(&id) {
                Some(row) => Arc::clone(&row.lock),
                None => return Ok(None),
            }
        };
        let guard = lock.lock_owned().await;

        // Re-read under the row lock: the previous holder may have committed.
        let account = {
            let state = self.state.read().await;
            match state.accounts.get(&id) {
                Some(row) => row.account.clone(),
                None => return Ok(None),
            }
        };
        self.locked.insert(
            id,
            LockedAccount {
                staged: account.clone(),
                _guard: guard,
            },
        );
        Ok(Some(account))
    }

    async fn apply_delta(&mut self, id: AccountId, delta: i64) -> Result<Balance> {
        let locked = self.locked.get_mut(&id).ok_or_else(|| {
            LedgerError::store(format!("account {} updated without holding its lock", id))
        })?;
        let next = locked
            .staged
            .balance
            .value()
            .checked_add(delta)
            .ok_or_else(|| LedgerError::InvalidInput("Balance overflow".to_string()))?;
        locked.staged.balance = Balance::new(next);
        Ok(locked.staged.balance)
    }

    async fn append(&mut self, tx: NewTransaction) -> Result<()> {
        self.pending.push(tx);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTx {
            state,
            locked,
            pending,
        } = *self;

        let mut state = state.write().await;
        for (id, locked) in &locked {
            if let Some(row) = state.accounts.get_mut(id) {
                row.account = locked.staged.clone();
            }
        }
        for tx in pending {
            state.last_id += 1;
            let id = state.last_id;
            let occurred_at = state.next_timestamp();
            state.log.push(TransactionRecord {
                id,
                account_id: tx.account_id,
                kind: tx.kind,
                amount: tx.amount,
                description: tx.description,
                occurred_at,
            });
        }
        drop(state);
        // Row guards are released only once the new state is published.
        drop(locked);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
