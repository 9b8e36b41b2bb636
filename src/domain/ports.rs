use super::account::{Account, AccountId, Balance};
use super::snapshot::HistoryRow;
use super::transaction::NewTransaction;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A single isolation boundary against the store.
///
/// Everything done through one `LedgerTx` becomes visible atomically on
/// [`LedgerTx::commit`]. Dropping it without committing discards all of it.
#[async_trait]
pub trait LedgerTx: Send {
    /// Reads an account and holds its row lock until the transaction ends, so
    /// no other transaction can act on a stale balance.
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>>;

    /// Adds a signed delta to a previously locked account, returning the new balance.
    async fn apply_delta(&mut self, id: AccountId, delta: i64) -> Result<Balance>;

    /// Appends one log record; id and timestamp are assigned by the store.
    async fn append(&mut self, tx: NewTransaction) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<LedgerTxBox>;

    /// Account fields joined with up to `limit` of its newest transactions, in
    /// one consistent read. No rows means no such account.
    async fn history(&self, id: AccountId, limit: usize) -> Result<Vec<HistoryRow>>;

    /// Creates an account unless one with the same id exists. Returns whether
    /// a row was inserted.
    async fn provision(&self, account: Account) -> Result<bool>;
}

pub type LedgerTxBox = Box<dyn LedgerTx>;
pub type LedgerStoreRef = Arc<dyn LedgerStore>;
