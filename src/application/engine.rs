use crate::application::history::HistoryReader;
use crate::application::transactor::LedgerTransactor;
use crate::config::LedgerConfig;
use crate::domain::account::{AccountId, BalanceSummary};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::snapshot::ClientSnapshot;
use crate::domain::transaction::TransactionKind;
use crate::error::Result;

/// The entry point callers use for both writes and reads.
///
/// `LedgerEngine` is a thin pairing of [`LedgerTransactor`] and
/// [`HistoryReader`] over one shared store. It holds no balances of its own:
/// every answer comes from the store.
#[derive(Clone)]
pub struct LedgerEngine {
    transactor: LedgerTransactor,
    reader: HistoryReader,
}

impl LedgerEngine {
    /// Creates a new `LedgerEngine`.
    ///
    /// # Arguments
    ///
    /// * `store` - The store holding accounts and the transaction log.
    /// * `config` - Limits and deadlines applied to every operation.
    pub fn new(store: LedgerStoreRef, config: LedgerConfig) -> Self {
        Self {
            transactor: LedgerTransactor::new(store.clone(), config.clone()),
            reader: HistoryReader::new(store, config),
        }
    }

    pub async fn apply(
        &self,
        account_id: AccountId,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<BalanceSummary> {
        self.transactor
            .apply(account_id, amount, kind, description)
            .await
    }

    pub async fn fetch(&self, account_id: AccountId) -> Result<ClientSnapshot> {
        self.reader.fetch(account_id).await
    }
}
