use crate::config::LedgerConfig;
use crate::domain::account::AccountId;
use crate::domain::ports::LedgerStoreRef;
use crate::domain::snapshot::ClientSnapshot;
use crate::error::{LedgerError, Result};
use chrono::Utc;
use tracing::{debug, instrument};

/// Reads an account together with its most recent transactions.
#[derive(Clone)]
pub struct HistoryReader {
    store: LedgerStoreRef,
    config: LedgerConfig,
}

impl HistoryReader {
    pub fn new(store: LedgerStoreRef, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Returns the account's balance, limit and up to `history_limit`
    /// transactions, newest first. Fails with `AccountNotFound` rather than
    /// returning a partial snapshot.
    #[instrument(skip_all, fields(account = %account_id))]
    pub async fn fetch(&self, account_id: AccountId) -> Result<ClientSnapshot> {
        let rows = tokio::time::timeout(
            self.config.operation_timeout,
            self.store.history(account_id, self.config.history_limit),
        )
        .await
        .map_err(|_| LedgerError::Timeout)??;

        let snapshot = ClientSnapshot::from_rows(rows, Utc::now())
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        debug!(
            transactions = snapshot.recent_transactions.len(),
            "snapshot taken"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Account, Balance, CreditLimit};
    use crate::infrastructure::in_memory::InMemoryLedgerStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fetch_unknown_account() {
        let reader = HistoryReader::new(Arc::new(InMemoryLedgerStore::new()), LedgerConfig::default());
        let result = reader.fetch(AccountId::new(6)).await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_account_without_history() {
        let store = InMemoryLedgerStore::with_accounts([Account::new(
            AccountId::new(2),
            CreditLimit::new(80_000).unwrap(),
        )])
        .await;
        let reader = HistoryReader::new(Arc::new(store), LedgerConfig::default());

        let snapshot = reader.fetch(AccountId::new(2)).await.unwrap();
        assert_eq!(snapshot.account.balance, Balance::ZERO);
        assert_eq!(snapshot.account.credit_limit.value(), 80_000);
        assert!(snapshot.recent_transactions.is_empty());
    }
}
