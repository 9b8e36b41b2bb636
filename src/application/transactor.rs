use crate::config::LedgerConfig;
use crate::domain::account::{AccountId, Amount, BalanceSummary};
use crate::domain::ports::{LedgerStoreRef, LedgerTxBox};
use crate::domain::transaction::{Description, NewTransaction, TransactionKind};
use crate::error::{LedgerError, Result};
use tracing::{debug, instrument, warn};

/// Applies credits and debits to accounts.
///
/// Each call runs as one store transaction: lock the account row, check the
/// credit floor, update the balance, append the log record, commit. Any
/// failure before the commit leaves no trace in the store.
#[derive(Clone)]
pub struct LedgerTransactor {
    store: LedgerStoreRef,
    config: LedgerConfig,
}

impl LedgerTransactor {
    pub fn new(store: LedgerStoreRef, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Applies one movement and returns the resulting balance and limit.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - non-positive amount or bad description.
    /// * `AccountNotFound` - no account with `account_id`.
    /// * `InsufficientLimit` - the debit would take the balance below `-credit_limit`.
    /// * `StoreUnavailable` / `Timeout` - the unit was rolled back and may be resubmitted.
    ///
    /// `operation_timeout` bounds everything up to the commit; the commit itself
    /// is bounded by the store.
    #[instrument(skip_all, fields(account = %account_id, kind = %kind, amount = amount))]
    pub async fn apply(
        &self,
        account_id: AccountId,
        amount: i64,
        kind: TransactionKind,
        description: &str,
    ) -> Result<BalanceSummary> {
        let tx = NewTransaction {
            account_id,
            kind,
            amount: Amount::new(amount)?,
            description: Description::with_max_chars(
                description,
                self.config.max_description_chars,
            )?,
        };

        // The deadline stops short of the commit: once COMMIT is sent its
        // outcome must be reported as is, never as a retryable timeout.
        let prepared = tokio::time::timeout(self.config.operation_timeout, self.prepare_unit(tx))
            .await
            .unwrap_or_else(|_| Err(LedgerError::Timeout));
        let result = match prepared {
            Ok((unit, summary)) => unit.commit().await.map(|()| summary),
            Err(err) => Err(err),
        };

        match &result {
            Ok(summary) => debug!(balance = summary.balance.value(), "movement applied"),
            Err(err) => warn!(error = %err, "movement rejected"),
        }
        result
    }

    /// Runs every step of the unit except the commit and hands back the open
    /// transaction together with the balance it will publish.
    async fn prepare_unit(&self, tx: NewTransaction) -> Result<(LedgerTxBox, BalanceSummary)> {
        let mut unit = self.store.begin().await?;

        let account = match unit.lock_account(tx.account_id).await? {
            Some(account) => account,
            None => return abort(unit, LedgerError::AccountNotFound(tx.account_id)).await,
        };
        let expected = match account.projected(tx.kind, tx.amount) {
            Ok(balance) => balance,
            Err(err) => return abort(unit, err).await,
        };

        let balance = unit
            .apply_delta(tx.account_id, tx.kind.signed(tx.amount))
            .await?;
        if balance != expected {
            return abort(
                unit,
                LedgerError::store(format!(
                    "balance of account {} moved under row lock",
                    tx.account_id
                )),
            )
            .await;
        }

        unit.append(tx).await?;

        Ok((
            unit,
            BalanceSummary {
                balance,
                credit_limit: account.credit_limit,
            },
        ))
    }
}

/// Rolls the unit back and surfaces `err`. A failing rollback is only logged;
/// the store discards the transaction either way.
async fn abort<T>(unit: LedgerTxBox, err: LedgerError) -> Result<T> {
    if let Err(rollback_err) = unit.rollback().await {
        warn!(error = %rollback_err, "rollback failed");
    }
    Err(err)
}
