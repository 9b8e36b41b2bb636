//! Postgres-backed ledger store.
//!
//! Isolation comes from the database: [`LedgerTx::lock_account`] issues
//! `SELECT ... FOR UPDATE`, which serializes concurrent writers on the same
//! account row while leaving other accounts untouched. The balance update and
//! the log insert run on the same connection inside one transaction.
//!
//! ## Error Mapping
//!
//! | SQLx Error | LedgerError |
//! |------------|-------------|
//! | PoolTimedOut | `Timeout` |
//! | Database (`57014`, statement timeout) | `Timeout` |
//! | Anything else | `StoreUnavailable` |

use crate::domain::account::{Account, AccountId, Amount, Balance, CreditLimit};
use crate::domain::ports::{LedgerStore, LedgerTx, LedgerTxBox};
use crate::domain::snapshot::HistoryRow;
use crate::domain::transaction::{Description, NewTransaction, TransactionKind, TransactionRecord};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use std::time::Duration;
use tracing::error;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id           INTEGER PRIMARY KEY,
    credit_limit BIGINT  NOT NULL CHECK (credit_limit >= 0),
    balance      BIGINT  NOT NULL DEFAULT 0,
    CONSTRAINT balance_within_limit CHECK (balance >= -credit_limit)
);

CREATE TABLE IF NOT EXISTS transactions (
    id          BIGSERIAL   PRIMARY KEY,
    account_id  INTEGER     NOT NULL REFERENCES accounts (id),
    amount      BIGINT      NOT NULL CHECK (amount > 0),
    kind        TEXT        NOT NULL CHECK (kind IN ('c', 'd')),
    description TEXT        NOT NULL CHECK (length(description) > 0),
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
);

CREATE INDEX IF NOT EXISTS transactions_account_recent
    ON transactions (account_id, occurred_at DESC, id DESC);
"#;

/// Ledger store on top of a shared SQLx connection pool.
///
/// `Clone` shares the pool.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
    statement_timeout: Option<Duration>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: None,
        }
    }

    /// Connects a pool of at most `max_connections` to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Applies a server-side statement timeout to every transaction opened by
    /// this store, so an abandoned unit cannot hold row locks indefinitely.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Creates the tables and index if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn begin(&self) -> Result<LedgerTxBox> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        if let Some(timeout) = self.statement_timeout {
            sqlx::query("SELECT set_config('statement_timeout', $1, true)")
                .bind(format!("{}ms", timeout.as_millis()))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("set_statement_timeout", e))?;
        }

        Ok(Box::new(PostgresTx { tx }))
    }

    async fn history(&self, id: AccountId, limit: usize) -> Result<Vec<HistoryRow>> {
        // One statement, one snapshot: the account fields and its history
        // come from the same point in time.
        let rows = sqlx::query(
            r#"
            SELECT
                a.id,
                a.credit_limit,
                a.balance,
                t.id AS tx_id,
                t.amount,
                t.kind,
                t.description,
                t.occurred_at
            FROM accounts a
            LEFT JOIN LATERAL (
                SELECT id, amount, kind, description, occurred_at
                FROM transactions
                WHERE account_id = a.id
                ORDER BY occurred_at DESC, id DESC
                LIMIT $2
            ) t ON TRUE
            WHERE a.id = $1
            ORDER BY t.occurred_at DESC NULLS LAST, t.id DESC
            "#,
        )
        .bind(id.value())
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("history", e))?;

        rows.iter().map(history_row).collect()
    }

    async fn provision(&self, account: Account) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, credit_limit, balance)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(account.id.value())
        .bind(account.credit_limit.value())
        .bind(account.balance.value())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("provision", e))?;

        Ok(result.rows_affected() == 1)
    }
}

/// Open database transaction. Dropping it without commit makes SQLx roll it
/// back when the connection returns to the pool.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PostgresTx {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT id, credit_limit, balance FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(id.value())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_account", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn apply_delta(&mut self, id: AccountId, delta: i64) -> Result<Balance> {
        let balance: i64 =
            sqlx::query_scalar("UPDATE accounts SET balance = balance + $1 WHERE id = $2 RETURNING balance")
                .bind(delta)
                .bind(id.value())
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| map_sqlx_error("apply_delta", e))?;
        Ok(Balance::new(balance))
    }

    async fn append(&mut self, tx: NewTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (account_id, amount, kind, description, occurred_at)
            VALUES ($1, $2, $3, $4, clock_timestamp())
            "#,
        )
        .bind(tx.account_id.value())
        .bind(tx.amount.value())
        .bind(tx.kind.code())
        .bind(tx.description.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("append_transaction", e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    let id: i32 = row.try_get("id").map_err(|e| map_sqlx_error("decode_account", e))?;
    let credit_limit: i64 = row
        .try_get("credit_limit")
        .map_err(|e| map_sqlx_error("decode_account", e))?;
    let balance: i64 = row
        .try_get("balance")
        .map_err(|e| map_sqlx_error("decode_account", e))?;

    Ok(Account {
        id: AccountId::new(id),
        credit_limit: CreditLimit::new(credit_limit).map_err(corrupt_row)?,
        balance: Balance::new(balance),
    })
}

fn history_row(row: &PgRow) -> Result<HistoryRow> {
    let account = account_from_row(row)?;

    let decode = |e| map_sqlx_error("decode_history", e);
    let tx_id: Option<i64> = row.try_get("tx_id").map_err(decode)?;
    let amount: Option<i64> = row.try_get("amount").map_err(decode)?;
    let kind: Option<String> = row.try_get("kind").map_err(decode)?;
    let description: Option<String> = row.try_get("description").map_err(decode)?;
    let occurred_at: Option<DateTime<Utc>> = row.try_get("occurred_at").map_err(decode)?;

    let transaction = match (tx_id, amount, kind, description, occurred_at) {
        (None, None, None, None, None) => None,
        (Some(tx_id), Some(amount), Some(kind), Some(description), Some(occurred_at)) => {
            Some(TransactionRecord {
                id: tx_id,
                account_id: account.id,
                kind: kind.parse::<TransactionKind>().map_err(corrupt_row)?,
                amount: Amount::new(amount).map_err(corrupt_row)?,
                description: Description::with_max_chars(description, usize::MAX)
                    .map_err(corrupt_row)?,
                occurred_at,
            })
        }
        _ => {
            return Err(LedgerError::store(format!(
                "partially null transaction columns for account {}",
                account.id
            )));
        }
    };

    Ok(HistoryRow {
        account,
        transaction,
    })
}

/// `LIMIT` argument for a history read; limits beyond `i64` mean "no limit".
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn corrupt_row(err: LedgerError) -> LedgerError {
    LedgerError::store(format!("corrupt row: {}", err))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> LedgerError {
    error!(operation, error = %err, "store operation failed");
    match err {
        sqlx::Error::PoolTimedOut => LedgerError::Timeout,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("57014") => {
            LedgerError::Timeout
        }
        other => LedgerError::store(other),
    }
}
