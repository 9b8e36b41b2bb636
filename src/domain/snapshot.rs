use crate::domain::account::Account;
use crate::domain::transaction::TransactionRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;

/// One row of the account/transactions outer join.
///
/// An account without history still yields a single row; its joined side is
/// `None` rather than a zero-valued record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub account: Account,
    pub transaction: Option<TransactionRecord>,
}

/// Point-in-time view of an account and its most recent transactions,
/// newest first. Built fresh for every read, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSnapshot {
    pub account: Account,
    pub recent_transactions: Vec<TransactionRecord>,
    pub taken_at: DateTime<Utc>,
}

impl ClientSnapshot {
    /// Folds join rows into a snapshot. Returns `None` when there are no rows,
    /// i.e. the account does not exist.
    pub fn from_rows(rows: Vec<HistoryRow>, taken_at: DateTime<Utc>) -> Option<Self> {
        let mut rows = rows.into_iter();
        let first = rows.next()?;

        let account = first.account;
        let mut recent_transactions: Vec<TransactionRecord> = first
            .transaction
            .into_iter()
            .chain(rows.filter_map(|row| row.transaction))
            .collect();
        recent_transactions.sort_by_key(|tx| Reverse((tx.occurred_at, tx.id)));

        Some(Self {
            account,
            recent_transactions,
            taken_at,
        })
    }
}
