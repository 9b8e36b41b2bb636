use crate::domain::account::{AccountId, Amount};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TransactionKind {
    #[serde(rename = "c", alias = "credit")]
    Credit,
    #[serde(rename = "d", alias = "debit")]
    Debit,
}

impl TransactionKind {
    /// Wire/storage code of the kind.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "c",
            TransactionKind::Debit => "d",
        }
    }

    pub fn signed(&self, amount: Amount) -> i64 {
        match self {
            TransactionKind::Credit => amount.value(),
            TransactionKind::Debit => -amount.value(),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" | "credit" => Ok(TransactionKind::Credit),
            "d" | "debit" => Ok(TransactionKind::Debit),
            other => Err(LedgerError::InvalidInput(format!(
                "Unknown transaction kind '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Short, non-empty free-text label of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub const DEFAULT_MAX_CHARS: usize = 10;

    pub fn new(value: impl Into<String>) -> Result<Self, LedgerError> {
        Self::with_max_chars(value, Self::DEFAULT_MAX_CHARS)
    }

    /// Validates against a custom bound, counted in characters rather than bytes.
    pub fn with_max_chars(value: impl Into<String>, max_chars: usize) -> Result<Self, LedgerError> {
        let value = value.into();
        if value.is_empty() {
            return Err(LedgerError::InvalidInput(
                "Description must not be empty".to_string(),
            ));
        }
        if value.chars().count() > max_chars {
            return Err(LedgerError::InvalidInput(format!(
                "Description exceeds {} characters",
                max_chars
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Description {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Description> for String {
    fn from(description: Description) -> Self {
        description.0
    }
}

/// A validated movement waiting to be appended inside a store transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: Description,
}

/// An immutable entry of the transaction log.
///
/// `id` and `occurred_at` are assigned by the store at insertion; `id` orders
/// records that share a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub description: Description,
    pub occurred_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn signed_amount(&self) -> i64 {
        self.kind.signed(self.amount)
    }
}
