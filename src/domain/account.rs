use crate::domain::transaction::TransactionKind;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a client account. Accounts are provisioned out of band, the
/// ledger never allocates ids itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i32);

impl AccountId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Signed account balance in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(i64);

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// How far below zero a balance may go. Never negative, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct CreditLimit(i64);

impl CreditLimit {
    pub fn new(value: i64) -> Result<Self, LedgerError> {
        if value >= 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidInput(
                "Credit limit must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Lowest balance an account with this limit may hold.
    pub fn floor(&self) -> Balance {
        Balance(-self.0)
    }
}

impl TryFrom<i64> for CreditLimit {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CreditLimit> for i64 {
    fn from(limit: CreditLimit) -> Self {
        limit.0
    }
}

/// Strictly positive magnitude of a single transaction.
///
/// The sign of a movement is never stored alongside the amount; it is derived
/// from the [`TransactionKind`] whenever a delta is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, LedgerError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidInput(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// A client's ledger entry: credit limit and current balance.
///
/// Invariant: `balance >= -credit_limit` in every committed state.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Account {
    pub id: AccountId,
    pub credit_limit: CreditLimit,
    pub balance: Balance,
}

impl Account {
    pub fn new(id: AccountId, credit_limit: CreditLimit) -> Self {
        Self {
            id,
            credit_limit,
            balance: Balance::ZERO,
        }
    }

    /// Computes the balance that would result from applying a movement,
    /// rejecting debits that cross the credit floor.
    pub fn projected(&self, kind: TransactionKind, amount: Amount) -> Result<Balance, LedgerError> {
        let delta = kind.signed(amount);
        let next = self
            .balance
            .value()
            .checked_add(delta)
            .map(Balance)
            .ok_or_else(|| LedgerError::InvalidInput("Balance overflow".to_string()))?;

        if kind == TransactionKind::Debit && next < self.credit_limit.floor() {
            return Err(LedgerError::InsufficientLimit {
                account: self.id,
                balance: self.balance.value(),
                limit: self.credit_limit.value(),
                requested: amount.value(),
            });
        }
        Ok(next)
    }
}

/// Balance and limit of an account right after an accepted movement.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct BalanceSummary {
    pub balance: Balance,
    pub credit_limit: CreditLimit,
}
