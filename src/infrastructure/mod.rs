//! Store adapters implementing [`crate::domain::ports::LedgerStore`].

use crate::domain::account::{Account, AccountId, CreditLimit};
use crate::error::Result;

pub mod in_memory;
#[cfg(feature = "storage-postgres")]
pub mod postgres;

/// Credit limits of the five accounts a fresh ledger is provisioned with.
const REFERENCE_LIMITS: [(i32, i64); 5] = [
    (1, 100_000),
    (2, 80_000),
    (3, 1_000_000),
    (4, 10_000_000),
    (5, 500_000),
];

/// Reference accounts with zero balance, used to seed new stores.
pub fn reference_accounts() -> Result<Vec<Account>> {
    REFERENCE_LIMITS
        .iter()
        .map(|&(id, limit)| Ok(Account::new(AccountId::new(id), CreditLimit::new(limit)?)))
        .collect()
}
