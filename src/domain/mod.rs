//! Ledger domain: accounts, transaction records, read models and the store ports.

pub mod account;
pub mod ports;
pub mod snapshot;
pub mod transaction;
