//! Application layer: the ledger's write and read paths.
//!
//! [`transactor::LedgerTransactor`] runs the atomic balance update,
//! [`history::HistoryReader`] builds snapshots, and [`engine::LedgerEngine`]
//! bundles both over one store.

pub mod engine;
pub mod history;
pub mod transactor;
