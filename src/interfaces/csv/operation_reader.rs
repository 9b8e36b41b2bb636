use crate::domain::account::AccountId;
use crate::domain::transaction::TransactionKind;
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

/// One requested movement, as read from the input file.
///
/// Amount and description are kept raw here; the transactor validates them so
/// that a bad row surfaces as `InvalidInput` like any other caller error.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OperationRow {
    pub account: AccountId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub description: String,
}

/// Reads operations from a CSV source with an `account,kind,amount,description` header.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes rows; a malformed row yields an error without ending the stream.
    pub fn operations(self) -> impl Iterator<Item = Result<OperationRow>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
