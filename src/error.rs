use crate::domain::account::AccountId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),
    #[error(
        "Insufficient limit on account {account}: balance {balance}, limit {limit}, debit {requested}"
    )]
    InsufficientLimit {
        account: AccountId,
        balance: i64,
        limit: i64,
        requested: i64,
    },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Operation timed out")]
    Timeout,
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::StoreUnavailable(err.into())
    }

    /// Transient infrastructure failures. The failed unit never committed, so
    /// the caller may resubmit it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LedgerError::Timeout.is_retryable());
        assert!(LedgerError::store("connection reset").is_retryable());
        assert!(!LedgerError::AccountNotFound(AccountId::new(1)).is_retryable());
        assert!(!LedgerError::InvalidInput("amount".to_string()).is_retryable());
        assert!(
            !LedgerError::InsufficientLimit {
                account: AccountId::new(1),
                balance: 0,
                limit: 10,
                requested: 11,
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_messages() {
        let err = LedgerError::AccountNotFound(AccountId::new(7));
        assert_eq!(err.to_string(), "Account 7 not found");
    }
}
