use crate::domain::transaction::Description;
use std::time::Duration;

/// Tunables shared by the transactor and the history reader.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Maximum number of transactions returned in a snapshot.
    pub history_limit: usize,
    /// Maximum description length, in characters.
    pub max_description_chars: usize,
    /// Deadline for one `apply` or `fetch`, store waits included.
    pub operation_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            max_description_chars: Description::DEFAULT_MAX_CHARS,
            operation_timeout: Duration::from_secs(5),
        }
    }
}

impl LedgerConfig {
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_max_description_chars(mut self, max: usize) -> Self {
        self.max_description_chars = max;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}
