use crate::domain::snapshot::ClientSnapshot;
use crate::domain::transaction::TransactionKind;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct Statement<'a> {
    balance: StatementBalance,
    recent_transactions: Vec<StatementEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct StatementBalance {
    total: i64,
    limit: i64,
    statement_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct StatementEntry<'a> {
    amount: i64,
    kind: TransactionKind,
    description: &'a str,
    occurred_at: DateTime<Utc>,
}

impl<'a> From<&'a ClientSnapshot> for Statement<'a> {
    fn from(snapshot: &'a ClientSnapshot) -> Self {
        Self {
            balance: StatementBalance {
                total: snapshot.account.balance.value(),
                limit: snapshot.account.credit_limit.value(),
                statement_at: snapshot.taken_at,
            },
            recent_transactions: snapshot
                .recent_transactions
                .iter()
                .map(|tx| StatementEntry {
                    amount: tx.amount.value(),
                    kind: tx.kind,
                    description: tx.description.as_str(),
                    occurred_at: tx.occurred_at,
                })
                .collect(),
        }
    }
}

/// Writes snapshots as JSON statements, one per line.
pub struct StatementWriter<W: Write> {
    writer: W,
}

impl<W: Write> StatementWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_statement(&mut self, snapshot: &ClientSnapshot) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &Statement::from(snapshot))?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_statements<'a>(
        &mut self,
        snapshots: impl IntoIterator<Item = &'a ClientSnapshot>,
    ) -> Result<()> {
        for snapshot in snapshots {
            self.write_statement(snapshot)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
