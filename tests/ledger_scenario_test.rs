mod common;

use common::{account, engine_with};
use ledger_core::domain::account::{AccountId, Balance, CreditLimit};
use ledger_core::domain::transaction::TransactionKind;
use ledger_core::error::LedgerError;

#[tokio::test]
async fn test_loan_rejection_and_payment_scenario() {
    let (engine, store) = engine_with(vec![account(1, 1000, 0)]).await;
    let id = AccountId::new(1);

    let summary = engine
        .apply(id, 500, TransactionKind::Debit, "loan")
        .await
        .unwrap();
    assert_eq!(summary.balance, Balance::new(-500));
    assert_eq!(summary.credit_limit, CreditLimit::new(1000).unwrap());

    let rejected = engine.apply(id, 1600, TransactionKind::Debit, "x").await;
    assert!(matches!(
        rejected,
        Err(LedgerError::InsufficientLimit {
            balance: -500,
            limit: 1000,
            requested: 1600,
            ..
        })
    ));
    assert_eq!(store.log_len().await, 1);

    let summary = engine
        .apply(id, 2000, TransactionKind::Credit, "payment")
        .await
        .unwrap();
    assert_eq!(summary.balance, Balance::new(1500));

    let snapshot = engine.fetch(id).await.unwrap();
    assert_eq!(snapshot.account.balance, Balance::new(1500));
    assert_eq!(snapshot.account.credit_limit.value(), 1000);

    let history: Vec<(TransactionKind, i64, &str)> = snapshot
        .recent_transactions
        .iter()
        .map(|tx| (tx.kind, tx.amount.value(), tx.description.as_str()))
        .collect();
    assert_eq!(
        history,
        vec![
            (TransactionKind::Credit, 2000, "payment"),
            (TransactionKind::Debit, 500, "loan"),
        ]
    );
}

#[tokio::test]
async fn test_fetch_unknown_account() {
    let (engine, _) = engine_with(vec![account(1, 1000, 0)]).await;
    let result = engine.fetch(AccountId::new(6)).await;
    assert!(matches!(result, Err(LedgerError::AccountNotFound(id)) if id == AccountId::new(6)));
}

#[tokio::test]
async fn test_debit_exactly_to_limit_boundary() {
    let (engine, _) = engine_with(vec![account(1, 1000, 250), account(2, 1000, 250)]).await;

    // balance + limit = 1250
    let ok = engine
        .apply(AccountId::new(1), 1250, TransactionKind::Debit, "edge")
        .await
        .unwrap();
    assert_eq!(ok.balance, Balance::new(-1000));

    let over = engine
        .apply(AccountId::new(2), 1251, TransactionKind::Debit, "edge+1")
        .await;
    assert!(matches!(over, Err(LedgerError::InsufficientLimit { .. })));

    let snapshot = engine.fetch(AccountId::new(2)).await.unwrap();
    assert_eq!(snapshot.account.balance, Balance::new(250));
    assert!(snapshot.recent_transactions.is_empty());
}

#[tokio::test]
async fn test_rejected_debit_has_no_side_effect() {
    let (engine, store) = engine_with(vec![account(1, 0, 0)]).await;

    for _ in 0..3 {
        let result = engine
            .apply(AccountId::new(1), 1, TransactionKind::Debit, "nope")
            .await;
        assert!(matches!(result, Err(LedgerError::InsufficientLimit { .. })));
    }

    let snapshot = engine.fetch(AccountId::new(1)).await.unwrap();
    assert_eq!(snapshot.account.balance, Balance::ZERO);
    assert!(snapshot.recent_transactions.is_empty());
    assert_eq!(store.log_len().await, 0);
}

#[tokio::test]
async fn test_history_keeps_ten_newest() {
    let (engine, store) = engine_with(vec![account(1, 0, 0)]).await;

    for amount in 1..=15 {
        engine
            .apply(AccountId::new(1), amount, TransactionKind::Credit, "salary")
            .await
            .unwrap();
    }
    assert_eq!(store.log_len().await, 15);

    let snapshot = engine.fetch(AccountId::new(1)).await.unwrap();
    assert_eq!(snapshot.account.balance, Balance::new((1..=15).sum()));

    let amounts: Vec<i64> = snapshot
        .recent_transactions
        .iter()
        .map(|tx| tx.amount.value())
        .collect();
    assert_eq!(amounts, (6..=15).rev().collect::<Vec<i64>>());

    assert!(snapshot.recent_transactions.windows(2).all(|pair| {
        pair[0].occurred_at >= pair[1].occurred_at && pair[0].id > pair[1].id
    }));
}

#[tokio::test]
async fn test_history_only_lists_own_transactions() {
    let (engine, _) = engine_with(vec![account(1, 0, 0), account(2, 0, 0)]).await;

    engine
        .apply(AccountId::new(1), 10, TransactionKind::Credit, "mine")
        .await
        .unwrap();
    engine
        .apply(AccountId::new(2), 20, TransactionKind::Credit, "theirs")
        .await
        .unwrap();

    let snapshot = engine.fetch(AccountId::new(1)).await.unwrap();
    assert_eq!(snapshot.recent_transactions.len(), 1);
    assert_eq!(snapshot.recent_transactions[0].account_id, AccountId::new(1));
    assert_eq!(snapshot.recent_transactions[0].description.as_str(), "mine");
}

#[tokio::test]
async fn test_stored_amount_is_unsigned_and_sign_follows_kind() {
    let (engine, _) = engine_with(vec![account(1, 100, 0)]).await;
    engine
        .apply(AccountId::new(1), 40, TransactionKind::Debit, "fee")
        .await
        .unwrap();

    let snapshot = engine.fetch(AccountId::new(1)).await.unwrap();
    let tx = &snapshot.recent_transactions[0];
    assert_eq!(tx.amount.value(), 40);
    assert_eq!(tx.signed_amount(), -40);
}

#[tokio::test]
async fn test_unprovisioned_ids_are_unknown_accounts() {
    let (engine, store) = engine_with(vec![account(1, 1000, 0)]).await;

    for id in [0, -1, i32::MIN] {
        let id = AccountId::new(id);
        let write = engine.apply(id, 10, TransactionKind::Credit, "ghost").await;
        assert!(matches!(write, Err(LedgerError::AccountNotFound(found)) if found == id));

        let read = engine.fetch(id).await;
        assert!(matches!(read, Err(LedgerError::AccountNotFound(found)) if found == id));
    }
    assert_eq!(store.log_len().await, 0);
}
