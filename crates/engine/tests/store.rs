use std::sync::Arc;

use chrono::{NaiveDate, SubsecRound, Utc};
use engine::{
    Budget, EngineError, Mirrored, NewBudget, NewTransaction, Store, Transaction,
    transactions::TransactionIndex,
};
use uuid::Uuid;

async fn open_store() -> Store {
    let store = Store::memory();
    store.init().await.unwrap();
    store
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
}

fn expense(amount: i64, category: &str, account: Uuid, on: NaiveDate) -> Transaction {
    Transaction::create(
        NewTransaction::expense("test", amount, category, account, on),
        Uuid::new_v4(),
        Utc::now().trunc_subsecs(3),
    )
    .unwrap()
}

#[tokio::test]
async fn operations_before_init_fail_with_store_not_ready() {
    let store = Store::memory();
    assert!(!store.is_ready());

    let err = store.read_all::<Transaction>().await.unwrap_err();
    assert_eq!(err, EngineError::StoreNotReady);

    let tx = expense(100, "食費", Uuid::new_v4(), day(1));
    assert_eq!(store.create(&tx).await.unwrap_err(), EngineError::StoreNotReady);
}

#[tokio::test]
async fn concurrent_init_opens_once() {
    let store = Arc::new(Store::memory());
    let (a, b) = tokio::join!(store.init(), store.init());
    a.unwrap();
    b.unwrap();
    assert!(store.is_ready());

    // A second init must not reopen the in-memory database and lose data.
    let tx = expense(100, "食費", Uuid::new_v4(), day(1));
    store.create(&tx).await.unwrap();
    store.init().await.unwrap();
    assert_eq!(store.count::<Transaction>().await.unwrap(), 1);
}

#[tokio::test]
async fn create_read_round_trip() {
    let store = open_store().await;
    let tx = expense(1_234, "交通費", Uuid::new_v4(), day(3));

    store.create(&tx).await.unwrap();

    let stored = store.read::<Transaction>(&tx.id.to_string()).await.unwrap();
    assert_eq!(stored, Some(tx));
    assert_eq!(
        store.read::<Transaction>(&Uuid::new_v4().to_string()).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn duplicate_key_is_a_write_conflict() {
    let store = open_store().await;
    let tx = expense(500, "食費", Uuid::new_v4(), day(2));

    store.create(&tx).await.unwrap();
    let err = store.create(&tx).await.unwrap_err();

    assert_eq!(err, EngineError::WriteConflict(tx.id.to_string()));
    assert_eq!(store.count::<Transaction>().await.unwrap(), 1);
}

#[tokio::test]
async fn update_replaces_or_inserts() {
    let store = open_store().await;
    let mut budget = Budget::create(
        NewBudget::monthly("food", 20_000, "食費"),
        Uuid::new_v4(),
        Utc::now().trunc_subsecs(3),
    )
    .unwrap();

    // Absent key: put semantics insert it.
    store.update(&budget).await.unwrap();
    assert_eq!(store.count::<Budget>().await.unwrap(), 1);

    budget.amount = 25_000;
    store.update(&budget).await.unwrap();
    let stored = store
        .read::<Budget>(&budget.id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.amount, 25_000);
    assert_eq!(store.count::<Budget>().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_reports_whether_something_was_removed() {
    let store = open_store().await;
    let tx = expense(100, "食費", Uuid::new_v4(), day(1));
    store.create(&tx).await.unwrap();

    assert!(store.delete::<Transaction>(&tx.id.to_string()).await.unwrap());
    assert!(!store.delete::<Transaction>(&tx.id.to_string()).await.unwrap());
    assert_eq!(store.count::<Transaction>().await.unwrap(), 0);
}

#[tokio::test]
async fn range_query_is_inclusive() {
    let store = open_store().await;
    let account = Uuid::new_v4();
    for d in [1, 5, 10, 15, 20] {
        store
            .create(&expense(100, "食費", account, day(d)))
            .await
            .unwrap();
    }

    let mut days: Vec<u32> = store
        .query_by_range::<Transaction>(TransactionIndex::Date, day(5), day(15))
        .await
        .unwrap()
        .into_iter()
        .map(|tx| chrono::Datelike::day(&tx.date))
        .collect();
    days.sort_unstable();

    assert_eq!(days, vec![5, 10, 15]);
}

#[tokio::test]
async fn index_query_matches_exact_value() {
    let store = open_store().await;
    let account = Uuid::new_v4();
    store.create(&expense(100, "食費", account, day(1))).await.unwrap();
    store.create(&expense(200, "食費", account, day(2))).await.unwrap();
    store.create(&expense(300, "交通費", account, day(3))).await.unwrap();

    let food = store
        .query_by_index::<Transaction>(TransactionIndex::Category, "食費")
        .await
        .unwrap();
    assert_eq!(food.len(), 2);
    assert!(food.iter().all(|tx| tx.category() == Some("食費")));

    let none = store
        .query_by_index::<Transaction>(TransactionIndex::Category, "医療費")
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn clear_empties_one_collection_only() {
    let store = open_store().await;
    store
        .create(&expense(100, "食費", Uuid::new_v4(), day(1)))
        .await
        .unwrap();
    let budget = Budget::create(
        NewBudget::monthly("food", 1_000, "食費"),
        Uuid::new_v4(),
        Utc::now().trunc_subsecs(3),
    )
    .unwrap();
    store.create(&budget).await.unwrap();

    assert_eq!(store.clear::<Transaction>().await.unwrap(), 1);
    assert_eq!(store.count::<Transaction>().await.unwrap(), 0);
    assert_eq!(store.count::<Budget>().await.unwrap(), 1);
}

#[test]
fn collections_describe_the_schema() {
    use engine::Collection;

    assert_eq!(Collection::ALL.len(), 6);
    assert_eq!(Collection::AccountTypes.name(), "account_types");
    assert_eq!(Collection::Auth.key_path(), "key");
    assert_eq!(Collection::Budgets.key_path(), "id");
    assert!(Collection::Auth.indexes().is_empty());
    for index in ["date", "category", "kind", "subkind", "account_id", "budget_id", "created_at"] {
        assert!(Collection::Transactions.indexes().contains(&index));
    }
}
