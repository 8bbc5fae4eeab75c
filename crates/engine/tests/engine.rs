use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use engine::{
    AccountKind, BudgetStatus, Collection, Engine, EngineError, LocalIdentity, NewAccount,
    NewBudget, NewTransaction, Status, Store, categories::DEFAULT_CATEGORIES,
};

fn file_db_url() -> (String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();
    let path = root.join(format!("pocketbook_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());
    (url, path)
}

#[tokio::test]
async fn initialize_all_makes_every_container_ready() {
    let engine = Engine::builder().build();
    assert_eq!(
        engine.status(),
        Status {
            loading: false,
            ready: false
        }
    );

    let report = engine.initialize_all().await.unwrap();

    assert!(report.is_ok());
    assert_eq!(
        engine.status(),
        Status {
            loading: false,
            ready: true
        }
    );
    assert!(engine.store().is_ready());
    assert!(engine.transactions().is_empty());
    assert_eq!(engine.categories().len(), DEFAULT_CATEGORIES.len());
}

#[tokio::test]
async fn initialize_all_twice_does_not_reseed() {
    let engine = Engine::builder().build();
    engine.initialize_all().await.unwrap();
    engine.initialize_all().await.unwrap();
    assert_eq!(
        engine.categories().adapter().count().await.unwrap(),
        DEFAULT_CATEGORIES.len() as u64
    );
}

#[tokio::test]
async fn one_failing_collection_does_not_block_the_others() {
    let store = Arc::new(Store::memory());
    store
        .init()
        .await
        .unwrap()
        .execute_unprepared("DROP TABLE budgets")
        .await
        .unwrap();
    let engine = Engine::builder().store(Arc::clone(&store)).build();

    let report = engine.initialize_all().await.unwrap();

    assert_eq!(report.failed().collect::<Vec<_>>(), vec![Collection::Budgets]);
    assert!(matches!(report.failures[0].1, EngineError::Persistence(_)));
    assert!(!engine.status().ready);
    assert!(!engine.budgets().is_initialized());
    assert!(engine.transactions().is_initialized());
    assert_eq!(engine.categories().len(), DEFAULT_CATEGORIES.len());
}

#[tokio::test]
async fn unreachable_database_fails_initialization() {
    let engine = Engine::builder()
        .database_url("sqlite:/nonexistent-dir/pocketbook.db")
        .build();
    assert!(engine.initialize_all().await.is_err());
    assert!(!engine.status().ready);
}

#[tokio::test]
async fn restart_reads_same_state_without_reseeding() {
    let (url, path) = file_db_url();
    let account_id;
    {
        let engine = Engine::builder().database_url(&url).build();
        engine.initialize_all().await.unwrap();
        let account = engine
            .accounts()
            .add(NewAccount::new("Bank", AccountKind::Bank, 10_000))
            .await
            .unwrap();
        account_id = account.id;
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        engine
            .transactions()
            .add(NewTransaction::expense("rent", 3_000, "生活費", account.id, day))
            .await
            .unwrap();
        engine
            .transactions()
            .add(NewTransaction::income("refund", 2_000, "その他", account.id, day))
            .await
            .unwrap();
    }

    let engine = Engine::builder().database_url(&url).build();
    engine.initialize_all().await.unwrap();

    assert_eq!(engine.categories().len(), DEFAULT_CATEGORIES.len());
    assert_eq!(engine.transactions().len(), 2);
    assert_eq!(engine.balance_of(account_id).unwrap().current, 9_000);
    assert_eq!(engine.balance_of(Uuid::new_v4()), None);

    drop(engine);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn snapshot_feeds_balances_and_reports() {
    let engine = Engine::builder().build();
    engine.initialize_all().await.unwrap();
    let today = NaiveDate::from_ymd_opt(2025, 10, 15).unwrap();

    let card = engine
        .accounts()
        .add(NewAccount::new(
            "Card",
            AccountKind::CreditCard {
                credit_limit: 50_000,
                statement_day: Some(15),
                payment_day: Some(10),
            },
            0,
        ))
        .await
        .unwrap();
    engine
        .budgets()
        .add(NewBudget::monthly("food", 20_000, "食費"))
        .await
        .unwrap();
    engine
        .transactions()
        .add(NewTransaction::expense("groceries", 12_000, "食費", card.id, today))
        .await
        .unwrap();
    engine
        .transactions()
        .add(NewTransaction::expense("dinner", 6_000, "食費", card.id, today))
        .await
        .unwrap();

    let snapshot = engine.snapshot();
    let balances = snapshot.balances();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].current, -18_000);
    assert_eq!(balances[0].pending, 18_000);
    assert_eq!(balances[0].available, 32_000);
    assert_eq!(engine.balances(), balances);

    let usage = snapshot.reports(today).budget_analysis();
    assert_eq!(usage[0].spent, 18_000);
    assert_eq!(usage[0].remaining, 2_000);
    assert_eq!(usage[0].status, BudgetStatus::Warning);
}

#[tokio::test]
async fn guest_session_survives_a_restart() {
    let store = Arc::new(Store::memory());
    let engine = Engine::builder().store(Arc::clone(&store)).build();
    engine.initialize_all().await.unwrap();
    let auth = engine.auth(LocalIdentity);

    assert!(!auth.initialize_auth().await.unwrap().is_authenticated);
    assert!(matches!(
        auth.sign_in_with_oauth().await,
        Err(EngineError::Identity(_))
    ));

    let guest = auth.sign_in_as_guest().await.unwrap();
    assert!(guest.is_guest());

    let restarted = Engine::builder().store(store).build();
    restarted.initialize_all().await.unwrap();
    let restored = restarted.auth(LocalIdentity).initialize_auth().await.unwrap();
    assert_eq!(restored, guest);

    let signed_out = restarted.auth(LocalIdentity).sign_out().await.unwrap();
    assert!(!signed_out.is_authenticated);
    assert_eq!(restarted.sessions().load().await.unwrap(), None);
}
