use chrono::NaiveDate;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use engine::{
    AccountKind, AccountPatch, AccountType, CategoryPatch, Engine, EngineError, NewAccount,
    NewBudget, NewCategory, NewTransaction, TransactionPatch, categories::DEFAULT_CATEGORIES,
};

async fn ready_engine() -> Engine {
    let engine = Engine::builder().build();
    let report = engine.initialize_all().await.unwrap();
    assert!(report.is_ok());
    engine
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
}

#[tokio::test]
async fn add_then_get_by_id_round_trips() {
    let engine = ready_engine().await;
    let bank = engine
        .accounts()
        .add(NewAccount::new("Bank", AccountKind::Bank, 10_000))
        .await
        .unwrap();

    assert_eq!(engine.accounts().get_by_id(bank.id), Some(bank.clone()));
    assert_eq!(bank.created_at, bank.updated_at);

    let stored = engine
        .accounts()
        .adapter()
        .get(&bank.id.to_string())
        .await
        .unwrap();
    assert_eq!(stored, Some(bank));
}

#[tokio::test]
async fn update_merges_and_persists() {
    let engine = ready_engine().await;
    let account = Uuid::new_v4();
    let tx = engine
        .transactions()
        .add(NewTransaction::expense("lunch", 900, "食費", account, day(1)))
        .await
        .unwrap();

    let updated = engine
        .transactions()
        .update(
            tx.id,
            TransactionPatch {
                amount: Some(1_100),
                tags: Some(vec!["work".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.amount, 1_100);
    assert_eq!(updated.description, "lunch");
    assert_eq!(updated.created_at, tx.created_at);
    assert!(updated.updated_at >= tx.updated_at);
    assert_eq!(engine.transactions().get_by_id(tx.id), Some(updated.clone()));

    engine.transactions().load().await.unwrap();
    assert_eq!(engine.transactions().get_by_id(tx.id), Some(updated));
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let engine = ready_engine().await;
    engine
        .budgets()
        .add(NewBudget::monthly("food", 20_000, "食費"))
        .await
        .unwrap();
    let before = engine.budgets().snapshot();

    let missing = Uuid::new_v4();
    let err = engine
        .budgets()
        .update(missing, Default::default())
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::NotFound(format!("budget {missing}")));
    assert_eq!(engine.budgets().snapshot(), before);
}

#[tokio::test]
async fn delete_of_unknown_id_is_not_found() {
    let engine = ready_engine().await;
    let missing = Uuid::new_v4();
    let err = engine.accounts().delete(missing).await.unwrap_err();
    assert_eq!(err, EngineError::NotFound(format!("account {missing}")));
}

#[tokio::test]
async fn default_categories_are_seeded_and_protected() {
    let engine = ready_engine().await;
    let categories = engine.categories();
    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
    assert_eq!(engine.account_types().len(), AccountType::ALL.len());

    let food = categories.by_name("食費").unwrap();
    let err = categories.delete(food.id).await.unwrap_err();
    assert_eq!(err, EngineError::ProtectedRecord(format!("category {}", food.id)));
    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());

    let pets = categories.add(NewCategory::new("ペット")).await.unwrap();
    categories.delete(pets.id).await.unwrap();
    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
    assert_eq!(categories.get_by_id(pets.id), None);
}

#[tokio::test]
async fn deactivated_default_is_hidden_from_active_names() {
    let engine = ready_engine().await;
    let categories = engine.categories();
    let medical = categories.by_name("医療費").unwrap();

    categories
        .update(
            medical.id,
            CategoryPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let names = categories.active_names();
    assert_eq!(names.len(), DEFAULT_CATEGORIES.len() - 1);
    assert!(!names.contains(&"医療費".to_string()));
    assert_eq!(names[0], "食費");
}

#[tokio::test]
async fn validation_failure_changes_nothing() {
    let engine = ready_engine().await;
    let account = Uuid::new_v4();

    let err = engine
        .transactions()
        .add(NewTransaction::transfer("loop", 100, account, account, day(2)))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.transactions().is_empty());
    assert_eq!(engine.transactions().adapter().count().await.unwrap(), 0);
}

#[tokio::test]
async fn persistence_failure_leaves_mirror_unchanged() {
    let engine = ready_engine().await;
    let account = engine
        .accounts()
        .add(NewAccount::new("Cash", AccountKind::Cash, 0))
        .await
        .unwrap();

    engine
        .store()
        .connection()
        .unwrap()
        .execute_unprepared("DROP TABLE accounts")
        .await
        .unwrap();

    let err = engine
        .accounts()
        .add(NewAccount::new("Bank", AccountKind::Bank, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Persistence(_)));

    let err = engine
        .accounts()
        .update(
            account.id,
            AccountPatch {
                name: Some("Wallet".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Persistence(_)));

    assert_eq!(engine.accounts().snapshot(), vec![account]);
}

#[tokio::test]
async fn derived_lookups_follow_the_mirror() {
    let engine = ready_engine().await;
    let bank = engine
        .accounts()
        .add(NewAccount::new("Bank", AccountKind::Bank, 0))
        .await
        .unwrap();
    let wallet = engine
        .accounts()
        .add(NewAccount::new("Wallet", AccountKind::Cash, 0))
        .await
        .unwrap();
    let budget = engine
        .budgets()
        .add(NewBudget::monthly("food", 30_000, "食費"))
        .await
        .unwrap();

    let txs = engine.transactions();
    txs.add(NewTransaction::expense("a", 100, "食費", bank.id, day(1)).with_budget(budget.id))
        .await
        .unwrap();
    txs.add(NewTransaction::transfer("b", 200, bank.id, wallet.id, day(10)))
        .await
        .unwrap();
    let excluded = NewTransaction {
        included_in_budget: false,
        ..NewTransaction::expense("c", 300, "娯楽費", wallet.id, day(20))
    };
    txs.add(excluded).await.unwrap();

    assert_eq!(txs.by_budget(budget.id).len(), 1);
    assert_eq!(txs.by_account(wallet.id).len(), 2);
    assert_eq!(txs.by_category("食費").len(), 1);
    assert_eq!(txs.by_date_range(day(1), day(10)).len(), 2);
    assert_eq!(txs.included_in_budget().len(), 1);
    assert_eq!(engine.accounts().by_type(AccountType::Cash), vec![wallet]);

    let by_index = txs.adapter().by_destination(bank.id).await.unwrap();
    assert!(by_index.is_empty());
}

#[tokio::test]
async fn container_init_is_idempotent() {
    let engine = ready_engine().await;
    engine.categories().init().await.unwrap();
    engine.categories().init().await.unwrap();
    assert_eq!(engine.categories().len(), DEFAULT_CATEGORIES.len());
    assert_eq!(
        engine.categories().adapter().count().await.unwrap(),
        DEFAULT_CATEGORIES.len() as u64
    );
}

#[tokio::test]
async fn concurrent_init_seeds_once() {
    let engine = Engine::builder().build();
    let categories = engine.categories();

    let (first, second, all) = tokio::join!(
        categories.init(),
        categories.init(),
        engine.initialize_all()
    );
    first.unwrap();
    second.unwrap();
    assert!(all.unwrap().is_ok());

    assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
    assert_eq!(
        categories.adapter().count().await.unwrap(),
        DEFAULT_CATEGORIES.len() as u64
    );
}

#[tokio::test]
async fn full_width_category_names_match_across_collections() {
    let engine = ready_engine().await;
    let pc = engine.categories().add(NewCategory::new("ＰＣ")).await.unwrap();
    assert_eq!(pc.name, "PC");

    let budget = engine
        .budgets()
        .add(NewBudget::monthly("gadgets", 10_000, "ＰＣ"))
        .await
        .unwrap();
    assert_eq!(budget.category, pc.name);

    let tx = engine
        .transactions()
        .add(NewTransaction::expense("mouse", 500, "ＰＣ", Uuid::new_v4(), day(5)))
        .await
        .unwrap();
    assert_eq!(tx.category(), Some("PC"));
    assert_eq!(engine.transactions().by_category("ＰＣ").len(), 1);
    assert_eq!(engine.budgets().by_category("PC"), vec![budget]);

    let usage = engine.snapshot().reports(day(20)).budget_analysis();
    assert_eq!(usage[0].spent, 500);
}

