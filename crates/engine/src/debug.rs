//! Development helpers: dump, wipe and sample data.
//!
//! Only compiled with the `debug-tools` feature.

use chrono::{Datelike, Local, NaiveDate};
use serde_json::{Map, Value};

use crate::{
    AccountKind, Engine, NewAccount, NewBudget, NewTransaction, ResultEngine,
    auth::AuthEntry,
    store::{Collection, Record},
};

fn rows<R: Record + serde::Serialize>(records: &[R]) -> ResultEngine<Value> {
    serde_json::to_value(records)
        .map_err(|err| crate::EngineError::InvalidRecord(format!("{}: {err}", R::COLLECTION)))
}

/// Collection sizes keyed by collection name.
pub async fn counts(engine: &Engine) -> ResultEngine<Vec<(Collection, u64)>> {
    let store = engine.store();
    Ok(vec![
        (Collection::Transactions, store.count::<crate::Transaction>().await?),
        (Collection::Budgets, store.count::<crate::Budget>().await?),
        (Collection::Accounts, store.count::<crate::Account>().await?),
        (Collection::Categories, store.count::<crate::Category>().await?),
        (Collection::AccountTypes, store.count::<crate::AccountTypeConfig>().await?),
        (Collection::Auth, store.count::<AuthEntry>().await?),
    ])
}

/// Everything stored, read straight from the database, as one JSON document
/// keyed by collection name.
pub async fn dump_all(engine: &Engine) -> ResultEngine<Value> {
    let store = engine.store();
    let auth: Map<String, Value> = store
        .read_all::<AuthEntry>()
        .await?
        .into_iter()
        .map(|entry| (entry.key, entry.payload))
        .collect();

    let mut dump = Map::new();
    for (collection, value) in [
        (Collection::Transactions, rows(&store.read_all::<crate::Transaction>().await?)?),
        (Collection::Budgets, rows(&store.read_all::<crate::Budget>().await?)?),
        (Collection::Accounts, rows(&store.read_all::<crate::Account>().await?)?),
        (Collection::Categories, rows(&store.read_all::<crate::Category>().await?)?),
        (
            Collection::AccountTypes,
            rows(&store.read_all::<crate::AccountTypeConfig>().await?)?,
        ),
        (Collection::Auth, Value::Object(auth)),
    ] {
        dump.insert(collection.name().to_string(), value);
    }
    tracing::debug!("dumped all collections");
    Ok(Value::Object(dump))
}

/// Remove every record of every collection, then reload the mirrors.
///
/// Defaults are not seeded again until the next process start.
pub async fn clear_all(engine: &Engine) -> ResultEngine<()> {
    let store = engine.store();
    let (transactions, budgets, accounts, categories, account_types, auth) = tokio::join!(
        store.clear::<crate::Transaction>(),
        store.clear::<crate::Budget>(),
        store.clear::<crate::Account>(),
        store.clear::<crate::Category>(),
        store.clear::<crate::AccountTypeConfig>(),
        store.clear::<AuthEntry>(),
    );
    for removed in [transactions, budgets, accounts, categories, account_types, auth] {
        removed?;
    }

    engine.transactions().load().await?;
    engine.budgets().load().await?;
    engine.accounts().load().await?;
    engine.categories().load().await?;
    engine.account_types().load().await?;
    tracing::warn!("all collections cleared");
    Ok(())
}

/// Add a small, realistic data set dated in the current month.
pub async fn import_sample(engine: &Engine) -> ResultEngine<()> {
    let today = Local::now().date_naive();
    let day = |d: u32| NaiveDate::from_ymd_opt(today.year(), today.month(), d).unwrap_or(today);

    let wallet = engine
        .accounts()
        .add(NewAccount::new("財布", AccountKind::Cash, 20_000))
        .await?;
    let bank = engine
        .accounts()
        .add(NewAccount::new("メイン銀行", AccountKind::Bank, 300_000))
        .await?;
    let card = engine
        .accounts()
        .add(NewAccount::new(
            "クレジットカード",
            AccountKind::CreditCard {
                credit_limit: 500_000,
                statement_day: Some(15),
                payment_day: Some(10),
            },
            0,
        ))
        .await?;

    let food = engine
        .budgets()
        .add(NewBudget::monthly("食費予算", 40_000, "食費"))
        .await?;
    engine
        .budgets()
        .add(NewBudget::monthly("娯楽予算", 15_000, "娯楽費"))
        .await?;

    for input in [
        NewTransaction::income("給与", 250_000, "その他", bank.id, day(1)),
        NewTransaction::transfer("ATM引き出し", 30_000, bank.id, wallet.id, day(2)),
        NewTransaction::expense("スーパー", 4_200, "食費", wallet.id, day(3)).with_budget(food.id),
        NewTransaction::expense("定期券", 9_800, "交通費", card.id, day(4)),
        NewTransaction::expense("映画", 1_900, "娯楽費", card.id, day(5)),
        NewTransaction::expense("立替ランチ", 3_000, "食費", wallet.id, day(6))
            .advance()
            .with_tags(["立替"]),
    ] {
        engine.transactions().add(input).await?;
    }
    tracing::info!("sample data imported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_import_then_clear() {
        let engine = Engine::builder().build();
        engine.initialize_all().await.unwrap();
        import_sample(&engine).await.unwrap();

        assert_eq!(engine.accounts().len(), 3);
        assert_eq!(engine.transactions().len(), 6);
        let dump = dump_all(&engine).await.unwrap();
        assert_eq!(dump["transactions"].as_array().unwrap().len(), 6);
        assert_eq!(dump["categories"].as_array().unwrap().len(), 8);

        assert!(dump["auth"].as_object().unwrap().is_empty());

        clear_all(&engine).await.unwrap();
        assert!(engine.transactions().is_empty());
        assert!(engine.categories().is_empty());
        assert!(counts(&engine).await.unwrap().iter().all(|(_, n)| *n == 0));
    }

    #[tokio::test]
    async fn dump_includes_every_auth_entry() {
        let engine = Engine::builder().build();
        engine.initialize_all().await.unwrap();
        engine
            .sessions()
            .save(&crate::auth::Session::signed_out())
            .await
            .unwrap();
        engine
            .store()
            .update(&AuthEntry {
                key: "device".to_string(),
                payload: serde_json::json!({ "name": "laptop" }),
                updated_at: crate::util::now(),
            })
            .await
            .unwrap();

        let dump = dump_all(&engine).await.unwrap();
        let auth = dump["auth"].as_object().unwrap();
        assert_eq!(auth.len(), 2);
        assert!(auth.contains_key(crate::auth::SESSION_KEY));
        assert_eq!(auth["device"]["name"], "laptop");
    }
}
