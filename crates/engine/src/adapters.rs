//! Typed facades over the [`Store`], one per collection.
//!
//! Adapters hold no state beyond the shared store handle and do no
//! validation: they only name the queries each collection supports.

use std::{fmt, marker::PhantomData, sync::Arc};

use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    ResultEngine,
    account_types::{AccountTypeConfig, AccountTypeIndex},
    accounts::{Account, AccountIndex, AccountType},
    auth::AuthEntry,
    budgets::{Budget, BudgetIndex, BudgetPeriod},
    categories::{Category, CategoryIndex},
    store::{Record, Store},
    transactions::{Subkind, Transaction, TransactionIndex, TransactionKind},
    util,
};

pub struct Adapter<R> {
    store: Arc<Store>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Adapter<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R: Record> fmt::Debug for Adapter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("collection", &R::COLLECTION)
            .finish()
    }
}

impl<R: Record> Adapter<R> {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub async fn get(&self, key: &str) -> ResultEngine<Option<R>> {
        self.store.read(key).await
    }

    pub async fn all(&self) -> ResultEngine<Vec<R>> {
        self.store.read_all().await
    }

    pub async fn add(&self, record: &R) -> ResultEngine<()> {
        self.store.create(record).await
    }

    pub async fn update(&self, record: &R) -> ResultEngine<()> {
        self.store.update(record).await
    }

    pub async fn delete(&self, key: &str) -> ResultEngine<bool> {
        self.store.delete::<R>(key).await
    }

    pub async fn count(&self) -> ResultEngine<u64> {
        self.store.count::<R>().await
    }

    pub async fn clear(&self) -> ResultEngine<u64> {
        self.store.clear::<R>().await
    }
}

impl Adapter<Transaction> {
    pub async fn by_id(&self, id: Uuid) -> ResultEngine<Option<Transaction>> {
        self.get(&id.to_string()).await
    }

    pub async fn by_budget(&self, budget_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        self.store
            .query_by_index(TransactionIndex::BudgetId, budget_id.to_string())
            .await
    }

    /// Transactions dated within `start..=end`.
    pub async fn by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<Vec<Transaction>> {
        self.store
            .query_by_range(TransactionIndex::Date, start, end)
            .await
    }

    pub async fn by_category(&self, category: &str) -> ResultEngine<Vec<Transaction>> {
        self.store
            .query_by_index(TransactionIndex::Category, category)
            .await
    }

    pub async fn by_kind(&self, kind: TransactionKind) -> ResultEngine<Vec<Transaction>> {
        self.store
            .query_by_index(TransactionIndex::Kind, kind.as_str())
            .await
    }

    pub async fn by_subkind(&self, subkind: Subkind) -> ResultEngine<Vec<Transaction>> {
        self.store
            .query_by_index(TransactionIndex::Subkind, subkind.as_str())
            .await
    }

    /// Transactions whose source account is `account_id`.
    pub async fn by_account(&self, account_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        self.store
            .query_by_index(TransactionIndex::AccountId, account_id.to_string())
            .await
    }

    /// Transfers whose destination account is `account_id`.
    pub async fn by_destination(&self, account_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        self.store
            .query_by_index(TransactionIndex::ToAccountId, account_id.to_string())
            .await
    }
}

impl Adapter<Budget> {
    pub async fn by_category(&self, category: &str) -> ResultEngine<Vec<Budget>> {
        self.store
            .query_by_index(BudgetIndex::Category, category)
            .await
    }

    pub async fn by_period(&self, period: BudgetPeriod) -> ResultEngine<Vec<Budget>> {
        self.store
            .query_by_index(BudgetIndex::Period, period.as_str())
            .await
    }
}

impl Adapter<Account> {
    pub async fn by_type(&self, account_type: AccountType) -> ResultEngine<Vec<Account>> {
        self.store
            .query_by_index(AccountIndex::Type, account_type.as_str())
            .await
    }

    pub async fn active(&self) -> ResultEngine<Vec<Account>> {
        self.store.query_by_index(AccountIndex::IsActive, true).await
    }
}

impl Adapter<Category> {
    pub async fn active(&self) -> ResultEngine<Vec<Category>> {
        self.store.query_by_index(CategoryIndex::IsActive, true).await
    }

    pub async fn by_name(&self, name: &str) -> ResultEngine<Vec<Category>> {
        self.store.query_by_index(CategoryIndex::Name, name).await
    }
}

impl Adapter<AccountTypeConfig> {
    pub async fn active(&self) -> ResultEngine<Vec<AccountTypeConfig>> {
        self.store
            .query_by_index(AccountTypeIndex::IsActive, true)
            .await
    }

    pub async fn by_type(&self, account_type: AccountType) -> ResultEngine<Vec<AccountTypeConfig>> {
        self.store
            .query_by_index(AccountTypeIndex::Type, account_type.as_str())
            .await
    }
}

/// The auth collection is a plain key/value map of JSON payloads.
impl Adapter<AuthEntry> {
    pub async fn get_value(&self, key: &str) -> ResultEngine<Option<JsonValue>> {
        Ok(self.get(key).await?.map(|entry| entry.payload))
    }

    pub async fn put_value(&self, key: &str, payload: JsonValue) -> ResultEngine<()> {
        let entry = AuthEntry {
            key: key.to_string(),
            payload,
            updated_at: util::now(),
        };
        self.update(&entry).await
    }
}
