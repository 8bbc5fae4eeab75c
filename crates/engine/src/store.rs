//! The durable store.
//!
//! [`Store`] owns the single database connection of the process. It is opened
//! lazily by [`Store::init`], which also brings the schema up to date, and is
//! then shared (through an `Arc`) by every collection adapter.
//!
//! Every collection is named by [`Collection`]; the Rust type stored in it is
//! bound to that name at compile time by implementing [`Record`]. All
//! operations are scoped to a single collection: there is no atomicity across
//! collections.

use std::{fmt, time::Duration};

use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, Value,
};
use tokio::sync::OnceCell;

use crate::{EngineError, ResultEngine};

/// An in-memory database lives exactly as long as its one connection, so the
/// pool must never retire it.
const MEMORY_KEEPALIVE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Every named collection of the database.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Transactions,
    Budgets,
    Accounts,
    Categories,
    AccountTypes,
    Auth,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Self::Transactions,
        Self::Budgets,
        Self::Accounts,
        Self::Categories,
        Self::AccountTypes,
        Self::Auth,
    ];

    /// Table name in the database.
    pub fn name(self) -> &'static str {
        match self {
            Self::Transactions => "transactions",
            Self::Budgets => "budgets",
            Self::Accounts => "accounts",
            Self::Categories => "categories",
            Self::AccountTypes => "account_types",
            Self::Auth => "auth",
        }
    }

    /// Name of the key column.
    pub fn key_path(self) -> &'static str {
        match self {
            Self::Auth => "key",
            _ => "id",
        }
    }

    /// Secondary indexes defined on the collection.
    pub fn indexes(self) -> &'static [&'static str] {
        match self {
            Self::Transactions => &[
                "date",
                "category",
                "kind",
                "subkind",
                "account_id",
                "to_account_id",
                "budget_id",
                "created_at",
            ],
            Self::Budgets => &["category", "period", "created_at"],
            Self::Accounts => &["type", "is_active", "created_at"],
            Self::Categories => &["name", "is_active", "created_at"],
            Self::AccountTypes => &["type", "is_active", "created_at"],
            Self::Auth => &[],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A domain type persisted in one [`Collection`].
///
/// The implementation maps the domain value to the sea-orm model of its table
/// and back, and names the columns backing the key and each secondary index.
pub trait Record: Clone + Send + Sync + Sized + 'static {
    type Entity: EntityTrait<Model = Self::Model>;
    type Model: ModelTrait<Entity = Self::Entity>
        + FromQueryResult
        + IntoActiveModel<Self::ActiveModel>
        + Send
        + Sync
        + 'static;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + Clone
        + Send
        + Sync
        + 'static;
    /// Secondary indexes usable with [`Store::query_by_index`].
    type Index: Copy + fmt::Debug + Send + Sync;

    const COLLECTION: Collection;

    fn key_column() -> <Self::Entity as EntityTrait>::Column;

    fn index_column(index: Self::Index) -> <Self::Entity as EntityTrait>::Column;

    /// Primary key of this record, as stored.
    fn key(&self) -> String;

    fn to_active_model(&self) -> ResultEngine<Self::ActiveModel>;

    fn from_model(model: Self::Model) -> ResultEngine<Self>;
}

/// The on-device database.
#[derive(Debug)]
pub struct Store {
    url: String,
    connection: OnceCell<DatabaseConnection>,
}

impl Store {
    /// Create a store for `url` (e.g. `sqlite:./pocketbook.db?mode=rwc`).
    /// Nothing is opened until [`Store::init`] is called.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection: OnceCell::new(),
        }
    }

    /// A store backed by a private in-memory database. Its content is lost
    /// when the store is dropped.
    pub fn memory() -> Self {
        Self::new("sqlite::memory:")
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the database and apply the schema.
    ///
    /// Safe to call any number of times: concurrent first callers share the
    /// same in-flight open, later callers get the already open connection. A
    /// failed open leaves the store closed so it can be retried.
    pub async fn init(&self) -> ResultEngine<&DatabaseConnection> {
        self.connection
            .get_or_try_init(|| async {
                tracing::info!(url = %self.url, "opening store");
                let db = Database::connect(connect_options(&self.url)).await?;
                Migrator::up(&db, None).await?;
                tracing::debug!(url = %self.url, "store schema up to date");
                Ok::<_, EngineError>(db)
            })
            .await
    }

    pub fn is_memory(&self) -> bool {
        is_memory_url(&self.url)
    }

    /// `true` once [`Store::init`] has completed.
    pub fn is_ready(&self) -> bool {
        self.connection.initialized()
    }

    /// The open connection, or [`EngineError::StoreNotReady`].
    pub fn connection(&self) -> ResultEngine<&DatabaseConnection> {
        self.connection.get().ok_or(EngineError::StoreNotReady)
    }

    /// Insert a new record. Fails with [`EngineError::WriteConflict`] if the
    /// key already exists.
    pub async fn create<R: Record>(&self, record: &R) -> ResultEngine<()> {
        let db = self.connection()?;
        let key = record.key();
        R::Entity::insert(record.to_active_model()?)
            .exec_without_returning(db)
            .await
            .map_err(|err| EngineError::from_insert(err, &key))?;
        Ok(())
    }

    pub async fn read<R: Record>(&self, key: &str) -> ResultEngine<Option<R>> {
        let db = self.connection()?;
        R::Entity::find()
            .filter(R::key_column().eq(key))
            .one(db)
            .await?
            .map(R::from_model)
            .transpose()
    }

    pub async fn read_all<R: Record>(&self) -> ResultEngine<Vec<R>> {
        let db = self.connection()?;
        let models = R::Entity::find().all(db).await?;
        models.into_iter().map(R::from_model).collect()
    }

    /// Write a record, replacing the stored one with the same key or inserting
    /// it when absent.
    pub async fn update<R: Record>(&self, record: &R) -> ResultEngine<()> {
        let db = self.connection()?;
        let key = record.key();
        let active = record.to_active_model()?;
        let result = R::Entity::update_many()
            .set(active.clone())
            .filter(R::key_column().eq(key.as_str()))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            R::Entity::insert(active)
                .exec_without_returning(db)
                .await
                .map_err(|err| EngineError::from_insert(err, &key))?;
        }
        Ok(())
    }

    /// Delete by key. Returns `false` when nothing was stored under `key`.
    pub async fn delete<R: Record>(&self, key: &str) -> ResultEngine<bool> {
        let db = self.connection()?;
        let result = R::Entity::delete_many()
            .filter(R::key_column().eq(key))
            .exec(db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Records whose indexed column equals `value`, unsorted.
    pub async fn query_by_index<R: Record>(
        &self,
        index: R::Index,
        value: impl Into<Value>,
    ) -> ResultEngine<Vec<R>> {
        let db = self.connection()?;
        let models = R::Entity::find()
            .filter(R::index_column(index).eq(value))
            .all(db)
            .await?;
        models.into_iter().map(R::from_model).collect()
    }

    /// Records whose indexed column lies in `lower..=upper`, unsorted.
    pub async fn query_by_range<R: Record>(
        &self,
        index: R::Index,
        lower: impl Into<Value>,
        upper: impl Into<Value>,
    ) -> ResultEngine<Vec<R>> {
        let db = self.connection()?;
        let models = R::Entity::find()
            .filter(R::index_column(index).between(lower.into(), upper.into()))
            .all(db)
            .await?;
        models.into_iter().map(R::from_model).collect()
    }

    pub async fn count<R: Record>(&self) -> ResultEngine<u64> {
        let db = self.connection()?;
        Ok(R::Entity::find().count(db).await?)
    }

    /// Remove every record of the collection.
    pub async fn clear<R: Record>(&self) -> ResultEngine<u64> {
        let db = self.connection()?;
        let result = R::Entity::delete_many().exec(db).await?;
        tracing::debug!(collection = %R::COLLECTION, removed = result.rows_affected, "collection cleared");
        Ok(result.rows_affected)
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn connect_options(url: &str) -> ConnectOptions {
    let mut options = ConnectOptions::new(url);
    if is_memory_url(url) {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(MEMORY_KEEPALIVE)
            .max_lifetime(MEMORY_KEEPALIVE);
    }
    options
}
