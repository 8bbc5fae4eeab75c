//! In-memory mirrors of the durable collections.
//!
//! A [`Container`] holds the full contents of one collection in memory and is
//! the only way the rest of the application mutates it. Mutations are
//! write-through: the durable write happens first, and the mirror changes only
//! once it succeeded, so a failed write never leaves a phantom record behind.

use std::sync::{
    PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, adapters::Adapter, store::Record, util};

/// A [`Record`] that lives in a [`Container`].
pub trait Mirrored: Record {
    /// User supplied fields of a new record.
    type Input: Send;
    /// Partial update; `None` fields are left untouched.
    type Patch: Send;

    /// Human readable name used in errors and logs.
    const LABEL: &'static str;

    fn id(&self) -> Uuid;

    /// Build and validate a new record from its input.
    fn create(input: Self::Input, id: Uuid, now: DateTime<Utc>) -> ResultEngine<Self>;

    /// Merge `patch` into the record, refresh `updated_at` and validate.
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> ResultEngine<()>;

    /// Protected records cannot be deleted.
    fn is_protected(&self) -> bool {
        false
    }

    /// Records seeded when the collection is found empty on first init.
    fn defaults() -> Vec<Self::Input> {
        Vec::new()
    }
}

/// The state container of one collection.
#[derive(Debug)]
pub struct Container<R: Mirrored> {
    adapter: Adapter<R>,
    mirror: RwLock<Vec<R>>,
    loading: AtomicBool,
    initialized: OnceCell<()>,
}

impl<R: Mirrored> Container<R> {
    pub fn new(adapter: Adapter<R>) -> Self {
        Self {
            adapter,
            mirror: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            initialized: OnceCell::new(),
        }
    }

    pub fn adapter(&self) -> &Adapter<R> {
        &self.adapter
    }

    /// Open the store, load the collection and seed defaults if it is empty.
    ///
    /// Runs at most once: concurrent callers await the same in-flight
    /// initialization and later calls return immediately. If it fails the
    /// container stays uninitialized and a later call retries.
    pub async fn init(&self) -> ResultEngine<()> {
        self.initialized
            .get_or_try_init(|| async {
                self.adapter.store().init().await?;
                self.load().await?;
                if self.is_empty() {
                    self.seed_defaults().await?;
                }
                tracing::debug!(collection = %R::COLLECTION, records = self.len(), "container initialized");
                Ok::<_, EngineError>(())
            })
            .await
            .map(|_| ())
            .inspect_err(|err| {
                tracing::error!(collection = %R::COLLECTION, "failed to initialize: {err}")
            })
    }

    /// Replace the mirror with a full read of the collection.
    pub async fn load(&self) -> ResultEngine<()> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.adapter.all().await;
        self.loading.store(false, Ordering::SeqCst);

        let records = result.inspect_err(|err| {
            tracing::error!(collection = %R::COLLECTION, "failed to load: {err}")
        })?;
        tracing::debug!(collection = %R::COLLECTION, records = records.len(), "collection loaded");
        *self.write_mirror() = records;
        Ok(())
    }

    async fn seed_defaults(&self) -> ResultEngine<()> {
        let defaults = R::defaults();
        if defaults.is_empty() {
            return Ok(());
        }

        let now = util::now();
        let mut seeded = Vec::with_capacity(defaults.len());
        for input in defaults {
            let record = R::create(input, Uuid::new_v4(), now)?;
            self.adapter.add(&record).await?;
            seeded.push(record);
        }
        tracing::info!(collection = %R::COLLECTION, records = seeded.len(), "seeded default records");
        *self.write_mirror() = seeded;
        Ok(())
    }

    /// Validate and persist a new record, then append it to the mirror.
    pub async fn add(&self, input: R::Input) -> ResultEngine<R> {
        let record = R::create(input, Uuid::new_v4(), util::now())?;
        self.adapter.add(&record).await.inspect_err(|err| {
            tracing::warn!(collection = %R::COLLECTION, id = %record.id(), "failed to add {}: {err}", R::LABEL)
        })?;
        self.write_mirror().push(record.clone());
        Ok(record)
    }

    /// Merge `patch` into the record `id`, persist it and replace the mirror
    /// entry.
    pub async fn update(&self, id: Uuid, patch: R::Patch) -> ResultEngine<R> {
        let mut record = self
            .get_by_id(id)
            .ok_or_else(|| EngineError::NotFound(format!("{} {id}", R::LABEL)))?;
        record.apply(patch, util::now())?;
        self.adapter.update(&record).await.inspect_err(|err| {
            tracing::warn!(collection = %R::COLLECTION, %id, "failed to update {}: {err}", R::LABEL)
        })?;

        let mut mirror = self.write_mirror();
        match mirror.iter_mut().find(|current| current.id() == id) {
            Some(current) => *current = record.clone(),
            None => mirror.push(record.clone()),
        }
        Ok(record)
    }

    /// Delete the record `id` from the store, then from the mirror.
    pub async fn delete(&self, id: Uuid) -> ResultEngine<()> {
        let record = self
            .get_by_id(id)
            .ok_or_else(|| EngineError::NotFound(format!("{} {id}", R::LABEL)))?;
        if record.is_protected() {
            return Err(EngineError::ProtectedRecord(format!("{} {id}", R::LABEL)));
        }
        self.adapter.delete(&id.to_string()).await.inspect_err(|err| {
            tracing::warn!(collection = %R::COLLECTION, %id, "failed to delete {}: {err}", R::LABEL)
        })?;
        self.write_mirror().retain(|current| current.id() != id);
        Ok(())
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<R> {
        self.read_mirror()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    /// Copy of the whole mirror, in mirror order.
    pub fn snapshot(&self) -> Vec<R> {
        self.read_mirror().clone()
    }

    /// Records of the mirror matching `predicate`, in mirror order.
    pub fn filter(&self, predicate: impl Fn(&R) -> bool) -> Vec<R> {
        self.read_mirror()
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read_mirror().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_mirror().is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    // The mirror is only ever locked for the duration of a synchronous read
    // or swap, never across an await.
    fn read_mirror(&self) -> RwLockReadGuard<'_, Vec<R>> {
        self.mirror.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_mirror(&self) -> RwLockWriteGuard<'_, Vec<R>> {
        self.mirror.write().unwrap_or_else(PoisonError::into_inner)
    }
}
