use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

pub use account_types::{AccountTypeConfig, AccountTypeConfigPatch, NewAccountTypeConfig};
pub use accounts::{Account, AccountKind, AccountPatch, AccountType, NewAccount};
pub use adapters::Adapter;
pub use auth::{AuthService, IdentityProvider, LocalIdentity, Session, SessionStore, User};
pub use balances::{AccountBalance, compute_all_balances, compute_balance, net_worth};
pub use budgets::{Budget, BudgetPatch, BudgetPeriod, NewBudget};
pub use categories::{Category, CategoryPatch, NewCategory};
pub use container::{Container, Mirrored};
pub use error::EngineError;
pub use reports::{
    AdvanceReport, BudgetStatus, BudgetUsage, CategorySlice, DailyPoint, MonthAmount, MonthKey,
    MonthlyPoint, ReportAnalyzer, StatsSummary,
};
pub use store::{Collection, Record, Store};
pub use transactions::{
    Movement, NewTransaction, Subkind, Transaction, TransactionKind, TransactionPatch,
};

pub mod account_types;
pub mod accounts;
mod adapters;
pub mod auth;
mod balances;
pub mod budgets;
pub mod categories;
mod container;
#[cfg(any(test, feature = "debug-tools"))]
pub mod debug;
mod error;
pub mod reports;
mod store;
pub mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

/// Outcome of [`Engine::initialize_all`]: the collections that failed to
/// initialize. The others are usable.
#[derive(Debug, Default)]
pub struct InitReport {
    pub failures: Vec<(Collection, EngineError)>,
}

impl InitReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self) -> impl Iterator<Item = Collection> + '_ {
        self.failures.iter().map(|(collection, _)| *collection)
    }
}

/// Aggregate state of every container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    /// At least one container is loading.
    pub loading: bool,
    /// Every container is initialized.
    pub ready: bool,
}

/// Owned copy of every mirror, for the pure engines.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub account_types: Vec<AccountTypeConfig>,
}

impl Snapshot {
    pub fn balances(&self) -> Vec<AccountBalance> {
        compute_all_balances(&self.accounts, &self.transactions)
    }

    pub fn reports(&self, today: NaiveDate) -> ReportAnalyzer<'_> {
        ReportAnalyzer::new(&self.transactions, &self.budgets, today)
    }
}

/// Entry point of the core: the store and one container per collection.
#[derive(Debug)]
pub struct Engine {
    store: Arc<Store>,
    transactions: Container<Transaction>,
    budgets: Container<Budget>,
    accounts: Container<Account>,
    categories: Container<Category>,
    account_types: Container<AccountTypeConfig>,
    sessions: SessionStore,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Open the store, then initialize every container concurrently.
    ///
    /// Fails only if the store itself cannot be opened. A container that
    /// fails is logged and reported; the others still complete.
    pub async fn initialize_all(&self) -> ResultEngine<InitReport> {
        self.store.init().await.inspect_err(|err| {
            tracing::error!(url = %self.store.url(), "failed to open store: {err}")
        })?;

        let (transactions, budgets, accounts, categories, account_types) = tokio::join!(
            self.transactions.init(),
            self.budgets.init(),
            self.accounts.init(),
            self.categories.init(),
            self.account_types.init(),
        );

        let mut report = InitReport::default();
        for (collection, result) in [
            (Collection::Transactions, transactions),
            (Collection::Budgets, budgets),
            (Collection::Accounts, accounts),
            (Collection::Categories, categories),
            (Collection::AccountTypes, account_types),
        ] {
            if let Err(err) = result {
                report.failures.push((collection, err));
            }
        }

        if report.is_ok() {
            tracing::info!("all collections initialized");
        } else {
            tracing::warn!(failed = report.failures.len(), "initialization incomplete");
        }
        Ok(report)
    }

    pub fn status(&self) -> Status {
        Status {
            loading: self.transactions.is_loading()
                || self.budgets.is_loading()
                || self.accounts.is_loading()
                || self.categories.is_loading()
                || self.account_types.is_loading(),
            ready: self.transactions.is_initialized()
                && self.budgets.is_initialized()
                && self.accounts.is_initialized()
                && self.categories.is_initialized()
                && self.account_types.is_initialized(),
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn transactions(&self) -> &Container<Transaction> {
        &self.transactions
    }

    pub fn budgets(&self) -> &Container<Budget> {
        &self.budgets
    }

    pub fn accounts(&self) -> &Container<Account> {
        &self.accounts
    }

    pub fn categories(&self) -> &Container<Category> {
        &self.categories
    }

    pub fn account_types(&self) -> &Container<AccountTypeConfig> {
        &self.account_types
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Session handling on top of `provider`, persisted in this engine's store.
    pub fn auth<P: IdentityProvider>(&self, provider: P) -> AuthService<P> {
        AuthService::new(provider, self.sessions.clone())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            transactions: self.transactions.snapshot(),
            budgets: self.budgets.snapshot(),
            accounts: self.accounts.snapshot(),
            categories: self.categories.snapshot(),
            account_types: self.account_types.snapshot(),
        }
    }

    /// Balance of one account, or `None` if it does not exist.
    pub fn balance_of(&self, account_id: Uuid) -> Option<AccountBalance> {
        let account = self.accounts.get_by_id(account_id)?;
        Some(compute_balance(&account, &self.transactions.snapshot()))
    }

    /// Balances of every active account.
    pub fn balances(&self) -> Vec<AccountBalance> {
        compute_all_balances(&self.accounts.snapshot(), &self.transactions.snapshot())
    }
}

#[derive(Debug, Default)]
pub struct EngineBuilder {
    store: Option<Arc<Store>>,
}

impl EngineBuilder {
    /// Use the database at `url`, e.g. `sqlite:./pocketbook.db?mode=rwc`.
    pub fn database_url(mut self, url: &str) -> EngineBuilder {
        self.store = Some(Arc::new(Store::new(url)));
        self
    }

    /// Share an existing store.
    pub fn store(mut self, store: Arc<Store>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Construct `Engine`. Nothing is opened until
    /// [`Engine::initialize_all`]; without a database the engine runs on a
    /// private in-memory store.
    pub fn build(self) -> Engine {
        let store = self.store.unwrap_or_else(|| Arc::new(Store::memory()));
        Engine {
            transactions: Container::new(Adapter::new(Arc::clone(&store))),
            budgets: Container::new(Adapter::new(Arc::clone(&store))),
            accounts: Container::new(Adapter::new(Arc::clone(&store))),
            categories: Container::new(Adapter::new(Arc::clone(&store))),
            account_types: Container::new(Adapter::new(Arc::clone(&store))),
            sessions: SessionStore::new(Adapter::new(Arc::clone(&store))),
            store,
        }
    }
}
