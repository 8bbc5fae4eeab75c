//! Transaction primitives.
//!
//! A `Transaction` moves money out of, into, or between accounts. What it does
//! is carried by its [`Movement`]: expenses and incomes are booked against a
//! category, transfers name the destination account. Accounts, budgets and
//! categories are referenced by id only; a dangling reference is not an error.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    container::{Container, Mirrored},
    store::{Collection, Record},
    util::{self, ensure_non_negative, normalize_display_name},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidRecord(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Whose money it was: `Advance` marks an expense paid on someone else's
/// behalf that is expected to be reimbursed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subkind {
    #[default]
    Personal,
    Advance,
}

impl Subkind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Advance => "advance",
        }
    }
}

impl TryFrom<&str> for Subkind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "personal" => Ok(Self::Personal),
            "advance" => Ok(Self::Advance),
            other => Err(EngineError::InvalidRecord(format!(
                "invalid transaction subkind: {other}"
            ))),
        }
    }
}

/// What a transaction does to its source account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Movement {
    Expense { category: String },
    Income { category: String },
    Transfer { to_account_id: Uuid },
}

impl Movement {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Expense { .. } => TransactionKind::Expense,
            Self::Income { .. } => TransactionKind::Income,
            Self::Transfer { .. } => TransactionKind::Transfer,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            Self::Expense { category } | Self::Income { category } => Some(category),
            Self::Transfer { .. } => None,
        }
    }

    pub fn to_account_id(&self) -> Option<Uuid> {
        match self {
            Self::Transfer { to_account_id } => Some(*to_account_id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub description: String,
    /// Always >= 0; the direction comes from `movement`.
    pub amount: i64,
    pub movement: Movement,
    pub subkind: Subkind,
    pub date: NaiveDate,
    pub account_id: Uuid,
    pub budget_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub included_in_budget: bool,
    /// Statement the charge belongs to, for credit-card accounts.
    pub statement_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        self.movement.kind()
    }

    pub fn category(&self) -> Option<&str> {
        self.movement.category()
    }

    pub fn to_account_id(&self) -> Option<Uuid> {
        self.movement.to_account_id()
    }

    pub fn is_expense(&self) -> bool {
        self.kind() == TransactionKind::Expense
    }

    pub fn is_advance(&self) -> bool {
        self.subkind == Subkind::Advance
    }

    /// `true` if the transaction touches `account_id` on either side.
    pub fn involves(&self, account_id: Uuid) -> bool {
        self.account_id == account_id || self.to_account_id() == Some(account_id)
    }

    fn normalize(&mut self) -> ResultEngine<()> {
        self.description = self.description.trim().to_string();
        ensure_non_negative(self.amount, "amount")?;
        if self.account_id.is_nil() {
            return Err(EngineError::Validation("account is required".to_string()));
        }
        match &mut self.movement {
            Movement::Expense { category } | Movement::Income { category } => {
                *category = normalize_display_name(category, "category")?;
            }
            Movement::Transfer { to_account_id } => {
                if to_account_id.is_nil() {
                    return Err(EngineError::Validation(
                        "transfer destination is required".to_string(),
                    ));
                }
                if *to_account_id == self.account_id {
                    return Err(EngineError::Validation(
                        "transfer source and destination must differ".to_string(),
                    ));
                }
            }
        }
        self.tags = self
            .tags
            .iter()
            .filter_map(|tag| util::normalize_optional_text(Some(tag.as_str())))
            .collect();
        Ok(())
    }
}

/// Fields of a transaction about to be created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: i64,
    pub movement: Movement,
    pub subkind: Subkind,
    pub date: NaiveDate,
    pub account_id: Uuid,
    pub budget_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub included_in_budget: bool,
    pub statement_date: Option<NaiveDate>,
}

impl NewTransaction {
    fn new(
        description: &str,
        amount: i64,
        movement: Movement,
        account_id: Uuid,
        date: NaiveDate,
    ) -> Self {
        Self {
            description: description.to_string(),
            amount,
            movement,
            subkind: Subkind::Personal,
            date,
            account_id,
            budget_id: None,
            tags: Vec::new(),
            included_in_budget: true,
            statement_date: None,
        }
    }

    pub fn expense(
        description: &str,
        amount: i64,
        category: &str,
        account_id: Uuid,
        date: NaiveDate,
    ) -> Self {
        let movement = Movement::Expense {
            category: category.to_string(),
        };
        Self::new(description, amount, movement, account_id, date)
    }

    pub fn income(
        description: &str,
        amount: i64,
        category: &str,
        account_id: Uuid,
        date: NaiveDate,
    ) -> Self {
        let movement = Movement::Income {
            category: category.to_string(),
        };
        Self::new(description, amount, movement, account_id, date)
    }

    /// A transfer is never part of a budget.
    pub fn transfer(
        description: &str,
        amount: i64,
        from_account_id: Uuid,
        to_account_id: Uuid,
        date: NaiveDate,
    ) -> Self {
        let movement = Movement::Transfer { to_account_id };
        let mut tx = Self::new(description, amount, movement, from_account_id, date);
        tx.included_in_budget = false;
        tx
    }

    pub fn advance(mut self) -> Self {
        self.subkind = Subkind::Advance;
        self
    }

    pub fn with_budget(mut self, budget_id: Uuid) -> Self {
        self.budget_id = Some(budget_id);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_statement_date(mut self, statement_date: NaiveDate) -> Self {
        self.statement_date = Some(statement_date);
        self
    }
}

/// Partial update of a transaction. `Some(None)` clears an optional field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub description: Option<String>,
    pub amount: Option<i64>,
    pub movement: Option<Movement>,
    pub subkind: Option<Subkind>,
    pub date: Option<NaiveDate>,
    pub account_id: Option<Uuid>,
    pub budget_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub included_in_budget: Option<bool>,
    pub statement_date: Option<Option<NaiveDate>>,
}

impl Mirrored for Transaction {
    type Input = NewTransaction;
    type Patch = TransactionPatch;

    const LABEL: &'static str = "transaction";

    fn id(&self) -> Uuid {
        self.id
    }

    fn create(input: NewTransaction, id: Uuid, now: DateTime<Utc>) -> ResultEngine<Self> {
        let mut tx = Self {
            id,
            description: input.description,
            amount: input.amount,
            movement: input.movement,
            subkind: input.subkind,
            date: input.date,
            account_id: input.account_id,
            budget_id: input.budget_id,
            tags: input.tags,
            included_in_budget: input.included_in_budget,
            statement_date: input.statement_date,
            created_at: now,
            updated_at: now,
        };
        tx.normalize()?;
        Ok(tx)
    }

    fn apply(&mut self, patch: TransactionPatch, now: DateTime<Utc>) -> ResultEngine<()> {
        let mut next = self.clone();
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(amount) = patch.amount {
            next.amount = amount;
        }
        if let Some(movement) = patch.movement {
            next.movement = movement;
        }
        if let Some(subkind) = patch.subkind {
            next.subkind = subkind;
        }
        if let Some(date) = patch.date {
            next.date = date;
        }
        if let Some(account_id) = patch.account_id {
            next.account_id = account_id;
        }
        if let Some(budget_id) = patch.budget_id {
            next.budget_id = budget_id;
        }
        if let Some(tags) = patch.tags {
            next.tags = tags;
        }
        if let Some(included) = patch.included_in_budget {
            next.included_in_budget = included;
        }
        if let Some(statement_date) = patch.statement_date {
            next.statement_date = statement_date;
        }
        next.normalize()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

impl Container<Transaction> {
    pub fn by_budget(&self, budget_id: Uuid) -> Vec<Transaction> {
        self.filter(|tx| tx.budget_id == Some(budget_id))
    }

    /// Transactions dated within `start..=end`, in mirror order.
    pub fn by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Transaction> {
        self.filter(|tx| (start..=end).contains(&tx.date))
    }

    /// Transactions touching `account_id` as source or transfer destination.
    pub fn by_account(&self, account_id: Uuid) -> Vec<Transaction> {
        self.filter(|tx| tx.involves(account_id))
    }

    pub fn by_category(&self, category: &str) -> Vec<Transaction> {
        let category = util::display_key(category);
        self.filter(|tx| tx.category() == Some(category.as_str()))
    }

    pub fn by_kind(&self, kind: TransactionKind) -> Vec<Transaction> {
        self.filter(|tx| tx.kind() == kind)
    }

    pub fn included_in_budget(&self) -> Vec<Transaction> {
        self.filter(|tx| tx.included_in_budget)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub description: String,
    pub amount: i64,
    pub kind: String,
    pub subkind: String,
    pub category: Option<String>,
    pub date: Date,
    pub account_id: String,
    pub to_account_id: Option<String>,
    pub budget_id: Option<String>,
    pub tags: Json,
    pub included_in_budget: bool,
    pub statement_date: Option<Date>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Secondary indexes of the `transactions` collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionIndex {
    Date,
    Category,
    Kind,
    Subkind,
    AccountId,
    ToAccountId,
    BudgetId,
    CreatedAt,
}

impl Record for Transaction {
    type Entity = Entity;
    type Model = Model;
    type ActiveModel = ActiveModel;
    type Index = TransactionIndex;

    const COLLECTION: Collection = Collection::Transactions;

    fn key_column() -> Column {
        Column::Id
    }

    fn index_column(index: TransactionIndex) -> Column {
        match index {
            TransactionIndex::Date => Column::Date,
            TransactionIndex::Category => Column::Category,
            TransactionIndex::Kind => Column::Kind,
            TransactionIndex::Subkind => Column::Subkind,
            TransactionIndex::AccountId => Column::AccountId,
            TransactionIndex::ToAccountId => Column::ToAccountId,
            TransactionIndex::BudgetId => Column::BudgetId,
            TransactionIndex::CreatedAt => Column::CreatedAt,
        }
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_active_model(&self) -> ResultEngine<ActiveModel> {
        let tags = serde_json::to_value(&self.tags)
            .map_err(|err| EngineError::InvalidRecord(format!("transaction tags: {err}")))?;
        Ok(ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            description: ActiveValue::Set(self.description.clone()),
            amount: ActiveValue::Set(self.amount),
            kind: ActiveValue::Set(self.kind().as_str().to_string()),
            subkind: ActiveValue::Set(self.subkind.as_str().to_string()),
            category: ActiveValue::Set(self.category().map(ToString::to_string)),
            date: ActiveValue::Set(self.date),
            account_id: ActiveValue::Set(self.account_id.to_string()),
            to_account_id: ActiveValue::Set(self.to_account_id().map(|id| id.to_string())),
            budget_id: ActiveValue::Set(self.budget_id.map(|id| id.to_string())),
            tags: ActiveValue::Set(tags),
            included_in_budget: ActiveValue::Set(self.included_in_budget),
            statement_date: ActiveValue::Set(self.statement_date),
            created_at: ActiveValue::Set(self.created_at),
            updated_at: ActiveValue::Set(self.updated_at),
        })
    }

    fn from_model(model: Model) -> ResultEngine<Self> {
        let movement = match TransactionKind::try_from(model.kind.as_str())? {
            TransactionKind::Expense => Movement::Expense {
                category: model.category.unwrap_or_default(),
            },
            TransactionKind::Income => Movement::Income {
                category: model.category.unwrap_or_default(),
            },
            TransactionKind::Transfer => {
                let to = model.to_account_id.as_deref().ok_or_else(|| {
                    EngineError::InvalidRecord(format!(
                        "transfer {} has no destination account",
                        model.id
                    ))
                })?;
                Movement::Transfer {
                    to_account_id: util::parse_uuid(to, "destination account")?,
                }
            }
        };
        let tags = serde_json::from_value(model.tags)
            .map_err(|err| EngineError::InvalidRecord(format!("transaction tags: {err}")))?;

        Ok(Self {
            id: util::parse_uuid(&model.id, "transaction")?,
            description: model.description,
            amount: model.amount,
            movement,
            subkind: Subkind::try_from(model.subkind.as_str())?,
            date: model.date,
            account_id: util::parse_uuid(&model.account_id, "account")?,
            budget_id: util::parse_optional_uuid(model.budget_id.as_deref(), "budget")?,
            tags,
            included_in_budget: model.included_in_budget,
            statement_date: model.statement_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn create(input: NewTransaction) -> ResultEngine<Transaction> {
        Transaction::create(input, Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn transfer_to_same_account_is_rejected() {
        let account = Uuid::new_v4();
        let err = create(NewTransaction::transfer("move", 100, account, account, day(1)))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("transfer source and destination must differ".to_string())
        );
    }

    #[test]
    fn expense_requires_category() {
        let err = create(NewTransaction::expense("lunch", 800, "  ", Uuid::new_v4(), day(2)))
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("category must not be empty".to_string())
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = create(NewTransaction::income("refund", -1, "その他", Uuid::new_v4(), day(3)))
            .unwrap_err();
        assert_eq!(err, EngineError::Validation("amount must be >= 0".to_string()));
    }

    #[test]
    fn missing_account_is_rejected() {
        let err =
            create(NewTransaction::expense("bus", 220, "交通費", Uuid::nil(), day(4))).unwrap_err();
        assert_eq!(err, EngineError::Validation("account is required".to_string()));
    }

    #[test]
    fn apply_merges_fields_and_refreshes_updated_at() {
        let created_at = Utc::now() - chrono::Duration::hours(1);
        let mut tx = Transaction::create(
            NewTransaction::expense("lunch", 800, "食費", Uuid::new_v4(), day(5))
                .with_tags(["work", " "]),
            Uuid::new_v4(),
            created_at,
        )
        .unwrap();
        assert_eq!(tx.tags, vec!["work".to_string()]);

        let now = Utc::now();
        tx.apply(
            TransactionPatch {
                amount: Some(950),
                subkind: Some(Subkind::Advance),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        assert_eq!(tx.amount, 950);
        assert!(tx.is_advance());
        assert_eq!(tx.description, "lunch");
        assert_eq!(tx.created_at, created_at);
        assert_eq!(tx.updated_at, now);
    }

    #[test]
    fn failed_apply_leaves_record_untouched() {
        let account = Uuid::new_v4();
        let mut tx = create(NewTransaction::transfer(
            "savings",
            5000,
            account,
            Uuid::new_v4(),
            day(6),
        ))
        .unwrap();
        let before = tx.clone();

        let result = tx.apply(
            TransactionPatch {
                movement: Some(Movement::Transfer {
                    to_account_id: account,
                }),
                ..Default::default()
            },
            Utc::now(),
        );

        assert!(result.is_err());
        assert_eq!(tx, before);
    }

    #[test]
    fn model_round_trip_keeps_movement() {
        let tx = create(
            NewTransaction::transfer("card payment", 12000, Uuid::new_v4(), Uuid::new_v4(), day(7))
                .with_tags(["card"]),
        )
        .unwrap();
        let active = tx.to_active_model().unwrap();
        let model = Model {
            id: active.id.unwrap(),
            description: active.description.unwrap(),
            amount: active.amount.unwrap(),
            kind: active.kind.unwrap(),
            subkind: active.subkind.unwrap(),
            category: active.category.unwrap(),
            date: active.date.unwrap(),
            account_id: active.account_id.unwrap(),
            to_account_id: active.to_account_id.unwrap(),
            budget_id: active.budget_id.unwrap(),
            tags: active.tags.unwrap(),
            included_in_budget: active.included_in_budget.unwrap(),
            statement_date: active.statement_date.unwrap(),
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };
        assert_eq!(model.kind, "transfer");
        assert_eq!(model.category, None);
        assert_eq!(Transaction::from_model(model).unwrap(), tx);
    }
}
