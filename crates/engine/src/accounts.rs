//! Accounts hold money: cash, bank accounts, credit cards, e-money.
//!
//! Credit-card specific settings live inside [`AccountKind::CreditCard`], so a
//! bank account can never carry a credit limit.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    container::{Container, Mirrored},
    store::{Collection, Record},
    util::{self, normalize_display_name, normalize_optional_text},
};

/// The type of an account without its type-specific settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Cash,
    Bank,
    CreditCard,
    EMoney,
    Other,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        Self::Cash,
        Self::Bank,
        Self::CreditCard,
        Self::EMoney,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
            Self::CreditCard => "credit_card",
            Self::EMoney => "e_money",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| EngineError::InvalidRecord(format!("invalid account type: {value}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccountKind {
    Cash,
    Bank,
    CreditCard {
        credit_limit: i64,
        /// Day of month the statement closes (1..=31).
        statement_day: Option<u8>,
        /// Day of month the statement is paid (1..=31).
        payment_day: Option<u8>,
    },
    EMoney,
    Other,
}

impl AccountKind {
    pub fn account_type(&self) -> AccountType {
        match self {
            Self::Cash => AccountType::Cash,
            Self::Bank => AccountType::Bank,
            Self::CreditCard { .. } => AccountType::CreditCard,
            Self::EMoney => AccountType::EMoney,
            Self::Other => AccountType::Other,
        }
    }

    pub fn credit_limit(&self) -> Option<i64> {
        match self {
            Self::CreditCard { credit_limit, .. } => Some(*credit_limit),
            _ => None,
        }
    }

    fn validate(&self) -> ResultEngine<()> {
        if let Self::CreditCard {
            credit_limit,
            statement_day,
            payment_day,
        } = self
        {
            util::ensure_non_negative(*credit_limit, "credit limit")?;
            for (day, label) in [(statement_day, "statement day"), (payment_day, "payment day")] {
                if day.is_some_and(|day| !(1..=31).contains(&day)) {
                    return Err(EngineError::Validation(format!(
                        "{label} must be between 1 and 31"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    /// Opening balance; movements are applied on top of it.
    pub balance: i64,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn account_type(&self) -> AccountType {
        self.kind.account_type()
    }

    pub fn is_credit_card(&self) -> bool {
        self.account_type() == AccountType::CreditCard
    }

    fn normalize(&mut self) -> ResultEngine<()> {
        self.name = normalize_display_name(&self.name, "account name")?;
        self.description = normalize_optional_text(self.description.as_deref());
        self.kind.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub balance: i64,
    pub is_active: bool,
    pub description: Option<String>,
}

impl NewAccount {
    /// An active account with the given opening balance.
    pub fn new(name: &str, kind: AccountKind, balance: i64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            balance,
            is_active: true,
            description: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub balance: Option<i64>,
    pub is_active: Option<bool>,
    pub description: Option<Option<String>>,
}

impl Mirrored for Account {
    type Input = NewAccount;
    type Patch = AccountPatch;

    const LABEL: &'static str = "account";

    fn id(&self) -> Uuid {
        self.id
    }

    fn create(input: NewAccount, id: Uuid, now: DateTime<Utc>) -> ResultEngine<Self> {
        let mut account = Self {
            id,
            name: input.name,
            kind: input.kind,
            balance: input.balance,
            is_active: input.is_active,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        account.normalize()?;
        Ok(account)
    }

    fn apply(&mut self, patch: AccountPatch, now: DateTime<Utc>) -> ResultEngine<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(balance) = patch.balance {
            next.balance = balance;
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        next.normalize()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

impl Container<Account> {
    pub fn active(&self) -> Vec<Account> {
        self.filter(|account| account.is_active)
    }

    pub fn by_type(&self, account_type: AccountType) -> Vec<Account> {
        self.filter(|account| account.account_type() == account_type)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_name = "type")]
    pub account_type: String,
    pub balance: i64,
    pub credit_limit: Option<i64>,
    pub statement_day: Option<i16>,
    pub payment_day: Option<i16>,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountIndex {
    Type,
    IsActive,
    CreatedAt,
}

fn stored_day(day: Option<i16>, label: &str) -> ResultEngine<Option<u8>> {
    day.map(|day| {
        u8::try_from(day).map_err(|_| EngineError::InvalidRecord(format!("invalid {label}: {day}")))
    })
    .transpose()
}

impl Record for Account {
    type Entity = Entity;
    type Model = Model;
    type ActiveModel = ActiveModel;
    type Index = AccountIndex;

    const COLLECTION: Collection = Collection::Accounts;

    fn key_column() -> Column {
        Column::Id
    }

    fn index_column(index: AccountIndex) -> Column {
        match index {
            AccountIndex::Type => Column::AccountType,
            AccountIndex::IsActive => Column::IsActive,
            AccountIndex::CreatedAt => Column::CreatedAt,
        }
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_active_model(&self) -> ResultEngine<ActiveModel> {
        let (credit_limit, statement_day, payment_day) = match &self.kind {
            AccountKind::CreditCard {
                credit_limit,
                statement_day,
                payment_day,
            } => (
                Some(*credit_limit),
                statement_day.map(i16::from),
                payment_day.map(i16::from),
            ),
            _ => (None, None, None),
        };
        Ok(ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            name: ActiveValue::Set(self.name.clone()),
            account_type: ActiveValue::Set(self.account_type().as_str().to_string()),
            balance: ActiveValue::Set(self.balance),
            credit_limit: ActiveValue::Set(credit_limit),
            statement_day: ActiveValue::Set(statement_day),
            payment_day: ActiveValue::Set(payment_day),
            is_active: ActiveValue::Set(self.is_active),
            description: ActiveValue::Set(self.description.clone()),
            created_at: ActiveValue::Set(self.created_at),
            updated_at: ActiveValue::Set(self.updated_at),
        })
    }

    fn from_model(model: Model) -> ResultEngine<Self> {
        let kind = match AccountType::try_from(model.account_type.as_str())? {
            AccountType::Cash => AccountKind::Cash,
            AccountType::Bank => AccountKind::Bank,
            AccountType::CreditCard => AccountKind::CreditCard {
                credit_limit: model.credit_limit.unwrap_or(0),
                statement_day: stored_day(model.statement_day, "statement day")?,
                payment_day: stored_day(model.payment_day, "payment day")?,
            },
            AccountType::EMoney => AccountKind::EMoney,
            AccountType::Other => AccountKind::Other,
        };
        Ok(Self {
            id: util::parse_uuid(&model.id, "account")?,
            name: model.name,
            kind,
            balance: model.balance,
            is_active: model.is_active,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
