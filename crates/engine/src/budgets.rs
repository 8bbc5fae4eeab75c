//! Spending limits per category.
//!
//! The amount already spent is not stored: it is always derived from the
//! transactions by the report engine.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    container::{Container, Mirrored},
    store::{Collection, Record},
    util::{self, ensure_non_negative, normalize_display_name, normalize_required_text},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for BudgetPeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidRecord(format!(
                "invalid budget period: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub name: String,
    pub amount: i64,
    pub category: String,
    pub period: BudgetPeriod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    fn normalize(&mut self) -> ResultEngine<()> {
        self.name = normalize_required_text(&self.name, "budget name")?;
        self.category = normalize_display_name(&self.category, "category")?;
        ensure_non_negative(self.amount, "budget amount")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBudget {
    pub name: String,
    pub amount: i64,
    pub category: String,
    pub period: BudgetPeriod,
}

impl NewBudget {
    pub fn monthly(name: &str, amount: i64, category: &str) -> Self {
        Self {
            name: name.to_string(),
            amount,
            category: category.to_string(),
            period: BudgetPeriod::Monthly,
        }
    }

    pub fn yearly(name: &str, amount: i64, category: &str) -> Self {
        Self {
            period: BudgetPeriod::Yearly,
            ..Self::monthly(name, amount, category)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub amount: Option<i64>,
    pub category: Option<String>,
    pub period: Option<BudgetPeriod>,
}

impl Mirrored for Budget {
    type Input = NewBudget;
    type Patch = BudgetPatch;

    const LABEL: &'static str = "budget";

    fn id(&self) -> Uuid {
        self.id
    }

    fn create(input: NewBudget, id: Uuid, now: DateTime<Utc>) -> ResultEngine<Self> {
        let mut budget = Self {
            id,
            name: input.name,
            amount: input.amount,
            category: input.category,
            period: input.period,
            created_at: now,
            updated_at: now,
        };
        budget.normalize()?;
        Ok(budget)
    }

    fn apply(&mut self, patch: BudgetPatch, now: DateTime<Utc>) -> ResultEngine<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(amount) = patch.amount {
            next.amount = amount;
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(period) = patch.period {
            next.period = period;
        }
        next.normalize()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }
}

impl Container<Budget> {
    pub fn by_category(&self, category: &str) -> Vec<Budget> {
        let category = util::display_key(category);
        self.filter(|budget| budget.category == category)
    }

    pub fn by_period(&self, period: BudgetPeriod) -> Vec<Budget> {
        self.filter(|budget| budget.period == period)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub amount: i64,
    pub category: String,
    pub period: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetIndex {
    Category,
    Period,
    CreatedAt,
}

impl Record for Budget {
    type Entity = Entity;
    type Model = Model;
    type ActiveModel = ActiveModel;
    type Index = BudgetIndex;

    const COLLECTION: Collection = Collection::Budgets;

    fn key_column() -> Column {
        Column::Id
    }

    fn index_column(index: BudgetIndex) -> Column {
        match index {
            BudgetIndex::Category => Column::Category,
            BudgetIndex::Period => Column::Period,
            BudgetIndex::CreatedAt => Column::CreatedAt,
        }
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_active_model(&self) -> ResultEngine<ActiveModel> {
        Ok(ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            name: ActiveValue::Set(self.name.clone()),
            amount: ActiveValue::Set(self.amount),
            category: ActiveValue::Set(self.category.clone()),
            period: ActiveValue::Set(self.period.as_str().to_string()),
            created_at: ActiveValue::Set(self.created_at),
            updated_at: ActiveValue::Set(self.updated_at),
        })
    }

    fn from_model(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "budget")?,
            name: model.name,
            amount: model.amount,
            category: model.category,
            period: BudgetPeriod::try_from(model.period.as_str())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
