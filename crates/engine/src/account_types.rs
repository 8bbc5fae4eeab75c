//! Display configuration of account types (label, icon, color).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ResultEngine,
    accounts::AccountType,
    container::{Container, Mirrored},
    store::{Collection, Record},
    util::{self, normalize_display_name, normalize_optional_text},
};

pub const DEFAULT_ACCOUNT_TYPES: [(&str, AccountType, &str, &str); 5] = [
    ("現金", AccountType::Cash, "💵", "#2ECC71"),
    ("銀行口座", AccountType::Bank, "🏦", "#3498DB"),
    ("クレジットカード", AccountType::CreditCard, "💳", "#E74C3C"),
    ("電子マネー", AccountType::EMoney, "📱", "#9B59B6"),
    ("その他", AccountType::Other, "❓", "#95A5A6"),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTypeConfig {
    pub id: Uuid,
    pub name: String,
    pub account_type: AccountType,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountTypeConfig {
    fn normalize(&mut self) -> ResultEngine<()> {
        self.name = normalize_display_name(&self.name, "account type name")?;
        self.icon = normalize_optional_text(self.icon.as_deref());
        self.color = normalize_optional_text(self.color.as_deref());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccountTypeConfig {
    pub name: String,
    pub account_type: AccountType,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
}

impl NewAccountTypeConfig {
    pub fn new(name: &str, account_type: AccountType) -> Self {
        Self {
            name: name.to_string(),
            account_type,
            icon: None,
            color: None,
            is_default: false,
            is_active: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountTypeConfigPatch {
    pub name: Option<String>,
    pub account_type: Option<AccountType>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Mirrored for AccountTypeConfig {
    type Input = NewAccountTypeConfig;
    type Patch = AccountTypeConfigPatch;

    const LABEL: &'static str = "account type";

    fn id(&self) -> Uuid {
        self.id
    }

    fn create(input: NewAccountTypeConfig, id: Uuid, now: DateTime<Utc>) -> ResultEngine<Self> {
        let mut config = Self {
            id,
            name: input.name,
            account_type: input.account_type,
            icon: input.icon,
            color: input.color,
            is_default: input.is_default,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        config.normalize()?;
        Ok(config)
    }

    fn apply(&mut self, patch: AccountTypeConfigPatch, now: DateTime<Utc>) -> ResultEngine<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(account_type) = patch.account_type {
            next.account_type = account_type;
        }
        if let Some(icon) = patch.icon {
            next.icon = icon;
        }
        if let Some(color) = patch.color {
            next.color = color;
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }
        next.normalize()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    fn is_protected(&self) -> bool {
        self.is_default
    }

    fn defaults() -> Vec<NewAccountTypeConfig> {
        DEFAULT_ACCOUNT_TYPES
            .iter()
            .map(|(name, account_type, icon, color)| NewAccountTypeConfig {
                icon: Some(String::from(*icon)),
                color: Some(String::from(*color)),
                is_default: true,
                ..NewAccountTypeConfig::new(name, *account_type)
            })
            .collect()
    }
}

impl Container<AccountTypeConfig> {
    pub fn active(&self) -> Vec<AccountTypeConfig> {
        self.filter(|config| config.is_active)
    }

    pub fn by_type(&self, account_type: AccountType) -> Vec<AccountTypeConfig> {
        self.filter(|config| config.account_type == account_type)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_name = "type")]
    pub account_type: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountTypeIndex {
    Type,
    IsActive,
    CreatedAt,
}

impl Record for AccountTypeConfig {
    type Entity = Entity;
    type Model = Model;
    type ActiveModel = ActiveModel;
    type Index = AccountTypeIndex;

    const COLLECTION: Collection = Collection::AccountTypes;

    fn key_column() -> Column {
        Column::Id
    }

    fn index_column(index: AccountTypeIndex) -> Column {
        match index {
            AccountTypeIndex::Type => Column::AccountType,
            AccountTypeIndex::IsActive => Column::IsActive,
            AccountTypeIndex::CreatedAt => Column::CreatedAt,
        }
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_active_model(&self) -> ResultEngine<ActiveModel> {
        Ok(ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            name: ActiveValue::Set(self.name.clone()),
            account_type: ActiveValue::Set(self.account_type.as_str().to_string()),
            icon: ActiveValue::Set(self.icon.clone()),
            color: ActiveValue::Set(self.color.clone()),
            is_default: ActiveValue::Set(self.is_default),
            is_active: ActiveValue::Set(self.is_active),
            created_at: ActiveValue::Set(self.created_at),
            updated_at: ActiveValue::Set(self.updated_at),
        })
    }

    fn from_model(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: util::parse_uuid(&model.id, "account type")?,
            name: model.name,
            account_type: AccountType::try_from(model.account_type.as_str())?,
            icon: model.icon,
            color: model.color,
            is_default: model.is_default,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
