//! Expense and income categories.
//!
//! A fixed set of default categories is seeded the first time the collection
//! is found empty. Defaults can be deactivated but never deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ResultEngine,
    container::{Container, Mirrored},
    store::{Collection, Record},
    util::{self, normalize_display_name, normalize_optional_text},
};

/// Name, icon and color of every seeded category.
pub const DEFAULT_CATEGORIES: [(&str, &str, &str); 8] = [
    ("食費", "🍽️", "#FF6B6B"),
    ("交通費", "🚗", "#4ECDC4"),
    ("娯楽費", "🎮", "#45B7D1"),
    ("生活費", "🏠", "#96CEB4"),
    ("医療費", "🏥", "#FFEAA7"),
    ("教育費", "📚", "#DDA0DD"),
    ("衣服費", "👕", "#FFB6C1"),
    ("その他", "📝", "#95A5A6"),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    fn normalize(&mut self) -> ResultEngine<()> {
        self.name = normalize_display_name(&self.name, "category name")?;
        self.icon = normalize_optional_text(self.icon.as_deref());
        self.color = normalize_optional_text(self.color.as_deref());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
}

impl NewCategory {
    /// An active, user-defined category.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: None,
            color: None,
            is_default: false,
            is_active: true,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

/// `is_default` is fixed at creation and cannot be patched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl Mirrored for Category {
    type Input = NewCategory;
    type Patch = CategoryPatch;

    const LABEL: &'static str = "category";

    fn id(&self) -> Uuid {
        self.id
    }

    fn create(input: NewCategory, id: Uuid, now: DateTime<Utc>) -> ResultEngine<Self> {
        let mut category = Self {
            id,
            name: input.name,
            icon: input.icon,
            color: input.color,
            is_default: input.is_default,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        category.normalize()?;
        Ok(category)
    }

    fn apply(&mut self, patch: CategoryPatch, now: DateTime<Utc>) -> ResultEngine<()> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name;
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

    fn defaults() -> Vec<NewCategory> {
        DEFAULT_CATEGORIES
            .iter()
            .map(|(name, icon, color)| NewCategory {
                is_default: true,
                ..NewCategory::new(name).with_icon(icon).with_color(color)
            })
            .collect()
    }
}

impl Container<Category> {
    pub fn active(&self) -> Vec<Category> {
        self.filter(|category| category.is_active)
    }

    /// Names of the active categories, in mirror order.
    pub fn active_names(&self) -> Vec<String> {
        self.active()
            .into_iter()
            .map(|category| category.name)
            .collect()
    }

    /// Lookup by name; full-width and half-width spellings match.
    pub fn by_name(&self, name: &str) -> Option<Category> {
        let wanted = util::display_key(name);
        self.filter(|category| category.name == wanted)
            .into_iter()
            .next()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
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
pub enum CategoryIndex {
    Name,
    IsActive,
    CreatedAt,
}

impl Record for Category {
    type Entity = Entity;
    type Model = Model;
    type ActiveModel = ActiveModel;
    type Index = CategoryIndex;

    const COLLECTION: Collection = Collection::Categories;

    fn key_column() -> Column {
        Column::Id
    }

    fn index_column(index: CategoryIndex) -> Column {
        match index {
            CategoryIndex::Name => Column::Name,
            CategoryIndex::IsActive => Column::IsActive,
            CategoryIndex::CreatedAt => Column::CreatedAt,
        }
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn to_active_model(&self) -> ResultEngine<ActiveModel> {
        Ok(ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            name: ActiveValue::Set(self.name.clone()),
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
            id: util::parse_uuid(&model.id, "category")?,
            name: model.name,
            icon: model.icon,
            color: model.color,
            is_default: model.is_default,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
