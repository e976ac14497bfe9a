//! Category registry per user.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, TransactionKind, util::normalize_name_key};

pub const DEFAULT_COLOR: &str = "#6b7280";
pub const DEFAULT_ICON: &str = "💰";

/// Categories every new user starts with.
pub(crate) const DEFAULT_CATEGORIES: &[(TransactionKind, &str)] = &[
    (TransactionKind::Income, "Salary"),
    (TransactionKind::Income, "Freelance"),
    (TransactionKind::Income, "Investments"),
    (TransactionKind::Income, "Sales"),
    (TransactionKind::Income, "Other income"),
    (TransactionKind::Expense, "Food"),
    (TransactionKind::Expense, "Transport"),
    (TransactionKind::Expense, "Housing"),
    (TransactionKind::Expense, "Entertainment"),
    (TransactionKind::Expense, "Health"),
    (TransactionKind::Expense, "Education"),
    (TransactionKind::Expense, "Clothing"),
    (TransactionKind::Expense, "Other expenses"),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: TransactionKind,
    pub color: String,
    pub icon: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub color: String,
    pub icon: String,
    pub is_default: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            color: model.color,
            icon: model.icon,
            is_default: model.is_default,
            created_at: model.created_at,
        })
    }
}

pub(crate) fn default_active_models(user_id: Uuid, now: DateTime<Utc>) -> Vec<ActiveModel> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(kind, name)| ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            user_id: ActiveValue::Set(user_id),
            name: ActiveValue::Set((*name).to_string()),
            name_norm: ActiveValue::Set(
                normalize_name_key(name).unwrap_or_else(|| name.to_lowercase()),
            ),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            color: ActiveValue::Set(DEFAULT_COLOR.to_string()),
            icon: ActiveValue::Set(DEFAULT_ICON.to_string()),
            is_default: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        })
        .collect()
}
