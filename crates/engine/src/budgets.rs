//! Budgets: a spending limit for one category over a date window.
//!
//! `spent_minor` is a denormalized running total. It is bumped when a matching
//! expense is recorded and overwritten when the budget is recalculated from the
//! stored transactions. The derived metrics below are never persisted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{clamped_percentage, days_until},
};

pub const DEFAULT_ALERT_THRESHOLD: f64 = 80.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for BudgetPeriod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::Validation(format!(
                "invalid budget period: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    #[default]
    Active,
    Inactive,
    Exceeded,
}

impl BudgetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Exceeded => "exceeded",
        }
    }

    /// Status after a full recalculation. Unlike the incremental path this can
    /// move an exceeded budget back to active.
    pub fn recalculated(spent_minor: i64, limit_minor: i64) -> Self {
        if spent_minor > limit_minor {
            Self::Exceeded
        } else {
            Self::Active
        }
    }
}

impl TryFrom<&str> for BudgetStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "exceeded" => Ok(Self::Exceeded),
            other => Err(EngineError::Validation(format!(
                "invalid budget status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetNotifications {
    pub email: bool,
    pub push: bool,
}

impl Default for BudgetNotifications {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub limit_minor: i64,
    pub spent_minor: i64,
    pub period: BudgetPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BudgetStatus,
    pub alert_threshold: f64,
    pub notifications: BudgetNotifications,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Share of the limit already spent, clamped to `[0, 100]`.
    pub fn usage_percentage(&self) -> f64 {
        clamped_percentage(self.spent_minor, self.limit_minor)
    }

    pub fn remaining_minor(&self) -> i64 {
        (self.limit_minor - self.spent_minor).max(0)
    }

    pub fn is_in_alert(&self) -> bool {
        self.usage_percentage() >= self.alert_threshold
    }

    pub fn is_exceeded(&self) -> bool {
        self.spent_minor > self.limit_minor
    }

    /// Days left until `end_date`, never negative.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        days_until(self.end_date, now).max(0)
    }

    /// True when a transaction dated `at` falls inside the budget window.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }
}

pub(crate) fn validate_alert_threshold(value: f64) -> ResultEngine<f64> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(EngineError::Validation(
            "alertThreshold must be between 0 and 100".to_string(),
        ));
    }
    Ok(value)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub limit_minor: i64,
    pub spent_minor: i64,
    pub period: String,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub status: String,
    pub alert_threshold: f64,
    pub notify_email: bool,
    pub notify_push: bool,
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

impl From<&Budget> for ActiveModel {
    fn from(budget: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(budget.id),
            user_id: ActiveValue::Set(budget.user_id),
            name: ActiveValue::Set(budget.name.clone()),
            description: ActiveValue::Set(budget.description.clone()),
            category: ActiveValue::Set(budget.category.clone()),
            limit_minor: ActiveValue::Set(budget.limit_minor),
            spent_minor: ActiveValue::Set(budget.spent_minor),
            period: ActiveValue::Set(budget.period.as_str().to_string()),
            start_date: ActiveValue::Set(budget.start_date),
            end_date: ActiveValue::Set(budget.end_date),
            status: ActiveValue::Set(budget.status.as_str().to_string()),
            alert_threshold: ActiveValue::Set(budget.alert_threshold),
            notify_email: ActiveValue::Set(budget.notifications.email),
            notify_push: ActiveValue::Set(budget.notifications.push),
            created_at: ActiveValue::Set(budget.created_at),
            updated_at: ActiveValue::Set(budget.updated_at),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            category: model.category,
            limit_minor: model.limit_minor,
            spent_minor: model.spent_minor,
            period: BudgetPeriod::try_from(model.period.as_str())?,
            start_date: model.start_date,
            end_date: model.end_date,
            status: BudgetStatus::try_from(model.status.as_str())?,
            alert_threshold: model.alert_threshold,
            notifications: BudgetNotifications {
                email: model.notify_email,
                push: model.notify_push,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
