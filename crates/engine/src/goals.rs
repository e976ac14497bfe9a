//! Goals: a target amount to reach by a date.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    util::{clamped_percentage, days_until},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    Saving,
    Spending,
    Income,
}

impl GoalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saving => "saving",
            Self::Spending => "spending",
            Self::Income => "income",
        }
    }
}

impl TryFrom<&str> for GoalKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "saving" => Ok(Self::Saving),
            "spending" => Ok(Self::Spending),
            "income" => Ok(Self::Income),
            other => Err(EngineError::Validation(format!("invalid goal type: {other}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for GoalStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::Validation(format!(
                "invalid goal status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl GoalPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for GoalPriority {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(EngineError::Validation(format!(
                "invalid goal priority: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub kind: GoalKind,
    pub target_minor: i64,
    pub current_minor: i64,
    pub target_date: DateTime<Utc>,
    pub category: Option<String>,
    pub status: GoalStatus,
    pub priority: GoalPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Progress towards the target, clamped to `[0, 100]`.
    pub fn progress(&self) -> f64 {
        clamped_percentage(self.current_minor, self.target_minor)
    }

    /// Days left until `target_date`. Negative once the goal is overdue.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        days_until(self.target_date, now)
    }

    /// Replace the current amount and auto-complete an active goal that reached
    /// its target. Completion is never undone here.
    pub fn record_progress(&mut self, amount_minor: i64) {
        self.current_minor = amount_minor;
        if self.status == GoalStatus::Active && self.current_minor >= self.target_minor {
            self.status = GoalStatus::Completed;
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub kind: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub target_date: DateTimeUtc,
    pub category: Option<String>,
    pub status: String,
    pub priority: String,
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

impl From<&Goal> for ActiveModel {
    fn from(goal: &Goal) -> Self {
        Self {
            id: ActiveValue::Set(goal.id),
            user_id: ActiveValue::Set(goal.user_id),
            title: ActiveValue::Set(goal.title.clone()),
            description: ActiveValue::Set(goal.description.clone()),
            kind: ActiveValue::Set(goal.kind.as_str().to_string()),
            target_minor: ActiveValue::Set(goal.target_minor),
            current_minor: ActiveValue::Set(goal.current_minor),
            target_date: ActiveValue::Set(goal.target_date),
            category: ActiveValue::Set(goal.category.clone()),
            status: ActiveValue::Set(goal.status.as_str().to_string()),
            priority: ActiveValue::Set(goal.priority.as_str().to_string()),
            created_at: ActiveValue::Set(goal.created_at),
            updated_at: ActiveValue::Set(goal.updated_at),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            kind: GoalKind::try_from(model.kind.as_str())?,
            target_minor: model.target_minor,
            current_minor: model.current_minor,
            target_date: model.target_date,
            category: model.category,
            status: GoalStatus::try_from(model.status.as_str())?,
            priority: GoalPriority::try_from(model.priority.as_str())?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn goal(target_minor: i64, current_minor: i64, status: GoalStatus) -> Goal {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Emergency fund".to_string(),
            description: None,
            kind: GoalKind::Saving,
            target_minor,
            current_minor,
            target_date: created + Duration::days(90),
            category: None,
            status,
            priority: GoalPriority::default(),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(goal(100_000, 25_000, GoalStatus::Active).progress(), 25.0);
        assert_eq!(goal(100_000, 250_000, GoalStatus::Active).progress(), 100.0);
        assert_eq!(goal(0, 10, GoalStatus::Active).progress(), 0.0);
    }

    #[test]
    fn reaching_target_completes_active_goal() {
        let mut g = goal(100_000, 0, GoalStatus::Active);
        g.record_progress(100_000);
        assert_eq!(g.status, GoalStatus::Completed);
        assert_eq!(g.current_minor, 100_000);

        g.record_progress(10_000);
        assert_eq!(g.status, GoalStatus::Completed);
        assert_eq!(g.current_minor, 10_000);
    }

    #[test]
    fn paused_goal_is_not_completed_automatically() {
        let mut g = goal(100_000, 0, GoalStatus::Paused);
        g.record_progress(200_000);
        assert_eq!(g.status, GoalStatus::Paused);
    }

    #[test]
    fn progress_replaces_instead_of_adding() {
        let mut g = goal(100_000, 40_000, GoalStatus::Active);
        g.record_progress(30_000);
        assert_eq!(g.current_minor, 30_000);
        assert_eq!(g.status, GoalStatus::Active);
    }

    #[test]
    fn days_remaining_can_be_negative() {
        let g = goal(100_000, 0, GoalStatus::Active);
        assert_eq!(g.days_remaining(g.target_date - Duration::days(5)), 5);
        assert_eq!(g.days_remaining(g.target_date + Duration::days(3)), -3);
    }
}
