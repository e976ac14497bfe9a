use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Goal, GoalKind, GoalPriority, GoalStats, GoalStatus, ResultEngine, goals,
    util::{non_negative, optional_text, required_text},
};

use super::Engine;

#[derive(Clone, Debug, Default)]
pub struct GoalDraft {
    pub title: String,
    pub description: Option<String>,
    pub kind: Option<GoalKind>,
    pub target_minor: Option<i64>,
    pub current_minor: Option<i64>,
    pub target_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub priority: Option<GoalPriority>,
}

/// Partial update of a goal. Pausing or cancelling goes through `status`.
#[derive(Clone, Debug, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<GoalKind>,
    pub target_minor: Option<i64>,
    pub target_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub status: Option<GoalStatus>,
    pub priority: Option<GoalPriority>,
}

#[derive(Clone, Debug, Default)]
pub struct GoalFilter {
    pub status: Option<GoalStatus>,
    pub kind: Option<GoalKind>,
}

impl Engine {
    /// Goals of a user, newest first.
    pub async fn list_goals(&self, user_id: Uuid, filter: &GoalFilter) -> ResultEngine<Vec<Goal>> {
        let mut query = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id))
            .order_by_desc(goals::Column::CreatedAt);
        if let Some(status) = filter.status {
            query = query.filter(goals::Column::Status.eq(status.as_str()));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(goals::Column::Kind.eq(kind.as_str()));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Goal::try_from)
            .collect()
    }

    pub async fn goal(&self, user_id: Uuid, id: Uuid) -> ResultEngine<Goal> {
        Goal::try_from(self.owned_goal(user_id, id).await?)
    }

    pub async fn create_goal(&self, user_id: Uuid, draft: GoalDraft) -> ResultEngine<Goal> {
        let title = required_text(&draft.title, "title", None)?;
        let kind = draft
            .kind
            .ok_or_else(|| EngineError::Validation("type is required".to_string()))?;
        let target_minor = draft
            .target_minor
            .ok_or_else(|| EngineError::Validation("targetMinor is required".to_string()))?;
        let target_date = draft
            .target_date
            .ok_or_else(|| EngineError::Validation("targetDate is required".to_string()))?;

        let current_minor = non_negative(draft.current_minor.unwrap_or(0), "currentMinor")?;

        let now = Utc::now();
        let mut goal = Goal {
            id: Uuid::new_v4(),
            user_id,
            title,
            description: optional_text(draft.description.as_deref()),
            kind,
            target_minor: non_negative(target_minor, "targetMinor")?,
            current_minor: 0,
            target_date,
            category: optional_text(draft.category.as_deref()),
            status: GoalStatus::Active,
            priority: draft.priority.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        goal.record_progress(current_minor);
        goals::ActiveModel::from(&goal).insert(&self.database).await?;
        Ok(goal)
    }

    pub async fn update_goal(&self, user_id: Uuid, id: Uuid, patch: GoalPatch) -> ResultEngine<Goal> {
        let mut goal = Goal::try_from(self.owned_goal(user_id, id).await?)?;

        if let Some(title) = patch.title {
            goal.title = required_text(&title, "title", None)?;
        }
        if let Some(description) = patch.description {
            goal.description = optional_text(Some(&description));
        }
        if let Some(kind) = patch.kind {
            goal.kind = kind;
        }
        if let Some(target_minor) = patch.target_minor {
            goal.target_minor = non_negative(target_minor, "targetMinor")?;
        }
        if let Some(target_date) = patch.target_date {
            goal.target_date = target_date;
        }
        if let Some(category) = patch.category {
            goal.category = optional_text(Some(&category));
        }
        if let Some(status) = patch.status {
            goal.status = status;
        }
        if let Some(priority) = patch.priority {
            goal.priority = priority;
        }
        goal.updated_at = Utc::now();

        self.save_goal(&goal).await?;
        Ok(goal)
    }

    /// Sets the current amount of a goal. An active goal reaching its target is
    /// completed; a completed goal stays completed.
    pub async fn update_goal_progress(
        &self,
        user_id: Uuid,
        id: Uuid,
        amount_minor: i64,
    ) -> ResultEngine<Goal> {
        let amount_minor = non_negative(amount_minor, "amountMinor")?;
        let mut goal = Goal::try_from(self.owned_goal(user_id, id).await?)?;

        let before = goal.status;
        goal.record_progress(amount_minor);
        goal.updated_at = Utc::now();
        self.save_goal(&goal).await?;

        if before != goal.status {
            tracing::info!(goal_id = %goal.id, "goal completed");
        }
        Ok(goal)
    }

    pub async fn delete_goal(&self, user_id: Uuid, id: Uuid) -> ResultEngine<()> {
        let res = goals::Entity::delete_many()
            .filter(goals::Column::Id.eq(id))
            .filter(goals::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        if res.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("goal".to_string()));
        }
        Ok(())
    }

    pub async fn goal_stats(&self, user_id: Uuid) -> ResultEngine<GoalStats> {
        let goals = self.list_goals(user_id, &GoalFilter::default()).await?;
        Ok(GoalStats::from_goals(&goals))
    }

    async fn owned_goal(&self, user_id: Uuid, id: Uuid) -> ResultEngine<goals::Model> {
        goals::Entity::find_by_id(id)
            .filter(goals::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("goal".to_string()))
    }

    async fn save_goal(&self, goal: &Goal) -> ResultEngine<()> {
        let mut active = goals::ActiveModel::from(goal);
        active.created_at = ActiveValue::NotSet;
        active.update(&self.database).await?;
        Ok(())
    }
}
