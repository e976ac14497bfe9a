use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Budget, BudgetNotifications, BudgetPeriod, BudgetStats, BudgetStatus, EngineError,
    ResultEngine, Transaction, TransactionKind,
    budgets::{self, DEFAULT_ALERT_THRESHOLD, validate_alert_threshold},
    transactions,
    util::{non_negative, optional_text, required_text},
};

use super::Engine;

/// Fields accepted when creating a budget. Missing required values are
/// reported as validation errors naming the field.
#[derive(Clone, Debug, Default)]
pub struct BudgetDraft {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub limit_minor: Option<i64>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub alert_threshold: Option<f64>,
    pub notifications: Option<BudgetNotifications>,
}

/// Partial update of a budget. `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct BudgetPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub limit_minor: Option<i64>,
    pub period: Option<BudgetPeriod>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<BudgetStatus>,
    pub alert_threshold: Option<f64>,
    pub notifications: Option<BudgetNotifications>,
}

#[derive(Clone, Debug, Default)]
pub struct BudgetFilter {
    pub status: Option<BudgetStatus>,
    pub category: Option<String>,
    pub period: Option<BudgetPeriod>,
}

fn required<T>(value: Option<T>, field: &str) -> ResultEngine<T> {
    value.ok_or_else(|| EngineError::Validation(format!("{field} is required")))
}

impl Engine {
    /// Budgets of a user, newest first.
    pub async fn list_budgets(
        &self,
        user_id: Uuid,
        filter: &BudgetFilter,
    ) -> ResultEngine<Vec<Budget>> {
        let mut query = budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .order_by_desc(budgets::Column::CreatedAt);
        if let Some(status) = filter.status {
            query = query.filter(budgets::Column::Status.eq(status.as_str()));
        }
        if let Some(category) = &filter.category {
            query = query.filter(budgets::Column::Category.eq(category.clone()));
        }
        if let Some(period) = filter.period {
            query = query.filter(budgets::Column::Period.eq(period.as_str()));
        }

        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Budget::try_from)
            .collect()
    }

    pub async fn budget(&self, user_id: Uuid, id: Uuid) -> ResultEngine<Budget> {
        let model = self.owned_budget(user_id, id).await?;
        Budget::try_from(model)
    }

    pub async fn create_budget(&self, user_id: Uuid, draft: BudgetDraft) -> ResultEngine<Budget> {
        let name = required_text(&draft.name, "name", None)?;
        let category = required_text(&draft.category, "category", None)?;
        let limit_minor = non_negative(required(draft.limit_minor, "limitMinor")?, "limitMinor")?;
        let start_date = required(draft.start_date, "startDate")?;
        let end_date = required(draft.end_date, "endDate")?;
        let alert_threshold =
            validate_alert_threshold(draft.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD))?;

        let now = Utc::now();
        let budget = Budget {
            id: Uuid::new_v4(),
            user_id,
            name,
            description: optional_text(draft.description.as_deref()),
            category,
            limit_minor,
            spent_minor: 0,
            period: draft.period.unwrap_or_default(),
            start_date,
            end_date,
            status: BudgetStatus::Active,
            alert_threshold,
            notifications: draft.notifications.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        budgets::ActiveModel::from(&budget)
            .insert(&self.database)
            .await?;
        Ok(budget)
    }

    /// Applies a partial update. The running total is left as is.
    pub async fn update_budget(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: BudgetPatch,
    ) -> ResultEngine<Budget> {
        let mut budget = Budget::try_from(self.owned_budget(user_id, id).await?)?;

        if let Some(name) = patch.name {
            budget.name = required_text(&name, "name", None)?;
        }
        if let Some(description) = patch.description {
            budget.description = optional_text(Some(&description));
        }
        if let Some(category) = patch.category {
            budget.category = required_text(&category, "category", None)?;
        }
        if let Some(limit_minor) = patch.limit_minor {
            budget.limit_minor = non_negative(limit_minor, "limitMinor")?;
        }
        if let Some(period) = patch.period {
            budget.period = period;
        }
        if let Some(start_date) = patch.start_date {
            budget.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            budget.end_date = end_date;
        }
        if let Some(status) = patch.status {
            budget.status = status;
        }
        if let Some(alert_threshold) = patch.alert_threshold {
            budget.alert_threshold = validate_alert_threshold(alert_threshold)?;
        }
        if let Some(notifications) = patch.notifications {
            budget.notifications = notifications;
        }
        budget.updated_at = Utc::now();

        let mut active = budgets::ActiveModel::from(&budget);
        active.created_at = ActiveValue::NotSet;
        active.update(&self.database).await?;
        Ok(budget)
    }

    /// Deletes a budget. Transactions are not affected.
    pub async fn delete_budget(&self, user_id: Uuid, id: Uuid) -> ResultEngine<()> {
        let res = budgets::Entity::delete_many()
            .filter(budgets::Column::Id.eq(id))
            .filter(budgets::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        if res.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("budget".to_string()));
        }
        Ok(())
    }

    /// Adds a freshly recorded expense to the running total of every active
    /// budget of the owner with the same category whose window contains the
    /// expense date. Budgets pushed over their limit become `exceeded`.
    ///
    /// Nothing here moves a budget back to `active`; only
    /// [`Engine::recalculate_budget`] does.
    pub(crate) async fn apply_expense_to_budgets<C: ConnectionTrait>(
        &self,
        conn: &C,
        tx: &Transaction,
    ) -> ResultEngine<u64> {
        if tx.kind != TransactionKind::Expense {
            return Ok(0);
        }

        let matching = Condition::all()
            .add(budgets::Column::UserId.eq(tx.user_id))
            .add(budgets::Column::Category.eq(tx.category.clone()))
            .add(budgets::Column::Status.eq(BudgetStatus::Active.as_str()))
            .add(budgets::Column::StartDate.lte(tx.occurred_at))
            .add(budgets::Column::EndDate.gte(tx.occurred_at));

        let bumped = budgets::Entity::update_many()
            .col_expr(
                budgets::Column::SpentMinor,
                Expr::col(budgets::Column::SpentMinor).add(tx.amount_minor),
            )
            .col_expr(budgets::Column::UpdatedAt, Expr::value(tx.created_at))
            .filter(matching.clone())
            .exec(conn)
            .await?
            .rows_affected;
        if bumped == 0 {
            return Ok(0);
        }

        let exceeded = budgets::Entity::update_many()
            .col_expr(
                budgets::Column::Status,
                Expr::value(BudgetStatus::Exceeded.as_str()),
            )
            .filter(matching)
            .filter(Expr::col(budgets::Column::SpentMinor).gt(Expr::col(budgets::Column::LimitMinor)))
            .exec(conn)
            .await?
            .rows_affected;

        tracing::debug!(
            user_id = %tx.user_id,
            category = %tx.category,
            amount_minor = tx.amount_minor,
            bumped,
            exceeded,
            "applied expense to budgets"
        );
        Ok(bumped)
    }

    /// Rebuilds `spent_minor` from the stored expenses inside the budget window
    /// and resets the status from the result.
    pub async fn recalculate_budget(&self, user_id: Uuid, id: Uuid) -> ResultEngine<Budget> {
        let mut budget = Budget::try_from(self.owned_budget(user_id, id).await?)?;

        let spent_minor = transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::Kind.eq(TransactionKind::Expense.as_str()))
            .filter(transactions::Column::Category.eq(budget.category.clone()))
            .filter(transactions::Column::OccurredAt.gte(budget.start_date))
            .filter(transactions::Column::OccurredAt.lte(budget.end_date))
            .into_tuple::<Option<i64>>()
            .one(&self.database)
            .await?
            .flatten()
            .unwrap_or(0);

        budget.spent_minor = spent_minor;
        budget.status = BudgetStatus::recalculated(spent_minor, budget.limit_minor);
        budget.updated_at = Utc::now();

        budgets::ActiveModel {
            id: ActiveValue::Unchanged(budget.id),
            spent_minor: ActiveValue::Set(budget.spent_minor),
            status: ActiveValue::Set(budget.status.as_str().to_string()),
            updated_at: ActiveValue::Set(budget.updated_at),
            ..Default::default()
        }
        .update(&self.database)
        .await?;

        tracing::debug!(budget_id = %budget.id, spent_minor, status = budget.status.as_str(), "recalculated budget");
        Ok(budget)
    }

    pub async fn budget_stats(&self, user_id: Uuid) -> ResultEngine<BudgetStats> {
        let budgets = self.list_budgets(user_id, &BudgetFilter::default()).await?;
        Ok(BudgetStats::from_budgets(&budgets))
    }

    async fn owned_budget(&self, user_id: Uuid, id: Uuid) -> ResultEngine<budgets::Model> {
        budgets::Entity::find_by_id(id)
            .filter(budgets::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget".to_string()))
    }
}
