//! Statistics rollups.
//!
//! Everything here is recomputed on each call from records already loaded or
//! grouped by the database. Averages over an empty set are `0.0`.

use serde::{Deserialize, Serialize};

use crate::{Budget, BudgetStatus, Goal, GoalStatus, TransactionKind};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetStats {
    pub total: u64,
    pub active: u64,
    pub exceeded: u64,
    pub inactive: u64,
    pub total_limit_minor: i64,
    pub total_spent_minor: i64,
    pub average_usage: f64,
    pub in_alert: u64,
}

impl BudgetStats {
    pub fn from_budgets(budgets: &[Budget]) -> Self {
        let mut stats = Self::default();
        let mut usage_sum = 0.0;
        for budget in budgets {
            stats.total += 1;
            match budget.status {
                BudgetStatus::Active => stats.active += 1,
                BudgetStatus::Exceeded => stats.exceeded += 1,
                BudgetStatus::Inactive => stats.inactive += 1,
            }
            stats.total_limit_minor = stats.total_limit_minor.saturating_add(budget.limit_minor);
            stats.total_spent_minor = stats.total_spent_minor.saturating_add(budget.spent_minor);
            usage_sum += budget.usage_percentage();
            if budget.is_in_alert() {
                stats.in_alert += 1;
            }
        }
        stats.average_usage = average(usage_sum, stats.total);
        stats
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalStats {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub paused: u64,
    pub cancelled: u64,
    pub total_target_minor: i64,
    pub total_current_minor: i64,
    pub average_progress: f64,
}

impl GoalStats {
    pub fn from_goals(goals: &[Goal]) -> Self {
        let mut stats = Self::default();
        let mut progress_sum = 0.0;
        for goal in goals {
            stats.total += 1;
            match goal.status {
                GoalStatus::Active => stats.active += 1,
                GoalStatus::Completed => stats.completed += 1,
                GoalStatus::Paused => stats.paused += 1,
                GoalStatus::Cancelled => stats.cancelled += 1,
            }
            stats.total_target_minor = stats.total_target_minor.saturating_add(goal.target_minor);
            stats.total_current_minor = stats.total_current_minor.saturating_add(goal.current_minor);
            progress_sum += goal.progress();
        }
        stats.average_progress = average(progress_sum, stats.total);
        stats
    }
}

/// Per-category total inside one transaction kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_minor: i64,
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStats {
    pub income_minor: i64,
    pub expense_minor: i64,
    pub balance_minor: i64,
    pub income_categories: Vec<CategoryTotal>,
    pub expense_categories: Vec<CategoryTotal>,
}

impl TransactionStats {
    /// Assemble the rollup from rows grouped by kind and by (kind, category).
    pub fn from_groups(
        kind_totals: impl IntoIterator<Item = (TransactionKind, i64)>,
        category_totals: impl IntoIterator<Item = (TransactionKind, CategoryTotal)>,
    ) -> Self {
        let mut stats = Self::default();
        for (kind, total) in kind_totals {
            match kind {
                TransactionKind::Income => {
                    stats.income_minor = stats.income_minor.saturating_add(total)
                }
                TransactionKind::Expense => {
                    stats.expense_minor = stats.expense_minor.saturating_add(total)
                }
            }
        }
        stats.balance_minor = stats.income_minor.saturating_sub(stats.expense_minor);

        for (kind, entry) in category_totals {
            match kind {
                TransactionKind::Income => stats.income_categories.push(entry),
                TransactionKind::Expense => stats.expense_categories.push(entry),
            }
        }
        for list in [&mut stats.income_categories, &mut stats.expense_categories] {
            list.sort_by(|a, b| {
                b.total_minor
                    .cmp(&a.total_minor)
                    .then_with(|| a.category.cmp(&b.category))
            });
        }
        stats
    }
}

fn average(sum: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}
