use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every JSON response.
///
/// Failures carry `success: false` and a `message`; empty fields are omitted.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<()> {
    /// Successful response without data.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            pagination: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            pagination: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    /// `ceil(total / limit)`.
    pub pages: u64,
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub timestamp: DateTime<Utc>,
    }
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum UserRole {
        User,
        Admin,
    }

    /// User as exposed to the client, also embedded in the login redirect.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub name: String,
        pub email: String,
        pub role: UserRole,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: Uuid,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub description: String,
        pub category: String,
        pub date: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount_minor: i64,
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub category: String,
        /// RFC3339 timestamp or `YYYY-MM-DD`. Defaults to now.
        pub date: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionUpdate {
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub amount_minor: Option<i64>,
        pub description: Option<String>,
        pub category: Option<String>,
        pub date: Option<String>,
    }

    /// Query string of `GET /transactions`. Unknown `type` values are ignored.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionQuery {
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub category: Option<String>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StatsQuery {
        pub start_date: Option<String>,
        pub end_date: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryTotalView {
        pub category: String,
        pub total_minor: i64,
        pub count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryBreakdown {
        pub income: Vec<CategoryTotalView>,
        pub expense: Vec<CategoryTotalView>,
    }

    /// Totals in minor units.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionStatsView {
        pub income: i64,
        pub expense: i64,
        pub balance: i64,
        pub category_breakdown: CategoryBreakdown,
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BudgetPeriod {
        Daily,
        Weekly,
        Monthly,
        Yearly,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BudgetStatus {
        Active,
        Inactive,
        Exceeded,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Notifications {
        pub email: bool,
        pub push: bool,
    }

    /// Stored budget plus the metrics derived from it at read time.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetView {
        pub id: Uuid,
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
        pub notifications: Notifications,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub usage_percentage: f64,
        pub remaining_minor: i64,
        pub is_in_alert: bool,
        pub is_exceeded: bool,
        pub days_remaining: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetNew {
        #[serde(default)]
        pub name: String,
        pub description: Option<String>,
        #[serde(default)]
        pub category: String,
        pub limit_minor: Option<i64>,
        pub period: Option<BudgetPeriod>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub alert_threshold: Option<f64>,
        pub notifications: Option<Notifications>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub category: Option<String>,
        pub limit_minor: Option<i64>,
        pub period: Option<BudgetPeriod>,
        pub start_date: Option<String>,
        pub end_date: Option<String>,
        pub status: Option<BudgetStatus>,
        pub alert_threshold: Option<f64>,
        pub notifications: Option<Notifications>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetQuery {
        pub status: Option<String>,
        pub category: Option<String>,
        pub period: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetStatsView {
        pub total: u64,
        pub active: u64,
        pub exceeded: u64,
        pub inactive: u64,
        pub total_limit_minor: i64,
        pub total_spent_minor: i64,
        pub average_usage: f64,
        pub in_alert: u64,
    }
}

pub mod goal {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GoalKind {
        Saving,
        Spending,
        Income,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GoalStatus {
        Active,
        Completed,
        Paused,
        Cancelled,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum GoalPriority {
        Low,
        Medium,
        High,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalView {
        pub id: Uuid,
        pub title: String,
        pub description: Option<String>,
        #[serde(rename = "type")]
        pub kind: GoalKind,
        pub target_minor: i64,
        pub current_minor: i64,
        pub target_date: DateTime<Utc>,
        pub category: Option<String>,
        pub status: GoalStatus,
        pub priority: GoalPriority,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub progress: f64,
        /// Negative once the target date has passed.
        pub days_remaining: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalNew {
        #[serde(default)]
        pub title: String,
        pub description: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<GoalKind>,
        pub target_minor: Option<i64>,
        pub current_minor: Option<i64>,
        pub target_date: Option<String>,
        pub category: Option<String>,
        pub priority: Option<GoalPriority>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalUpdate {
        pub title: Option<String>,
        pub description: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<GoalKind>,
        pub target_minor: Option<i64>,
        pub target_date: Option<String>,
        pub category: Option<String>,
        pub status: Option<GoalStatus>,
        pub priority: Option<GoalPriority>,
    }

    /// Body of `PUT /goals/{id}/progress`.
    ///
    /// Kept as a raw JSON value so that strings, fractions and missing values
    /// are reported with a single validation message.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProgressUpdate {
        #[serde(default)]
        pub amount_minor: serde_json::Value,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GoalQuery {
        pub status: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalStatsView {
        pub total: u64,
        pub active: u64,
        pub completed: u64,
        pub paused: u64,
        pub cancelled: u64,
        pub total_target_minor: i64,
        pub total_current_minor: i64,
        pub average_progress: f64,
    }
}

pub mod category {
    use super::*;
    use crate::transaction::TransactionKind;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub color: String,
        pub icon: String,
        pub is_default: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        #[serde(default)]
        pub name: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub color: Option<String>,
        pub icon: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryQuery {
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }
}
