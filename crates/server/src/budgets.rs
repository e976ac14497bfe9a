//! Budgets API endpoints

use api_types::{
    ApiResponse,
    budget::{
        BudgetNew, BudgetPeriod as ApiPeriod, BudgetQuery, BudgetStatsView,
        BudgetStatus as ApiStatus, BudgetUpdate, BudgetView, Notifications,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    Budget, BudgetDraft, BudgetFilter, BudgetNotifications, BudgetPatch, BudgetPeriod,
    BudgetStatus, User, parse_id,
};

use crate::{
    ServerError,
    dates::parse_optional_date,
    extract::{ApiJson, ApiQuery},
    server::ServerState,
};

fn map_period(period: BudgetPeriod) -> ApiPeriod {
    match period {
        BudgetPeriod::Daily => ApiPeriod::Daily,
        BudgetPeriod::Weekly => ApiPeriod::Weekly,
        BudgetPeriod::Monthly => ApiPeriod::Monthly,
        BudgetPeriod::Yearly => ApiPeriod::Yearly,
    }
}

fn engine_period(period: ApiPeriod) -> BudgetPeriod {
    match period {
        ApiPeriod::Daily => BudgetPeriod::Daily,
        ApiPeriod::Weekly => BudgetPeriod::Weekly,
        ApiPeriod::Monthly => BudgetPeriod::Monthly,
        ApiPeriod::Yearly => BudgetPeriod::Yearly,
    }
}

fn map_status(status: BudgetStatus) -> ApiStatus {
    match status {
        BudgetStatus::Active => ApiStatus::Active,
        BudgetStatus::Inactive => ApiStatus::Inactive,
        BudgetStatus::Exceeded => ApiStatus::Exceeded,
    }
}

fn engine_status(status: ApiStatus) -> BudgetStatus {
    match status {
        ApiStatus::Active => BudgetStatus::Active,
        ApiStatus::Inactive => BudgetStatus::Inactive,
        ApiStatus::Exceeded => BudgetStatus::Exceeded,
    }
}

fn engine_notifications(n: Notifications) -> BudgetNotifications {
    BudgetNotifications {
        email: n.email,
        push: n.push,
    }
}

fn view(budget: Budget) -> BudgetView {
    let now = Utc::now();
    BudgetView {
        usage_percentage: budget.usage_percentage(),
        remaining_minor: budget.remaining_minor(),
        is_in_alert: budget.is_in_alert(),
        is_exceeded: budget.is_exceeded(),
        days_remaining: budget.days_remaining(now),
        id: budget.id,
        name: budget.name,
        description: budget.description,
        category: budget.category,
        limit_minor: budget.limit_minor,
        spent_minor: budget.spent_minor,
        period: map_period(budget.period),
        start_date: budget.start_date,
        end_date: budget.end_date,
        status: map_status(budget.status),
        alert_threshold: budget.alert_threshold,
        notifications: Notifications {
            email: budget.notifications.email,
            push: budget.notifications.push,
        },
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<BudgetQuery>,
) -> Result<Json<ApiResponse<Vec<BudgetView>>>, ServerError> {
    let filter = BudgetFilter {
        status: query
            .status
            .as_deref()
            .and_then(|s| BudgetStatus::try_from(s).ok()),
        category: query.category.filter(|c| !c.trim().is_empty()),
        period: query
            .period
            .as_deref()
            .and_then(|p| BudgetPeriod::try_from(p).ok()),
    };
    let budgets = state.engine.list_budgets(user.id, &filter).await?;
    Ok(Json(ApiResponse::ok(budgets.into_iter().map(view).collect())))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BudgetView>>, ServerError> {
    let id = parse_id(&id, "budget")?;
    let budget = state.engine.budget(user.id, id).await?;
    Ok(Json(ApiResponse::ok(view(budget))))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<BudgetNew>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetView>>), ServerError> {
    let draft = BudgetDraft {
        name: payload.name,
        description: payload.description,
        category: payload.category,
        limit_minor: payload.limit_minor,
        period: payload.period.map(engine_period),
        start_date: parse_optional_date(payload.start_date.as_deref(), "startDate")?,
        end_date: parse_optional_date(payload.end_date.as_deref(), "endDate")?,
        alert_threshold: payload.alert_threshold,
        notifications: payload.notifications.map(engine_notifications),
    };
    let budget = state.engine.create_budget(user.id, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(view(budget)).with_message("Budget created successfully")),
    ))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<BudgetUpdate>,
) -> Result<Json<ApiResponse<BudgetView>>, ServerError> {
    let id = parse_id(&id, "budget")?;
    let patch = BudgetPatch {
        name: payload.name,
        description: payload.description,
        category: payload.category,
        limit_minor: payload.limit_minor,
        period: payload.period.map(engine_period),
        start_date: parse_optional_date(payload.start_date.as_deref(), "startDate")?,
        end_date: parse_optional_date(payload.end_date.as_deref(), "endDate")?,
        status: payload.status.map(engine_status),
        alert_threshold: payload.alert_threshold,
        notifications: payload.notifications.map(engine_notifications),
    };
    let budget = state.engine.update_budget(user.id, id, patch).await?;

    Ok(Json(
        ApiResponse::ok(view(budget)).with_message("Budget updated successfully"),
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    let id = parse_id(&id, "budget")?;
    state.engine.delete_budget(user.id, id).await?;
    Ok(Json(ApiResponse::message("Budget deleted successfully")))
}

pub async fn recalculate(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BudgetView>>, ServerError> {
    let id = parse_id(&id, "budget")?;
    let budget = state.engine.recalculate_budget(user.id, id).await?;
    Ok(Json(
        ApiResponse::ok(view(budget)).with_message("Budget recalculated successfully"),
    ))
}

pub async fn stats(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<ApiResponse<BudgetStatsView>>, ServerError> {
    let stats = state.engine.budget_stats(user.id).await?;
    Ok(Json(ApiResponse::ok(BudgetStatsView {
        total: stats.total,
        active: stats.active,
        exceeded: stats.exceeded,
        inactive: stats.inactive,
        total_limit_minor: stats.total_limit_minor,
        total_spent_minor: stats.total_spent_minor,
        average_usage: stats.average_usage,
        in_alert: stats.in_alert,
    })))
}
