//! Goals API endpoints

use api_types::{
    ApiResponse,
    goal::{
        GoalKind as ApiKind, GoalNew, GoalPriority as ApiPriority, GoalQuery, GoalStatsView,
        GoalStatus as ApiStatus, GoalUpdate, GoalView, ProgressUpdate,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    Goal, GoalDraft, GoalFilter, GoalKind, GoalPatch, GoalPriority, GoalStatus, User, parse_id,
};

use crate::{
    ServerError,
    dates::parse_optional_date,
    extract::{ApiJson, ApiQuery},
    server::ServerState,
};

fn map_kind(kind: GoalKind) -> ApiKind {
    match kind {
        GoalKind::Saving => ApiKind::Saving,
        GoalKind::Spending => ApiKind::Spending,
        GoalKind::Income => ApiKind::Income,
    }
}

fn engine_kind(kind: ApiKind) -> GoalKind {
    match kind {
        ApiKind::Saving => GoalKind::Saving,
        ApiKind::Spending => GoalKind::Spending,
        ApiKind::Income => GoalKind::Income,
    }
}

fn map_status(status: GoalStatus) -> ApiStatus {
    match status {
        GoalStatus::Active => ApiStatus::Active,
        GoalStatus::Completed => ApiStatus::Completed,
        GoalStatus::Paused => ApiStatus::Paused,
        GoalStatus::Cancelled => ApiStatus::Cancelled,
    }
}

fn engine_status(status: ApiStatus) -> GoalStatus {
    match status {
        ApiStatus::Active => GoalStatus::Active,
        ApiStatus::Completed => GoalStatus::Completed,
        ApiStatus::Paused => GoalStatus::Paused,
        ApiStatus::Cancelled => GoalStatus::Cancelled,
    }
}

fn map_priority(priority: GoalPriority) -> ApiPriority {
    match priority {
        GoalPriority::Low => ApiPriority::Low,
        GoalPriority::Medium => ApiPriority::Medium,
        GoalPriority::High => ApiPriority::High,
    }
}

fn engine_priority(priority: ApiPriority) -> GoalPriority {
    match priority {
        ApiPriority::Low => GoalPriority::Low,
        ApiPriority::Medium => GoalPriority::Medium,
        ApiPriority::High => GoalPriority::High,
    }
}

fn view(goal: Goal) -> GoalView {
    GoalView {
        progress: goal.progress(),
        days_remaining: goal.days_remaining(Utc::now()),
        id: goal.id,
        title: goal.title,
        description: goal.description,
        kind: map_kind(goal.kind),
        target_minor: goal.target_minor,
        current_minor: goal.current_minor,
        target_date: goal.target_date,
        category: goal.category,
        status: map_status(goal.status),
        priority: map_priority(goal.priority),
        created_at: goal.created_at,
        updated_at: goal.updated_at,
    }
}

/// Accepts only JSON integers. Range checks are left to the engine.
fn progress_amount(value: &serde_json::Value) -> Result<i64, ServerError> {
    value
        .as_i64()
        .ok_or_else(|| ServerError::Validation("amountMinor must be an integer".to_string()))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<GoalQuery>,
) -> Result<Json<ApiResponse<Vec<GoalView>>>, ServerError> {
    let filter = GoalFilter {
        status: query
            .status
            .as_deref()
            .and_then(|s| GoalStatus::try_from(s).ok()),
        kind: query
            .kind
            .as_deref()
            .and_then(|k| GoalKind::try_from(k).ok()),
    };
    let goals = state.engine.list_goals(user.id, &filter).await?;
    Ok(Json(ApiResponse::ok(goals.into_iter().map(view).collect())))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GoalView>>, ServerError> {
    let id = parse_id(&id, "goal")?;
    let goal = state.engine.goal(user.id, id).await?;
    Ok(Json(ApiResponse::ok(view(goal))))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<GoalNew>,
) -> Result<(StatusCode, Json<ApiResponse<GoalView>>), ServerError> {
    let draft = GoalDraft {
        title: payload.title,
        description: payload.description,
        kind: payload.kind.map(engine_kind),
        target_minor: payload.target_minor,
        current_minor: payload.current_minor,
        target_date: parse_optional_date(payload.target_date.as_deref(), "targetDate")?,
        category: payload.category,
        priority: payload.priority.map(engine_priority),
    };
    let goal = state.engine.create_goal(user.id, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(view(goal)).with_message("Goal created successfully")),
    ))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<GoalUpdate>,
) -> Result<Json<ApiResponse<GoalView>>, ServerError> {
    let id = parse_id(&id, "goal")?;
    let patch = GoalPatch {
        title: payload.title,
        description: payload.description,
        kind: payload.kind.map(engine_kind),
        target_minor: payload.target_minor,
        target_date: parse_optional_date(payload.target_date.as_deref(), "targetDate")?,
        category: payload.category,
        status: payload.status.map(engine_status),
        priority: payload.priority.map(engine_priority),
    };
    let goal = state.engine.update_goal(user.id, id, patch).await?;

    Ok(Json(
        ApiResponse::ok(view(goal)).with_message("Goal updated successfully"),
    ))
}

pub async fn progress(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ProgressUpdate>,
) -> Result<Json<ApiResponse<GoalView>>, ServerError> {
    let id = parse_id(&id, "goal")?;
    let amount_minor = progress_amount(&payload.amount_minor)?;
    let goal = state
        .engine
        .update_goal_progress(user.id, id, amount_minor)
        .await?;

    Ok(Json(
        ApiResponse::ok(view(goal)).with_message("Goal progress updated successfully"),
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    let id = parse_id(&id, "goal")?;
    state.engine.delete_goal(user.id, id).await?;
    Ok(Json(ApiResponse::message("Goal deleted successfully")))
}

pub async fn stats(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<ApiResponse<GoalStatsView>>, ServerError> {
    let stats = state.engine.goal_stats(user.id).await?;
    Ok(Json(ApiResponse::ok(GoalStatsView {
        total: stats.total,
        active: stats.active,
        completed: stats.completed,
        paused: stats.paused,
        cancelled: stats.cancelled,
        total_target_minor: stats.total_target_minor,
        total_current_minor: stats.total_current_minor,
        average_progress: stats.average_progress,
    })))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn progress_amount_accepts_only_integers() {
        assert_eq!(progress_amount(&json!(1500)).unwrap(), 1500);
        assert_eq!(progress_amount(&json!(-3)).unwrap(), -3);
        assert!(progress_amount(&json!("1500")).is_err());
        assert!(progress_amount(&json!(12.5)).is_err());
        assert!(progress_amount(&json!(null)).is_err());
    }
}
