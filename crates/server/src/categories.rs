//! Categories API endpoints

use api_types::{
    ApiResponse,
    category::{CategoryNew, CategoryQuery, CategoryView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Category, CategoryDraft, TransactionKind, User, parse_id};

use crate::{
    ServerError,
    extract::{ApiJson, ApiQuery},
    server::ServerState,
    transactions::{engine_kind, map_kind},
};

fn view(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: map_kind(category.kind),
        color: category.color,
        icon: category.icon,
        is_default: category.is_default,
        created_at: category.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryView>>>, ServerError> {
    let kind = query
        .kind
        .as_deref()
        .and_then(|k| TransactionKind::try_from(k).ok());
    let categories = state.engine.list_categories(user.id, kind).await?;
    Ok(Json(ApiResponse::ok(
        categories.into_iter().map(view).collect(),
    )))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<CategoryNew>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryView>>), ServerError> {
    let draft = CategoryDraft {
        name: payload.name,
        kind: engine_kind(payload.kind),
        color: payload.color,
        icon: payload.icon,
    };
    let category = state.engine.create_category(user.id, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(view(category)).with_message("Category created successfully")),
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    let id = parse_id(&id, "category")?;
    state.engine.delete_category(user.id, id).await?;
    Ok(Json(ApiResponse::message("Category deleted successfully")))
}
