//! Transactions API endpoints

use api_types::{
    ApiResponse, Pagination,
    transaction::{
        CategoryBreakdown, CategoryTotalView, StatsQuery, TransactionKind as ApiKind,
        TransactionNew, TransactionQuery, TransactionStatsView, TransactionUpdate,
        TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{
    CategoryTotal, Page, Transaction, TransactionDraft, TransactionFilter, TransactionKind,
    TransactionPatch, User, parse_id,
};

use crate::{
    ServerError,
    dates::parse_optional_date,
    extract::{ApiJson, ApiQuery},
    server::ServerState,
};

pub(crate) fn map_kind(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Income => ApiKind::Income,
        TransactionKind::Expense => ApiKind::Expense,
    }
}

pub(crate) fn engine_kind(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Income => TransactionKind::Income,
        ApiKind::Expense => TransactionKind::Expense,
    }
}

fn view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        amount_minor: tx.amount_minor,
        description: tx.description,
        category: tx.category,
        date: tx.occurred_at,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

fn total_view(total: CategoryTotal) -> CategoryTotalView {
    CategoryTotalView {
        category: total.category,
        total_minor: total.total_minor,
        count: total.count,
    }
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> Result<Json<ApiResponse<Vec<TransactionView>>>, ServerError> {
    let filter = TransactionFilter {
        kind: query
            .kind
            .as_deref()
            .and_then(|kind| TransactionKind::try_from(kind).ok()),
        category: query.category.filter(|c| !c.trim().is_empty()),
        from: parse_optional_date(query.start_date.as_deref(), "startDate")?,
        to: parse_optional_date(query.end_date.as_deref(), "endDate")?,
    };
    let page = Page::new(query.page, query.limit);

    let (txs, total) = state
        .engine
        .list_transactions(user.id, &filter, page)
        .await?;

    let pagination = Pagination {
        page: page.page,
        limit: page.limit,
        total,
        pages: page.pages(total),
    };
    Ok(Json(
        ApiResponse::ok(txs.into_iter().map(view).collect()).with_pagination(pagination),
    ))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TransactionView>>, ServerError> {
    let id = parse_id(&id, "transaction")?;
    let tx = state.engine.transaction(user.id, id).await?;
    Ok(Json(ApiResponse::ok(view(tx))))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiJson(payload): ApiJson<TransactionNew>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionView>>), ServerError> {
    let draft = TransactionDraft {
        kind: engine_kind(payload.kind),
        amount_minor: payload.amount_minor,
        description: payload.description,
        category: payload.category,
        occurred_at: parse_optional_date(payload.date.as_deref(), "date")?,
    };
    let tx = state.engine.create_transaction(user.id, draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(view(tx)).with_message("Transaction created successfully")),
    ))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<TransactionUpdate>,
) -> Result<Json<ApiResponse<TransactionView>>, ServerError> {
    let id = parse_id(&id, "transaction")?;
    let patch = TransactionPatch {
        kind: payload.kind.map(engine_kind),
        amount_minor: payload.amount_minor,
        description: payload.description,
        category: payload.category,
        occurred_at: parse_optional_date(payload.date.as_deref(), "date")?,
    };
    let tx = state.engine.update_transaction(user.id, id, patch).await?;

    Ok(Json(
        ApiResponse::ok(view(tx)).with_message("Transaction updated successfully"),
    ))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ServerError> {
    let id = parse_id(&id, "transaction")?;
    state.engine.delete_transaction(user.id, id).await?;
    Ok(Json(ApiResponse::message("Transaction deleted successfully")))
}

pub async fn stats(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<ApiResponse<TransactionStatsView>>, ServerError> {
    let from = parse_optional_date(query.start_date.as_deref(), "startDate")?;
    let to = parse_optional_date(query.end_date.as_deref(), "endDate")?;
    let stats = state.engine.transaction_stats(user.id, from, to).await?;

    Ok(Json(ApiResponse::ok(TransactionStatsView {
        income: stats.income_minor,
        expense: stats.expense_minor,
        balance: stats.balance_minor,
        category_breakdown: CategoryBreakdown {
            income: stats.income_categories.into_iter().map(total_view).collect(),
            expense: stats.expense_categories.into_iter().map(total_view).collect(),
        },
    })))
}
