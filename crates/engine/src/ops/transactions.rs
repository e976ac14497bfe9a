use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    CategoryTotal, EngineError, ResultEngine, Transaction, TransactionKind, TransactionStats,
    transactions::{self, DESCRIPTION_MAX_CHARS, validate_amount},
    util::required_text,
};

use super::{Engine, with_tx};

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive. A range with `from` after `to` simply
/// matches nothing.
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// One-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    /// Build a page request, defaulting and clamping out of range values.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Number of pages needed for `total` items.
    pub fn pages(self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// Fields accepted when recording a transaction.
#[derive(Clone, Debug)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub description: String,
    pub category: String,
    /// Defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Partial update of a transaction. `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub amount_minor: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, user_id: Uuid, filter: &TransactionFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, user_id: Uuid, filter: &TransactionFilter) -> Self {
        self = self.filter(transactions::Column::UserId.eq(user_id));
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category) = &filter.category {
            self = self.filter(transactions::Column::Category.eq(category.clone()));
        }
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::OccurredAt.lte(to));
        }
        self
    }
}

#[derive(Debug, FromQueryResult)]
struct KindTotalRow {
    kind: String,
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct CategoryTotalRow {
    kind: String,
    category: String,
    total: i64,
    count: i64,
}

impl Engine {
    /// Lists a page of transactions, newest first, and the total number of
    /// matches.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: Page,
    ) -> ResultEngine<(Vec<Transaction>, u64)> {
        let query = transactions::Entity::find().apply_tx_filters(user_id, filter);

        let total = query.clone().count(&self.database).await?;
        let items = query
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok((items, total))
    }

    pub async fn transaction(&self, user_id: Uuid, id: Uuid) -> ResultEngine<Transaction> {
        let model = self.owned_transaction(&self.database, user_id, id).await?;
        Transaction::try_from(model)
    }

    /// Records a transaction. An expense also bumps the running total of every
    /// active budget it falls into, in the same DB transaction.
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        draft: TransactionDraft,
    ) -> ResultEngine<Transaction> {
        let now = Utc::now();
        let tx = Transaction::new(
            user_id,
            draft.kind,
            draft.amount_minor,
            required_text(&draft.description, "description", Some(DESCRIPTION_MAX_CHARS))?,
            required_text(&draft.category, "category", None)?,
            draft.occurred_at.unwrap_or(now),
            now,
        )?;

        with_tx!(self, |db_tx| {
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            self.apply_expense_to_budgets(&db_tx, &tx).await?;
            Ok::<_, EngineError>(tx)
        })
    }

    /// Applies a partial update. Budgets are left untouched.
    pub async fn update_transaction(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        let model = self.owned_transaction(&self.database, user_id, id).await?;
        let mut tx = Transaction::try_from(model)?;

        if let Some(kind) = patch.kind {
            tx.kind = kind;
        }
        if let Some(amount_minor) = patch.amount_minor {
            validate_amount(amount_minor)?;
            tx.amount_minor = amount_minor;
        }
        if let Some(description) = patch.description {
            tx.description =
                required_text(&description, "description", Some(DESCRIPTION_MAX_CHARS))?;
        }
        if let Some(category) = patch.category {
            tx.category = required_text(&category, "category", None)?;
        }
        if let Some(occurred_at) = patch.occurred_at {
            tx.occurred_at = occurred_at;
        }
        tx.updated_at = Utc::now();

        let mut active = transactions::ActiveModel::from(&tx);
        active.created_at = ActiveValue::NotSet;
        active.update(&self.database).await?;
        Ok(tx)
    }

    pub async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> ResultEngine<()> {
        let res = transactions::Entity::delete_many()
            .filter(transactions::Column::Id.eq(id))
            .filter(transactions::Column::UserId.eq(user_id))
            .exec(&self.database)
            .await?;
        if res.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("transaction".to_string()));
        }
        Ok(())
    }

    /// Income, expense and balance totals plus a per-category breakdown over an
    /// optional inclusive date range.
    pub async fn transaction_stats(
        &self,
        user_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<TransactionStats> {
        let filter = TransactionFilter {
            from,
            to,
            ..Default::default()
        };

        let kind_rows = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Kind)
            .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
            .apply_tx_filters(user_id, &filter)
            .group_by(transactions::Column::Kind)
            .into_model::<KindTotalRow>()
            .all(&self.database)
            .await?;

        let category_rows = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::Kind)
            .column(transactions::Column::Category)
            .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
            .column_as(Expr::col(transactions::Column::Id).count(), "count")
            .apply_tx_filters(user_id, &filter)
            .group_by(transactions::Column::Kind)
            .group_by(transactions::Column::Category)
            .into_model::<CategoryTotalRow>()
            .all(&self.database)
            .await?;

        let kind_totals = kind_rows
            .into_iter()
            .map(|row| Ok((TransactionKind::try_from(row.kind.as_str())?, row.total)))
            .collect::<ResultEngine<Vec<_>>>()?;
        let category_totals = category_rows
            .into_iter()
            .map(|row| {
                Ok((
                    TransactionKind::try_from(row.kind.as_str())?,
                    CategoryTotal {
                        category: row.category,
                        total_minor: row.total,
                        count: u64::try_from(row.count).unwrap_or_default(),
                    },
                ))
            })
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(TransactionStats::from_groups(kind_totals, category_totals))
    }

    async fn owned_transaction<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(id)
            .filter(transactions::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(Page::new(None, None), Page::default());
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(Some(3), Some(1_000)).limit, MAX_PAGE_LIMIT);
        assert_eq!(Page::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn pages_round_up() {
        let page = Page::new(None, Some(10));
        assert_eq!(page.pages(0), 0);
        assert_eq!(page.pages(10), 1);
        assert_eq!(page.pages(11), 2);
    }
}
