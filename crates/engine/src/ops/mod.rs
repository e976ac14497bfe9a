use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod budgets;
mod categories;
mod goals;
mod transactions;
mod users;

pub use budgets::{BudgetDraft, BudgetFilter, BudgetPatch};
pub use categories::CategoryDraft;
pub use goals::{GoalDraft, GoalFilter, GoalPatch};
pub use transactions::{Page, TransactionDraft, TransactionFilter, TransactionPatch};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Owner-scoped operations over the record store.
///
/// Every method takes the caller's user id and only ever sees that user's
/// records; someone else's record is reported as missing.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`, checking the connection is usable.
    pub async fn build(self) -> ResultEngine<Engine> {
        self.database.ping().await?;
        Ok(Engine {
            database: self.database,
        })
    }
}
