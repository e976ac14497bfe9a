//! Record store and domain logic of the finance tracker.
//!
//! [`Engine`] owns the database connection and exposes owner-scoped
//! operations over transactions, budgets, goals and categories. Derived
//! metrics and statistics are pure functions over the domain types.

pub use budgets::{Budget, BudgetNotifications, BudgetPeriod, BudgetStatus};
pub use categories::Category;
pub use error::EngineError;
pub use goals::{Goal, GoalKind, GoalPriority, GoalStatus};
pub use ops::{
    BudgetDraft, BudgetFilter, BudgetPatch, CategoryDraft, Engine, EngineBuilder, GoalDraft,
    GoalFilter, GoalPatch, Page, TransactionDraft, TransactionFilter, TransactionPatch,
};
pub use stats::{BudgetStats, CategoryTotal, GoalStats, TransactionStats};
pub use transactions::{Transaction, TransactionKind};
pub use users::{ExternalProfile, User, UserRole};
pub use util::{MAX_AMOUNT_MINOR, parse_id};

mod budgets;
mod categories;
mod error;
mod goals;
mod ops;
mod stats;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
