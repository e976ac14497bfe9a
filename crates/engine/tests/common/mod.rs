#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::Database;
use uuid::Uuid;

use engine::{Engine, ExternalProfile, Transaction, TransactionDraft, TransactionKind};
use migration::MigratorTrait;

pub async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

pub async fn user(engine: &Engine, name: &str) -> Uuid {
    engine
        .sign_in_external(ExternalProfile {
            external_id: format!("google-{name}"),
            name: name.to_string(),
            email: format!("{name}@example.com"),
        })
        .await
        .unwrap()
        .id
}

pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub async fn record(
    engine: &Engine,
    user_id: Uuid,
    kind: TransactionKind,
    category: &str,
    amount_minor: i64,
    at: DateTime<Utc>,
) -> Transaction {
    engine
        .create_transaction(
            user_id,
            TransactionDraft {
                kind,
                amount_minor,
                description: format!("{category} {amount_minor}"),
                category: category.to_string(),
                occurred_at: Some(at),
            },
        )
        .await
        .unwrap()
}

pub async fn expense(
    engine: &Engine,
    user_id: Uuid,
    category: &str,
    amount_minor: i64,
    at: DateTime<Utc>,
) -> Transaction {
    record(engine, user_id, TransactionKind::Expense, category, amount_minor, at).await
}
