use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use server::{GoogleProvider, ServerState, TokenKeys};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "fintrack={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    if settings.auth.jwt_secret.trim().is_empty() {
        return Err("auth.jwt_secret must not be empty".into());
    }

    let db = parse_database(&settings.server.database).await?;
    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await?;

    let state = ServerState {
        engine: Arc::new(engine),
        tokens: Arc::new(TokenKeys::new(
            settings.auth.jwt_secret.as_bytes(),
            chrono::Duration::days(settings.auth.token_ttl_days),
        )),
        identity: Arc::new(GoogleProvider::new(settings.google)),
        client_url: settings.server.client_url,
        secure_cookies: settings.auth.secure_cookies,
    };

    let addr = format!("{}:{}", settings.server.bind, settings.server.port);
    let served = server::run(state, &addr).await;

    tracing::info!("closing database");
    db.close().await?;
    served?;
    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
