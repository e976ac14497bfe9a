use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DB_PATH: &str = "fintrack.db";
/// Same variable the server reads for its sqlite file.
const SERVER_DB_ENV: &str = "FINTRACK__SERVER__DATABASE__SQLITE";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Up,
    Down,
    Fresh,
    Status,
}

impl Command {
    fn parse(arg: Option<&str>) -> Option<Self> {
        match arg.unwrap_or("up") {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "fresh" => Some(Self::Fresh),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// `DATABASE_URL` wins, then the server's sqlite path, then `fintrack.db`.
fn database_url(database_url: Option<String>, server_path: Option<String>) -> String {
    database_url.unwrap_or_else(|| {
        let path = server_path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        format!("sqlite:{path}?mode=rwc")
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let arg = std::env::args().nth(1);
    let Some(command) = Command::parse(arg.as_deref()) else {
        eprintln!("Usage: migration [up|down|fresh|status]");
        std::process::exit(2);
    };

    let url = database_url(
        std::env::var("DATABASE_URL").ok(),
        std::env::var(SERVER_DB_ENV).ok(),
    );
    let db = Database::connect(&url).await?;

    match command {
        Command::Up => migration::Migrator::up(&db, None).await?,
        Command::Down => migration::Migrator::down(&db, None).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    db.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_defaults_to_up() {
        assert_eq!(Command::parse(None), Some(Command::Up));
        assert_eq!(Command::parse(Some("fresh")), Some(Command::Fresh));
        assert_eq!(Command::parse(Some("sideways")), None);
    }

    #[test]
    fn database_url_prefers_explicit_url() {
        assert_eq!(
            database_url(Some("sqlite::memory:".to_string()), Some("x.db".to_string())),
            "sqlite::memory:"
        );
        assert_eq!(
            database_url(None, Some("/var/lib/fintrack.db".to_string())),
            "sqlite:/var/lib/fintrack.db?mode=rwc"
        );
        assert_eq!(database_url(None, None), "sqlite:fintrack.db?mode=rwc");
    }
}
