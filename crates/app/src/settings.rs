//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and from `FINTRACK__*` environment variables,
//! e.g. `FINTRACK__AUTH__JWT_SECRET`.
//!
//! See `settings.toml.example` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use server::GoogleConfig;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
    pub client_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub auth: Auth,
    pub google: GoogleConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.bind", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.database", "memory")?
            .set_default("server.client_url", "http://localhost:5173")?
            .set_default("auth.token_ttl_days", 30)?
            .set_default("auth.secure_cookies", false)?
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("FINTRACK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }
}
