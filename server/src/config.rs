use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Single connection string for the store, e.g. `sqlite://todos.db`.
    pub url: String,
}

impl AppConfig {
    /// Defaults, then `TODO__SECTION__KEY` variables, then the plain
    /// `DATABASE_URL` and `PORT` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(
            Environment::with_prefix("TODO").separator("__").try_parsing(true),
            std::env::var("DATABASE_URL").ok(),
            std::env::var("PORT").ok(),
        )
    }

    fn build(
        env: Environment,
        database_url: Option<String>,
        port: Option<String>,
    ) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.url", DEFAULT_DATABASE_URL)?
            .add_source(env)
            .set_override_option("database.url", database_url)?
            .set_override_option("server.port", port)?
            .build()?
            .try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
