//! # configs
//!
//! Layered runtime settings: built-in defaults, then a `.env` file,
//! then real environment variables with the `PETBOARD` prefix
//! (`PETBOARD_SERVER__BIND`, `PETBOARD_DATABASE__URL`, ...).

use config::{Config, ConfigError, Environment};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub notify: Notify,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    /// Address:port the HTTP listener binds to.
    pub bind: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// Connection URL. May embed credentials, hence the redaction.
    pub url: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct Notify {
    /// Sender address stamped on outbound notices.
    pub from_addr: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine; real env vars still apply.
        dotenvy::dotenv().ok();

        Config::builder()
            .set_default("server.bind", "127.0.0.1:8080")?
            .set_default("database.url", "sqlite:petboard.db")?
            .set_default("notify.from_addr", "noreply@petboard.local")?
            .add_source(
                Environment::with_prefix("PETBOARD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
