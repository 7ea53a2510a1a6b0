//! # petboard binary
//!
//! Assembles the application from the adapters selected at compile
//! time and serves the HTML frontend.

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use api_adapters::state::AppState;
use auth_adapters::{Argon2Hasher, MemorySessionStore};
use configs::Settings;
use services::{PetService, ReviewService, UserService};
use storage_adapters::LogNotifier;

#[cfg(feature = "db-sqlite")]
use storage_adapters::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load().context("loading settings")?;

    // 1. Storage
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(
        SqliteStore::connect(settings.database.url.expose_secret())
            .await
            .context("opening the database")?,
    );

    // 2. Outbound + auth adapters
    let notifier = Arc::new(LogNotifier::new(settings.notify.from_addr.clone()));
    let hasher = Arc::new(Argon2Hasher);
    let sessions = Arc::new(MemorySessionStore::default());

    // 3. Services over the ports
    let state = AppState::new(
        PetService::new(store.clone(), store.clone(), notifier.clone()),
        ReviewService::new(store.clone(), store.clone()),
        UserService::new(store.clone(), hasher, notifier),
        sessions,
    );

    // 4. HTTP frontend
    #[cfg(feature = "web-axum")]
    {
        let app = api_adapters::router(state);
        let listener = tokio::net::TcpListener::bind(&settings.server.bind)
            .await
            .with_context(|| format!("binding {}", settings.server.bind))?;
        tracing::info!(addr = %settings.server.bind, "petboard listening");
        axum::serve(listener, app).await.context("serving HTTP")?;
    }

    Ok(())
}
