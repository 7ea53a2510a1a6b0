//! # seed binary
//!
//! Provisions the role accounts and a handful of demo pets so a fresh
//! checkout has something to look at. Safe to run repeatedly: existing
//! accounts are refreshed, demo pets are only added once.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use auth_adapters::Argon2Hasher;
use configs::Settings;
use domains::{DomainError, Identity, PasswordHasher, PetFilter, Role, UserRepo};
use services::{PetService, UserService};
use storage_adapters::{LogNotifier, SqliteStore};

const ACCOUNTS: &[(&str, &str, Role)] = &[
    ("admin@example.com", "admin12345", Role::Admin),
    ("moderator@example.com", "moderator12345", Role::Moderator),
    ("user@example.com", "user12345", Role::User),
];

const DEMO_PETS: &[(&str, &str, u32, &str)] = &[
    ("Rex", "dog", 3, "A kind and playful dog"),
    ("Murka", "cat", 2, "A calm cat"),
    ("Bucephalus", "bird", 1, "A talking parrot"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load().context("loading settings")?;
    let store = Arc::new(
        SqliteStore::connect(settings.database.url.expose_secret())
            .await
            .context("opening the database")?,
    );
    let hasher = Arc::new(Argon2Hasher);
    let notifier = Arc::new(LogNotifier::new(settings.notify.from_addr.clone()));

    let accounts = UserService::new(store.clone(), hasher.clone(), notifier.clone());
    let pets = PetService::new(store.clone(), store.clone(), notifier);

    let mut admin: Option<Identity> = None;
    for (email, password, role) in ACCOUNTS {
        let user = ensure_account(&accounts, store.as_ref(), hasher.as_ref(), email, password, *role)
            .await
            .with_context(|| format!("seeding {email}"))?;
        if *role == Role::Admin {
            admin = Some(user);
        }
    }
    let admin = admin.expect("the account list contains an admin");

    for (name, species, age, description) in DEMO_PETS {
        ensure_demo_pet(&pets, &admin, name, species, *age, description)
            .await
            .with_context(|| format!("seeding pet {name}"))?;
    }

    tracing::info!("seeding complete");
    Ok(())
}

/// Creates the account, or refreshes role, password, and active flag if
/// it already exists.
async fn ensure_account(
    accounts: &UserService,
    store: &SqliteStore,
    hasher: &Argon2Hasher,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Identity> {
    match accounts.create(email, password, role).await {
        Ok(user) => {
            tracing::info!(%email, role = role.as_str(), "account created");
            Ok(user)
        }
        Err(DomainError::Conflict(_)) => {
            let existing = store
                .find_by_email(email)
                .await?
                .context("conflicting account vanished")?;
            let refreshed = Identity {
                role,
                is_active: true,
                password_hash: hasher.hash(password)?,
                updated_at: Utc::now(),
                ..existing
            };
            store.update(&refreshed).await?;
            tracing::info!(%email, role = role.as_str(), "account refreshed");
            Ok(refreshed)
        }
        Err(err) => Err(err.into()),
    }
}

/// Adds a demo pet unless one with that name is already listed.
async fn ensure_demo_pet(
    pets: &PetService,
    owner: &Identity,
    name: &str,
    species: &str,
    age: u32,
    description: &str,
) -> anyhow::Result<()> {
    let filter = PetFilter {
        name: Some(name.to_string()),
        ..Default::default()
    };
    let listing = pets.list(Some(owner), filter, 1, 1).await?;
    if listing.active.total > 0 {
        tracing::info!(%name, "demo pet already present");
        return Ok(());
    }

    let draft = domains::validation::PetDraft {
        name: name.to_string(),
        species: species.to_string(),
        age: Some(age),
        birth_date: None,
        description: description.to_string(),
    };
    pets.create(owner, draft, Vec::new()).await?;
    tracing::info!(%name, species, "demo pet created");
    Ok(())
}
