//! Shared wiring for the integration tests: an application state over
//! the in-memory store, plus helpers for accounts and sessions.

use std::sync::Arc;

use api_adapters::state::AppState;
use auth_adapters::{Argon2Hasher, MemorySessionStore};
use domains::{Identity, MockNotifier, Notifier, Role, SessionStore};
use services::{PetService, ReviewService, UserService};
use storage_adapters::MemoryStore;

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub sessions: Arc<MemorySessionStore>,
}

/// A full application over the in-memory store. The default notifier
/// accepts anything; pass a configured [`MockNotifier`] to assert on
/// deliveries.
pub fn test_app() -> TestApp {
    let mut notifier = MockNotifier::new();
    notifier.expect_send().returning(|_, _, _| Ok(()));
    test_app_with_notifier(notifier)
}

pub fn test_app_with_notifier(notifier: MockNotifier) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let sessions = Arc::new(MemorySessionStore::default());
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);
    let hasher = Arc::new(Argon2Hasher);

    let state = AppState::new(
        PetService::new(store.clone(), store.clone(), notifier.clone()),
        ReviewService::new(store.clone(), store.clone()),
        UserService::new(store.clone(), hasher, notifier),
        sessions.clone(),
    );
    TestApp {
        state,
        store,
        sessions,
    }
}

impl TestApp {
    /// Provisions an account with the given role.
    pub async fn account(&self, email: &str, role: Role) -> Identity {
        self.state
            .accounts
            .create(email, "password123", role)
            .await
            .expect("seeding a test account")
    }

    /// Opens a session for the identity and returns the Cookie header
    /// value a browser would send back.
    pub async fn cookie_for(&self, user: &Identity) -> String {
        let token = self
            .sessions
            .open(user.id)
            .await
            .expect("opening a test session");
        format!("pb_session={token}")
    }
}
