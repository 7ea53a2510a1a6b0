//! Shared fixtures for the service tests: an in-memory store wired into
//! every service, a notifier that records what it was asked to send,
//! and a hasher cheap enough for tight loops.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domains::{DomainError, Identity, Notifier, PasswordHasher, Result, Role};
use storage_adapters::MemoryStore;

use crate::pets::PetService;
use crate::reviews::ReviewService;
use crate::users::UserService;
use domains::validation::{PedigreeDraft, PetDraft};

#[derive(Debug, Clone)]
pub struct SentMail {
    pub subject: String,
    pub body: String,
    pub to: Vec<String>,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMail>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Makes every subsequent send fail.
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str, to: &[String]) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::Internal("notifier down".into()));
        }
        self.sent.lock().unwrap().push(SentMail {
            subject: subject.to_string(),
            body: body.to_string(),
            to: to.to_vec(),
        });
        Ok(())
    }
}

/// Reversible marker "hash"; argon2 would dominate test runtime here.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash == format!("plain:{password}")
    }
}

pub struct Fixtures {
    pub pets: PetService,
    pub reviews: ReviewService,
    pub accounts: UserService,
    pub notifier: Arc<RecordingNotifier>,
    seq: AtomicUsize,
}

impl Fixtures {
    pub async fn user(&self) -> Identity {
        self.account(Role::User).await
    }

    pub async fn staff(&self, role: Role) -> Identity {
        self.account(role).await
    }

    async fn account(&self, role: Role) -> Identity {
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        self.accounts
            .create(&format!("{}{n}@example.com", role.as_str()), "password123", role)
            .await
            .unwrap()
    }
}

pub fn fixtures() -> Fixtures {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let hasher = Arc::new(PlainHasher);

    let pets = PetService::new(store.clone(), store.clone(), notifier.clone());
    let reviews = ReviewService::new(store.clone(), store.clone());
    let accounts = UserService::new(store.clone(), hasher, notifier.clone());

    Fixtures {
        pets,
        reviews,
        accounts,
        notifier,
        seq: AtomicUsize::new(0),
    }
}

pub fn draft(name: &str, species: &str, age: u32) -> PetDraft {
    PetDraft {
        name: name.into(),
        species: species.into(),
        age: Some(age),
        birth_date: None,
        description: "a fine animal".into(),
    }
}

pub fn parent_draft(kind: &str, name: &str) -> PedigreeDraft {
    PedigreeDraft {
        kind: kind.into(),
        name: name.into(),
        breed: None,
        birth_date: None,
        description: None,
    }
}
