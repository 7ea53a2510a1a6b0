//! # Core Ports
//!
//! Contracts every adapter must implement to be wired into the binary.
//! All ports are object-safe and `Send + Sync` so services can hold them
//! behind `Arc<dyn ...>`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Identity, PedigreeEntry, Pet, Review};
use crate::query::{Page, PageResult, PetFilter};

/// Persistence contract for pets and their pedigree entries.
///
/// A pet and its pedigree are one unit of work: `insert` and `update`
/// must apply both or neither, and `update` replaces the stored pedigree
/// set wholesale.
#[async_trait]
pub trait PetRepo: Send + Sync {
    async fn insert(&self, pet: &Pet, pedigree: &[PedigreeEntry]) -> Result<()>;
    async fn update(&self, pet: &Pet, pedigree: &[PedigreeEntry]) -> Result<()>;
    /// Removes the pet together with its pedigree entries and reviews.
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Pet>>;
    async fn pedigree_of(&self, pet_id: Uuid) -> Result<Vec<PedigreeEntry>>;
    /// Adds one to the view counter in a single store operation and
    /// returns the new value. Last write wins under concurrency.
    async fn increment_views(&self, id: Uuid) -> Result<u64>;
    /// Persists a moderation flip: the new visibility plus the identity
    /// that performed it.
    async fn set_moderation(&self, id: Uuid, active: bool, moderated_by: Uuid) -> Result<()>;
    /// One page of pets with the given visibility, newest first.
    async fn list(&self, active: bool, filter: &PetFilter, page: Page) -> Result<PageResult<Pet>>;
}

/// Persistence contract for identities.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `Conflict` when the email is already taken
    /// (case-insensitively).
    async fn insert(&self, user: &Identity) -> Result<()>;
    async fn update(&self, user: &Identity) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Identity>>;
    /// Lookup by email, case-insensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>>;
    async fn list(&self) -> Result<Vec<Identity>>;
}

/// Persistence contract for reviews. Reviews are append-only.
#[async_trait]
pub trait ReviewRepo: Send + Sync {
    /// Fails with `Conflict` when the slug is already taken.
    async fn insert(&self, review: &Review) -> Result<()>;
    async fn list_for_pet(&self, pet_id: Uuid) -> Result<Vec<Review>>;
    async fn slug_exists(&self, slug: &str) -> Result<bool>;
}

/// Password hashing primitive.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Opaque-token session contract consumed by the web layer.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session and returns its token.
    async fn open(&self, user_id: Uuid) -> Result<String>;
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>>;
    async fn close(&self, token: &str) -> Result<()>;
}

/// Outbound notification contract. Delivery is best-effort; callers
/// decide whether a failure may be swallowed.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str, to: &[String]) -> Result<()>;
}
