//! # ReviewService
//!
//! Append-only ratings against pets. A review is authored once by an
//! identity other than the owner and never changes afterwards.

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use domains::policy;
use domains::validation::{validate_review, ReviewDraft};
use domains::{DomainError, Identity, PetRepo, Result, Review, ReviewRepo};

/// Slug length in characters.
const SLUG_CHARS: usize = 8;
/// Collision retries before giving up with a conflict.
const SLUG_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct ReviewService {
    pets: Arc<dyn PetRepo>,
    reviews: Arc<dyn ReviewRepo>,
}

impl ReviewService {
    pub fn new(pets: Arc<dyn PetRepo>, reviews: Arc<dyn ReviewRepo>) -> Self {
        Self { pets, reviews }
    }

    /// Creates a review by `author` against a visible pet they do not
    /// own. The slug is generated here; on the (unlikely) collision the
    /// insert is retried with a fresh token.
    pub async fn create(&self, pet_id: Uuid, author: &Identity, draft: ReviewDraft) -> Result<Review> {
        let pet = self
            .pets
            .find(pet_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("pet", pet_id.to_string()))?;

        if author.id == pet.owner_id {
            return Err(DomainError::unauthorized(
                "owners may not review their own pet",
            ));
        }
        if !policy::can_view(Some(author), &pet) {
            return Err(DomainError::unauthorized("this pet is not visible"));
        }

        let attrs = validate_review(&draft)?;

        for _ in 0..SLUG_ATTEMPTS {
            let slug = random_slug();
            if self.reviews.slug_exists(&slug).await? {
                continue;
            }
            let review = Review {
                id: Uuid::now_v7(),
                pet_id,
                author_id: author.id,
                body: attrs.body.clone(),
                rating: attrs.rating,
                slug,
                created_at: Utc::now(),
            };
            match self.reviews.insert(&review).await {
                Ok(()) => {
                    tracing::info!(review = %review.id, pet = %pet_id, "review created");
                    return Ok(review);
                }
                // Lost the race on the slug; roll a new one.
                Err(DomainError::Conflict(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(DomainError::Conflict(
            "could not allocate a unique review slug".into(),
        ))
    }

    /// Reviews for a pet, oldest first.
    pub async fn list_for_pet(&self, pet_id: Uuid) -> Result<Vec<Review>> {
        self.reviews.list_for_pet(pet_id).await
    }
}

fn random_slug() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SLUG_CHARS)
        .map(char::from)
        .collect()
}
