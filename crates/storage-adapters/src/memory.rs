//! DashMap-backed implementation of the repository ports. The listing
//! path defers to `PetFilter::matches`, which is the reference
//! semantics the SQL adapter mirrors.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use domains::{
    DomainError, Identity, Page, PageResult, PedigreeEntry, Pet, PetFilter, PetRepo, Result,
    Review, ReviewRepo, UserRepo,
};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, Identity>,
    pets: DashMap<Uuid, Pet>,
    /// Pedigree entries keyed by pet id; written only alongside the pet.
    pedigree: DashMap<Uuid, Vec<PedigreeEntry>>,
    reviews: DashMap<Uuid, Review>,
}

#[async_trait]
impl PetRepo for MemoryStore {
    async fn insert(&self, pet: &Pet, pedigree: &[PedigreeEntry]) -> Result<()> {
        self.pets.insert(pet.id, pet.clone());
        self.pedigree.insert(pet.id, pedigree.to_vec());
        Ok(())
    }

    async fn update(&self, pet: &Pet, pedigree: &[PedigreeEntry]) -> Result<()> {
        if !self.pets.contains_key(&pet.id) {
            return Err(DomainError::NotFound("pet", pet.id.to_string()));
        }
        self.pets.insert(pet.id, pet.clone());
        self.pedigree.insert(pet.id, pedigree.to_vec());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        if self.pets.remove(&id).is_none() {
            return Err(DomainError::NotFound("pet", id.to_string()));
        }
        self.pedigree.remove(&id);
        self.reviews.retain(|_, review| review.pet_id != id);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Pet>> {
        Ok(self.pets.get(&id).map(|entry| entry.value().clone()))
    }

    async fn pedigree_of(&self, pet_id: Uuid) -> Result<Vec<PedigreeEntry>> {
        Ok(self
            .pedigree
            .get(&pet_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn increment_views(&self, id: Uuid) -> Result<u64> {
        let mut pet = self
            .pets
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound("pet", id.to_string()))?;
        pet.view_count += 1;
        Ok(pet.view_count)
    }

    async fn set_moderation(&self, id: Uuid, active: bool, moderated_by: Uuid) -> Result<()> {
        let mut pet = self
            .pets
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound("pet", id.to_string()))?;
        pet.is_active = active;
        pet.moderated_by = Some(moderated_by);
        Ok(())
    }

    async fn list(&self, active: bool, filter: &PetFilter, page: Page) -> Result<PageResult<Pet>> {
        let now = Utc::now();
        let mut matching: Vec<Pet> = self
            .pets
            .iter()
            .filter(|entry| entry.is_active == active)
            .filter(|entry| {
                let owner_email = self
                    .users
                    .get(&entry.owner_id)
                    .map(|owner| owner.email.clone())
                    .unwrap_or_default();
                filter.matches(entry.value(), &owner_email, now)
            })
            .map(|entry| entry.value().clone())
            .collect();

        // Newest first; v7 ids are time-ordered, so the id settles ties.
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(PageResult::paginate(matching, page))
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert(&self, user: &Identity) -> Result<()> {
        let taken = self
            .users
            .iter()
            .any(|entry| entry.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(DomainError::Conflict("email is already registered".into()));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &Identity) -> Result<()> {
        if !self.users.contains_key(&user.id) {
            return Err(DomainError::NotFound("identity", user.id.to_string()));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Identity>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.email.eq_ignore_ascii_case(email))
            .map(|entry| entry.value().clone()))
    }

    async fn list(&self) -> Result<Vec<Identity>> {
        let mut users: Vec<Identity> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }
}

#[async_trait]
impl ReviewRepo for MemoryStore {
    async fn insert(&self, review: &Review) -> Result<()> {
        let taken = self.reviews.iter().any(|entry| entry.slug == review.slug);
        if taken {
            return Err(DomainError::Conflict("review slug is taken".into()));
        }
        self.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn list_for_pet(&self, pet_id: Uuid) -> Result<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|entry| entry.pet_id == pet_id)
            .map(|entry| entry.value().clone())
            .collect();
        reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(reviews)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.reviews.iter().any(|entry| entry.slug == slug))
    }
}
