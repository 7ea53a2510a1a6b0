//! # PetService
//!
//! The pet record lifecycle: create/update/delete guarded by the access
//! policy, the detail-view counter side effect, the moderation flip, and
//! the filtered listing with its visibility pre-filter.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::policy;
use domains::validation::{validate_pet_submission, PedigreeAttrs, PedigreeDraft, PetDraft};
use domains::{
    DomainError, Identity, Notifier, Page, PageResult, PedigreeEntry, Pet, PetFilter, PetRepo,
    Result, Role, UserRepo,
};

/// Listing page size for both the active and the inactive result set.
pub const PAGE_SIZE: u32 = 5;

/// Every Nth view of a pet triggers a best-effort owner notification.
pub const VIEWS_PER_NOTICE: u64 = 100;

/// The two independently paginated result sets of a listing page. The
/// inactive set is present only for staff viewers.
#[derive(Debug)]
pub struct PetListing {
    pub active: PageResult<Pet>,
    pub inactive: Option<PageResult<Pet>>,
}

#[derive(Clone)]
pub struct PetService {
    pets: Arc<dyn PetRepo>,
    users: Arc<dyn UserRepo>,
    notifier: Arc<dyn Notifier>,
}

impl PetService {
    pub fn new(pets: Arc<dyn PetRepo>, users: Arc<dyn UserRepo>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pets,
            users,
            notifier,
        }
    }

    /// Creates a pet (and its pedigree, atomically) owned by `owner`.
    pub async fn create(
        &self,
        owner: &Identity,
        draft: PetDraft,
        pedigree: Vec<PedigreeDraft>,
    ) -> Result<Pet> {
        let (attrs, entries) = validate_pet_submission(&draft, &pedigree, Utc::now().date_naive())?;

        let now = Utc::now();
        let pet = Pet {
            id: Uuid::now_v7(),
            name: attrs.name,
            species: attrs.species,
            age: attrs.age,
            birth_date: attrs.birth_date,
            description: attrs.description,
            owner_id: owner.id,
            is_active: true,
            moderated_by: None,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        let entries = materialize(pet.id, entries);
        self.pets.insert(&pet, &entries).await?;
        tracing::info!(pet = %pet.id, owner = %owner.id, "pet created");
        Ok(pet)
    }

    /// Updates the editable fields of a pet and replaces its pedigree.
    ///
    /// `is_active`, the owner, and the view counter are never touched
    /// here regardless of who edits: the draft structurally cannot carry
    /// them, and the stored values are copied through unchanged.
    pub async fn update(
        &self,
        pet_id: Uuid,
        editor: &Identity,
        draft: PetDraft,
        pedigree: Vec<PedigreeDraft>,
    ) -> Result<Pet> {
        let stored = self.require(pet_id).await?;
        if !policy::can_edit(editor, &stored) {
            return Err(DomainError::unauthorized("you may not edit this pet"));
        }

        let (attrs, entries) = validate_pet_submission(&draft, &pedigree, Utc::now().date_naive())?;

        let pet = Pet {
            name: attrs.name,
            species: attrs.species,
            age: attrs.age,
            birth_date: attrs.birth_date,
            description: attrs.description,
            updated_at: Utc::now(),
            ..stored
        };
        let entries = materialize(pet.id, entries);
        self.pets.update(&pet, &entries).await?;
        tracing::info!(pet = %pet.id, editor = %editor.id, "pet updated");
        Ok(pet)
    }

    pub async fn delete(&self, pet_id: Uuid, editor: &Identity) -> Result<()> {
        let stored = self.require(pet_id).await?;
        if !policy::can_delete(editor, &stored) {
            return Err(DomainError::unauthorized("you may not delete this pet"));
        }
        self.pets.delete(pet_id).await?;
        tracing::info!(pet = %pet_id, editor = %editor.id, "pet deleted");
        Ok(())
    }

    /// Detail view. A view by anyone but the owner bumps the counter by
    /// one; every [`VIEWS_PER_NOTICE`]th view additionally sends the
    /// owner a notice. The notice is best-effort and never fails the
    /// read.
    pub async fn view(
        &self,
        pet_id: Uuid,
        viewer: Option<&Identity>,
    ) -> Result<(Pet, Vec<PedigreeEntry>)> {
        let mut pet = self.require(pet_id).await?;
        if !policy::can_view(viewer, &pet) {
            return Err(DomainError::unauthorized("this pet is not visible"));
        }

        let is_owner = viewer.is_some_and(|v| v.id == pet.owner_id);
        if !is_owner {
            let count = self.pets.increment_views(pet_id).await?;
            pet.view_count = count;
            if count % VIEWS_PER_NOTICE == 0 {
                self.notify_view_milestone(&pet, count).await;
            }
        }

        let pedigree = self.pets.pedigree_of(pet_id).await?;
        Ok((pet, pedigree))
    }

    /// Loads a pet and its pedigree for an edit form, enforcing the same
    /// rule as [`update`](Self::update).
    pub async fn for_edit(
        &self,
        pet_id: Uuid,
        editor: &Identity,
    ) -> Result<(Pet, Vec<PedigreeEntry>)> {
        let pet = self.require(pet_id).await?;
        if !policy::can_edit(editor, &pet) {
            return Err(DomainError::unauthorized("you may not edit this pet"));
        }
        let pedigree = self.pets.pedigree_of(pet_id).await?;
        Ok((pet, pedigree))
    }

    /// Flips the visibility of a pet and stamps who did it. Staff only.
    /// Flipping twice restores the original state; the stamp always
    /// reflects the last toggler. Concurrent flips are last-write-wins.
    pub async fn toggle_active(&self, pet_id: Uuid, moderator: &Identity) -> Result<Pet> {
        if !policy::can_toggle_active(moderator) {
            return Err(DomainError::unauthorized(
                "only moderators and admins may change visibility",
            ));
        }
        let mut pet = self.require(pet_id).await?;
        pet.is_active = !pet.is_active;
        pet.moderated_by = Some(moderator.id);
        self.pets
            .set_moderation(pet_id, pet.is_active, moderator.id)
            .await?;
        tracing::info!(
            pet = %pet_id,
            moderator = %moderator.id,
            active = pet.is_active,
            "visibility toggled"
        );
        Ok(pet)
    }

    /// The listing page. Non-staff viewers get the active set only; the
    /// owner-email filter is an admin privilege and is silently cleared
    /// for everyone else.
    pub async fn list(
        &self,
        viewer: Option<&Identity>,
        mut filter: PetFilter,
        active_page: u32,
        inactive_page: u32,
    ) -> Result<PetListing> {
        if viewer.map_or(true, |v| v.role != Role::Admin) {
            filter.owner_email = None;
        }

        let active = self
            .pets
            .list(true, &filter, Page::new(active_page, PAGE_SIZE))
            .await?;

        let inactive = if policy::sees_inactive(viewer) {
            Some(
                self.pets
                    .list(false, &filter, Page::new(inactive_page, PAGE_SIZE))
                    .await?,
            )
        } else {
            None
        };

        Ok(PetListing { active, inactive })
    }

    async fn require(&self, pet_id: Uuid) -> Result<Pet> {
        self.pets
            .find(pet_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("pet", pet_id.to_string()))
    }

    async fn notify_view_milestone(&self, pet: &Pet, count: u64) {
        let owner = match self.users.find(pet.owner_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%err, pet = %pet.id, "owner lookup for view notice failed");
                return;
            }
        };
        let subject = format!("{} is getting attention", pet.name);
        let body = format!("Your pet {} has been viewed {count} times.", pet.name);
        if let Err(err) = self.notifier.send(&subject, &body, &[owner.email]).await {
            tracing::warn!(%err, pet = %pet.id, "view notice delivery failed");
        }
    }
}

fn materialize(pet_id: Uuid, entries: Vec<PedigreeAttrs>) -> Vec<PedigreeEntry> {
    entries
        .into_iter()
        .map(|attrs| PedigreeEntry {
            id: Uuid::now_v7(),
            pet_id,
            kind: attrs.kind,
            name: attrs.name,
            breed: attrs.breed,
            birth_date: attrs.birth_date,
            description: attrs.description,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{draft, fixtures, parent_draft};
    use domains::Species;

    #[tokio::test]
    async fn create_persists_pet_with_pedigree() {
        let fx = fixtures();
        let owner = fx.user().await;
        let pet = fx
            .pets
            .create(
                &owner,
                draft("Rex", "dog", 3),
                vec![parent_draft("mother", "Lassie"), parent_draft("father", "Bolt")],
            )
            .await
            .unwrap();

        assert_eq!(pet.species, Species::Dog);
        assert!(pet.is_active);
        assert_eq!(pet.view_count, 0);
        let (_, pedigree) = fx.pets.view(pet.id, Some(&owner)).await.unwrap();
        assert_eq!(pedigree.len(), 2);
    }

    #[tokio::test]
    async fn stranger_cannot_update_or_delete() {
        let fx = fixtures();
        let owner = fx.user().await;
        let stranger = fx.user().await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();

        let err = fx
            .pets
            .update(pet.id, &stranger, draft("Hacked", "cat", 1), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        let err = fx.pets.delete(pet.id, &stranger).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        // record unchanged
        let (unchanged, _) = fx.pets.view(pet.id, Some(&owner)).await.unwrap();
        assert_eq!(unchanged.name, "Rex");
        assert_eq!(unchanged.species, Species::Dog);
    }

    #[tokio::test]
    async fn admin_may_edit_anyone_moderator_may_not() {
        let fx = fixtures();
        let owner = fx.user().await;
        let admin = fx.staff(Role::Admin).await;
        let moderator = fx.staff(Role::Moderator).await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();

        let renamed = fx
            .pets
            .update(pet.id, &admin, draft("Rexford", "dog", 3), vec![])
            .await
            .unwrap();
        assert_eq!(renamed.name, "Rexford");
        // owner survives an admin edit untouched
        assert_eq!(renamed.owner_id, owner.id);

        let err = fx
            .pets
            .update(pet.id, &moderator, draft("Nope", "dog", 3), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn update_replaces_pedigree_as_a_unit() {
        let fx = fixtures();
        let owner = fx.user().await;
        let pet = fx
            .pets
            .create(&owner, draft("Rex", "dog", 3), vec![parent_draft("mother", "Lassie")])
            .await
            .unwrap();

        fx.pets
            .update(
                pet.id,
                &owner,
                draft("Rex", "dog", 3),
                vec![parent_draft("father", "Bolt")],
            )
            .await
            .unwrap();

        let (_, pedigree) = fx.pets.view(pet.id, Some(&owner)).await.unwrap();
        assert_eq!(pedigree.len(), 1);
        assert_eq!(pedigree[0].name, "Bolt");
    }

    #[tokio::test]
    async fn invalid_update_leaves_record_unchanged() {
        let fx = fixtures();
        let owner = fx.user().await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();

        let err = fx
            .pets
            .update(pet.id, &owner, draft("Rex123", "dog", 3), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let (unchanged, _) = fx.pets.view(pet.id, Some(&owner)).await.unwrap();
        assert_eq!(unchanged.name, "Rex");
    }

    #[tokio::test]
    async fn owner_views_do_not_count_stranger_views_do() {
        let fx = fixtures();
        let owner = fx.user().await;
        let stranger = fx.user().await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();

        let (seen, _) = fx.pets.view(pet.id, Some(&owner)).await.unwrap();
        assert_eq!(seen.view_count, 0);

        let (seen, _) = fx.pets.view(pet.id, Some(&stranger)).await.unwrap();
        assert_eq!(seen.view_count, 1);

        // anonymous views count as well
        let (seen, _) = fx.pets.view(pet.id, None).await.unwrap();
        assert_eq!(seen.view_count, 2);
    }

    #[tokio::test]
    async fn every_hundredth_view_notifies_the_owner() {
        let fx = fixtures();
        let owner = fx.user().await;
        let stranger = fx.user().await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();

        for _ in 0..(VIEWS_PER_NOTICE - 1) {
            fx.pets.view(pet.id, Some(&stranger)).await.unwrap();
        }
        assert!(fx.notifier.sent().is_empty());

        fx.pets.view(pet.id, Some(&stranger)).await.unwrap();
        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec![owner.email.clone()]);
        assert!(sent[0].body.contains("100"));
    }

    #[tokio::test]
    async fn notice_failure_does_not_fail_the_read() {
        let fx = fixtures();
        let owner = fx.user().await;
        let stranger = fx.user().await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();

        fx.notifier.fail_all();
        for _ in 0..VIEWS_PER_NOTICE {
            fx.pets.view(pet.id, Some(&stranger)).await.unwrap();
        }
        let (seen, _) = fx.pets.view(pet.id, Some(&owner)).await.unwrap();
        assert_eq!(seen.view_count, VIEWS_PER_NOTICE);
    }

    #[tokio::test]
    async fn toggle_flips_and_stamps_and_restores() {
        let fx = fixtures();
        let owner = fx.user().await;
        let moderator = fx.staff(Role::Moderator).await;
        let admin = fx.staff(Role::Admin).await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();

        let err = fx.pets.toggle_active(pet.id, &owner).await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        let off = fx.pets.toggle_active(pet.id, &moderator).await.unwrap();
        assert!(!off.is_active);
        assert_eq!(off.moderated_by, Some(moderator.id));

        let back = fx.pets.toggle_active(pet.id, &admin).await.unwrap();
        assert!(back.is_active);
        assert_eq!(back.moderated_by, Some(admin.id));
    }

    #[tokio::test]
    async fn inactive_pets_are_invisible_to_strangers() {
        let fx = fixtures();
        let owner = fx.user().await;
        let stranger = fx.user().await;
        let moderator = fx.staff(Role::Moderator).await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();
        fx.pets.toggle_active(pet.id, &moderator).await.unwrap();

        assert!(matches!(
            fx.pets.view(pet.id, Some(&stranger)).await.unwrap_err(),
            DomainError::Unauthorized(_)
        ));
        assert!(fx.pets.view(pet.id, Some(&owner)).await.is_ok());
        assert!(fx.pets.view(pet.id, Some(&moderator)).await.is_ok());
    }

    #[tokio::test]
    async fn listing_hides_inactive_from_regular_viewers() {
        let fx = fixtures();
        let owner = fx.user().await;
        let moderator = fx.staff(Role::Moderator).await;
        let visible = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();
        let hidden = fx.pets.create(&owner, draft("Murka", "cat", 2), vec![]).await.unwrap();
        fx.pets.toggle_active(hidden.id, &moderator).await.unwrap();

        let listing = fx
            .pets
            .list(Some(&owner), PetFilter::default(), 1, 1)
            .await
            .unwrap();
        assert!(listing.inactive.is_none());
        let ids: Vec<_> = listing.active.items.iter().map(|p| p.id).collect();
        assert!(ids.contains(&visible.id));
        assert!(!ids.contains(&hidden.id));

        let listing = fx
            .pets
            .list(Some(&moderator), PetFilter::default(), 1, 1)
            .await
            .unwrap();
        let inactive = listing.inactive.unwrap();
        assert_eq!(inactive.items.len(), 1);
        assert_eq!(inactive.items[0].id, hidden.id);
    }

    #[tokio::test]
    async fn anonymous_listing_never_contains_inactive() {
        let fx = fixtures();
        let owner = fx.user().await;
        let moderator = fx.staff(Role::Moderator).await;
        let pet = fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();
        fx.pets.toggle_active(pet.id, &moderator).await.unwrap();

        let listing = fx.pets.list(None, PetFilter::default(), 1, 1).await.unwrap();
        assert!(listing.inactive.is_none());
        assert!(listing.active.items.is_empty());
    }

    #[tokio::test]
    async fn owner_filter_is_admin_only() {
        let fx = fixtures();
        let owner = fx.user().await;
        let admin = fx.staff(Role::Admin).await;
        let moderator = fx.staff(Role::Moderator).await;
        fx.pets.create(&owner, draft("Rex", "dog", 3), vec![]).await.unwrap();

        let filter = PetFilter {
            owner_email: Some("no-such-owner".into()),
            ..Default::default()
        };

        // admin: filter applies and excludes everything
        let listing = fx.pets.list(Some(&admin), filter.clone(), 1, 1).await.unwrap();
        assert!(listing.active.items.is_empty());

        // moderator and plain user: filter silently cleared
        for viewer in [&moderator, &owner] {
            let listing = fx.pets.list(Some(viewer), filter.clone(), 1, 1).await.unwrap();
            assert_eq!(listing.active.items.len(), 1);
        }
    }

    #[tokio::test]
    async fn listing_pages_are_independent() {
        let fx = fixtures();
        let owner = fx.user().await;
        let moderator = fx.staff(Role::Moderator).await;
        for i in 0..7 {
            let pet = fx
                .pets
                .create(&owner, draft(&format!("Dog{}", letters(i)), "dog", 3), vec![])
                .await
                .unwrap();
            if i % 2 == 0 {
                fx.pets.toggle_active(pet.id, &moderator).await.unwrap();
            }
        }

        let listing = fx
            .pets
            .list(Some(&moderator), PetFilter::default(), 1, 2)
            .await
            .unwrap();
        assert_eq!(listing.active.page, 1);
        assert_eq!(listing.active.total, 3);
        let inactive = listing.inactive.unwrap();
        // four inactive records: page 2 of size 5 clamps to the last page
        assert_eq!(inactive.total, 4);
        assert_eq!(inactive.page, 1);
    }

    fn letters(i: usize) -> String {
        // Pet names may not contain digits; spell the index out instead.
        char::from(b'A' + (i as u8)).to_string()
    }
}
