//! # Access policy
//!
//! Pure decision functions consulted before every mutating or
//! visibility-sensitive operation. No store access happens here; the
//! caller checks the verdict first and only then touches a repository.

use crate::models::{Identity, Pet, Role};

/// Fields a non-staff editor may never submit or see as editable.
pub const RESTRICTED_FIELDS: &[&str] = &["is_active", "owner", "view_count"];

/// Owner or admin may change a pet's fields.
pub fn can_edit(who: &Identity, pet: &Pet) -> bool {
    who.id == pet.owner_id || who.role == Role::Admin
}

/// Deletion follows the same rule as editing.
pub fn can_delete(who: &Identity, pet: &Pet) -> bool {
    can_edit(who, pet)
}

/// Only staff may flip a pet between active and inactive.
pub fn can_toggle_active(who: &Identity) -> bool {
    who.role.is_staff()
}

/// Active pets are public. Inactive pets remain visible to staff and to
/// their owner; anonymous viewers see only active records.
pub fn can_view(who: Option<&Identity>, pet: &Pet) -> bool {
    if pet.is_active {
        return true;
    }
    who.map_or(false, |w| w.id == pet.owner_id || w.role.is_staff())
}

/// Whether listings should include the inactive result set at all.
pub fn sees_inactive(who: Option<&Identity>) -> bool {
    who.map_or(false, |w| w.role.is_staff())
}

/// Field names the given identity must get read-only/hidden on edit
/// forms. Staff get an empty slice; everyone else the restricted set,
/// regardless of what a payload claims.
pub fn restricted_fields(who: &Identity) -> &'static [&'static str] {
    if who.role.is_staff() {
        &[]
    } else {
        RESTRICTED_FIELDS
    }
}
