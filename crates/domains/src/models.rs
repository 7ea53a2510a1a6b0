//! # Domain Models
//!
//! These structs represent the core entities of petboard.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission tier of an [`Identity`]. Every access decision in the
/// system derives from this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    /// Moderators and admins may see and toggle inactive records.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// An authenticated account, keyed by email.
///
/// The email is stored lowercase; uniqueness is case-insensitive.
/// `password_hash` is opaque to everything except the hasher port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Dog,
    Cat,
    Bird,
    Fish,
    Other,
}

impl Species {
    pub const ALL: [Species; 5] = [
        Species::Dog,
        Species::Cat,
        Species::Bird,
        Species::Fish,
        Species::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Species::Dog => "dog",
            Species::Cat => "cat",
            Species::Bird => "bird",
            Species::Fish => "fish",
            Species::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Species> {
        match s {
            "dog" => Some(Species::Dog),
            "cat" => Some(Species::Cat),
            "bird" => Some(Species::Bird),
            "fish" => Some(Species::Fish),
            "other" => Some(Species::Other),
            _ => None,
        }
    }
}

/// A pet profile record, exclusively owned by one [`Identity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub species: Species,
    /// Stored age in years, 1..=100. Cross-checked against `birth_date`.
    pub age: u32,
    pub birth_date: Option<NaiveDate>,
    pub description: String,
    pub owner_id: Uuid,
    /// Visibility state; inactive records are hidden from regular listings.
    pub is_active: bool,
    /// The staff identity that last toggled `is_active`, if any.
    pub moderated_by: Option<Uuid>,
    /// Incremented on every non-owner detail view.
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which parent a [`PedigreeEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKind {
    Mother,
    Father,
}

impl ParentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParentKind::Mother => "mother",
            ParentKind::Father => "father",
        }
    }

    pub fn parse(s: &str) -> Option<ParentKind> {
        match s {
            "mother" => Some(ParentKind::Mother),
            "father" => Some(ParentKind::Father),
            _ => None,
        }
    }
}

/// One parent-lineage record attached to a pet. A pet carries at most
/// two entries, one per [`ParentKind`], and they are only ever written
/// together with the pet itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedigreeEntry {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub kind: ParentKind,
    pub name: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// An append-only rating left by a non-owner identity. Immutable once
/// written; the slug is a short random token, unique across all reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub rating: u8,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn staff_tiers() {
        assert!(!Role::User.is_staff());
        assert!(Role::Moderator.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn species_round_trip() {
        for species in Species::ALL {
            assert_eq!(Species::parse(species.as_str()), Some(species));
        }
        assert_eq!(Species::parse("dragon"), None);
    }

    #[test]
    fn parent_kind_round_trip() {
        assert_eq!(ParentKind::parse("mother"), Some(ParentKind::Mother));
        assert_eq!(ParentKind::parse("father"), Some(ParentKind::Father));
        assert_eq!(ParentKind::parse("sibling"), None);
    }
}
