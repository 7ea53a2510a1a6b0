//! # Listing types
//!
//! Filter predicates and pagination shared by every store
//! implementation. `PetFilter::matches` is the reference semantics; the
//! SQL adapter compiles the same predicates into its WHERE clause.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Pet, Species};

/// The creation-date window a listing may be narrowed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatedWindow {
    /// `created_at >= now - 30 days`.
    LastMonth,
}

impl CreatedWindow {
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            CreatedWindow::LastMonth => now - Duration::days(30),
        }
    }
}

/// Optional listing filters. All present filters must hold at once.
///
/// `owner_email` is an admin-only filter; the service clears it for
/// everyone else before the store ever sees it.
#[derive(Debug, Clone, Default)]
pub struct PetFilter {
    /// Case-insensitive name substring.
    pub name: Option<String>,
    pub species: Option<Species>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    /// Case-insensitive owner-email substring (admin only).
    pub owner_email: Option<String>,
    pub window: Option<CreatedWindow>,
}

impl PetFilter {
    /// Whether `pet`, owned by `owner_email`, passes every present
    /// predicate at time `now`.
    pub fn matches(&self, pet: &Pet, owner_email: &str, now: DateTime<Utc>) -> bool {
        if let Some(needle) = &self.name {
            if !pet.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(species) = self.species {
            if pet.species != species {
                return false;
            }
        }
        if let Some(min) = self.age_min {
            if pet.age < min {
                return false;
            }
        }
        if let Some(max) = self.age_max {
            if pet.age > max {
                return false;
            }
        }
        if let Some(needle) = &self.owner_email {
            if !owner_email.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(window) = self.window {
            if pet.created_at < window.cutoff(now) {
                return false;
            }
        }
        true
    }
}

/// A 1-based page request with a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }
}

/// One page of a result set plus enough bookkeeping to render a pager.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// The page actually served; out-of-range requests clamp here.
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub size: u32,
}

impl<T> PageResult<T> {
    /// Slices an already filtered and ordered collection. Out-of-range
    /// page numbers clamp into `1..=pages` rather than erroring, so a
    /// stale page parameter never strands the caller.
    pub fn paginate(items: Vec<T>, page: Page) -> PageResult<T> {
        let total = items.len() as u64;
        let pages = (total.div_ceil(page.size as u64) as u32).max(1);
        let current = page.number.min(pages);
        let start = ((current - 1) * page.size) as usize;
        let items: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(page.size as usize)
            .collect();
        PageResult {
            items,
            page: current,
            pages,
            total,
            size: page.size,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn pet(name: &str, species: Species, age: u32) -> Pet {
        let now = Utc::now();
        Pet {
            id: Uuid::now_v7(),
            name: name.into(),
            species,
            age,
            birth_date: None,
            description: String::new(),
            owner_id: Uuid::now_v7(),
            is_active: true,
            moderated_by: None,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn name_filter_is_case_insensitive_substring() {
        let rex = pet("Rex", Species::Dog, 3);
        let filter = PetFilter {
            name: Some("rE".into()),
            ..Default::default()
        };
        assert!(filter.matches(&rex, "o@example.com", Utc::now()));

        let filter = PetFilter {
            name: Some("murka".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&rex, "o@example.com", Utc::now()));
    }

    #[test]
    fn age_range_is_inclusive() {
        let rex = pet("Rex", Species::Dog, 3);
        let filter = PetFilter {
            age_min: Some(3),
            age_max: Some(3),
            ..Default::default()
        };
        assert!(filter.matches(&rex, "", Utc::now()));

        let filter = PetFilter {
            age_min: Some(4),
            ..Default::default()
        };
        assert!(!filter.matches(&rex, "", Utc::now()));
    }

    #[test]
    fn species_is_exact() {
        let rex = pet("Rex", Species::Dog, 3);
        let filter = PetFilter {
            species: Some(Species::Cat),
            ..Default::default()
        };
        assert!(!filter.matches(&rex, "", Utc::now()));
    }

    #[test]
    fn last_month_window_cuts_at_thirty_days() {
        let now = Utc::now();
        let mut old = pet("Rex", Species::Dog, 3);
        old.created_at = now - Duration::days(31);
        let mut fresh = pet("Murka", Species::Cat, 2);
        fresh.created_at = now - Duration::days(29);

        let filter = PetFilter {
            window: Some(CreatedWindow::LastMonth),
            ..Default::default()
        };
        assert!(!filter.matches(&old, "", now));
        assert!(filter.matches(&fresh, "", now));
    }

    #[test]
    fn owner_filter_matches_email_substring() {
        let rex = pet("Rex", Species::Dog, 3);
        let filter = PetFilter {
            owner_email: Some("ADMIN".into()),
            ..Default::default()
        };
        assert!(filter.matches(&rex, "admin@example.com", Utc::now()));
        assert!(!filter.matches(&rex, "user@example.com", Utc::now()));
    }

    #[test]
    fn pagination_slices_and_counts() {
        let items: Vec<u32> = (0..12).collect();
        let result = PageResult::paginate(items, Page::new(2, 5));
        assert_eq!(result.items, vec![5, 6, 7, 8, 9]);
        assert_eq!(result.pages, 3);
        assert_eq!(result.total, 12);
        assert!(result.has_prev());
        assert!(result.has_next());
    }

    #[test]
    fn out_of_range_page_clamps() {
        let items: Vec<u32> = (0..7).collect();
        let result = PageResult::paginate(items, Page::new(99, 5));
        assert_eq!(result.page, 2);
        assert_eq!(result.items, vec![5, 6]);

        let result = PageResult::paginate(Vec::<u32>::new(), Page::new(3, 5));
        assert_eq!(result.page, 1);
        assert_eq!(result.pages, 1);
        assert!(result.items.is_empty());
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        assert_eq!(Page::new(0, 5).number, 1);
    }
}
