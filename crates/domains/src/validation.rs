//! # Validation
//!
//! Field-level validation for every write path. Raw submissions arrive
//! as *drafts* (strings and options, exactly what a form produces) and
//! leave as typed *attrs* once every rule has passed. All failures for a
//! submission are collected before returning so forms can show the full
//! picture at once.

use chrono::{Datelike, NaiveDate};

use crate::errors::{Result, ValidationErrors};
use crate::models::{ParentKind, Species};

/// Stored age and the age computed from the birth date may diverge by
/// at most this many years.
pub const AGE_TOLERANCE_YEARS: u32 = 1;

/// A pet must be between 1 and 100 years old.
pub const AGE_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_PEDIGREE_ENTRIES: usize = 2;
pub const MAX_REVIEW_CHARS: usize = 1000;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PHONE_CHARS: usize = 20;
pub const MAX_TELEGRAM_CHARS: usize = 100;

/// A pet submission as it comes off the wire.
#[derive(Debug, Clone, Default)]
pub struct PetDraft {
    pub name: String,
    pub species: String,
    pub age: Option<u32>,
    pub birth_date: Option<NaiveDate>,
    pub description: String,
}

/// One parent-lineage submission accompanying a pet draft.
#[derive(Debug, Clone)]
pub struct PedigreeDraft {
    pub kind: String,
    pub name: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A review submission.
#[derive(Debug, Clone, Default)]
pub struct ReviewDraft {
    pub body: String,
    pub rating: Option<u8>,
}

/// A fully validated pet, ready to persist.
#[derive(Debug, Clone)]
pub struct PetAttrs {
    pub name: String,
    pub species: Species,
    pub age: u32,
    pub birth_date: Option<NaiveDate>,
    pub description: String,
}

/// A fully validated pedigree entry.
#[derive(Debug, Clone)]
pub struct PedigreeAttrs {
    pub kind: ParentKind,
    pub name: String,
    pub breed: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A fully validated review.
#[derive(Debug, Clone)]
pub struct ReviewAttrs {
    pub body: String,
    pub rating: u8,
}

/// Calendar-aware age: year difference, minus one when the current
/// (month, day) has not yet reached the birth (month, day).
pub fn age_from_birth(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Letters (any alphabet), spaces, and hyphens only.
fn is_valid_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphabetic() || c == ' ' || c == '-')
}

fn check_name(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() {
        errors.push(field, "must not be empty");
        return None;
    }
    if name.chars().count() > MAX_NAME_CHARS {
        errors.push(field, format!("must be at most {MAX_NAME_CHARS} characters"));
        return None;
    }
    if !is_valid_name(name) {
        errors.push(field, "may only contain letters, spaces and hyphens");
        return None;
    }
    Some(name.to_string())
}

/// Validates a pet draft together with its pedigree entries, collecting
/// failures from both before returning.
pub fn validate_pet_submission(
    draft: &PetDraft,
    pedigree: &[PedigreeDraft],
    today: NaiveDate,
) -> Result<(PetAttrs, Vec<PedigreeAttrs>)> {
    let mut errors = ValidationErrors::new();

    let name = check_name(&mut errors, "name", &draft.name);

    let species = match Species::parse(draft.species.trim()) {
        Some(s) => Some(s),
        None => {
            errors.push("species", "must be one of: dog, cat, bird, fish, other");
            None
        }
    };

    let age = match draft.age {
        None => {
            errors.push("age", "is required");
            None
        }
        Some(a) if !AGE_RANGE.contains(&a) => {
            errors.push("age", "must be between 1 and 100");
            None
        }
        Some(a) => Some(a),
    };

    let mut birth_ok = true;
    if let Some(birth) = draft.birth_date {
        if birth > today {
            errors.push("birth_date", "must not be in the future");
            birth_ok = false;
        }
    }
    // Cross-check only when both sides passed on their own.
    if let (Some(age), Some(birth), true) = (age, draft.birth_date, birth_ok) {
        let computed = age_from_birth(birth, today);
        if (computed - age as i32).unsigned_abs() > AGE_TOLERANCE_YEARS {
            errors.push("age", "does not match the birth date");
        }
    }

    let description = draft.description.trim().to_string();
    if description.is_empty() {
        errors.push("description", "must not be empty");
    }

    let entries = validate_pedigree(&mut errors, pedigree, today);

    errors.into_result()?;
    Ok((
        PetAttrs {
            name: name.unwrap_or_default(),
            species: species.unwrap_or(Species::Other),
            age: age.unwrap_or_default(),
            birth_date: draft.birth_date,
            description,
        },
        entries,
    ))
}

fn validate_pedigree(
    errors: &mut ValidationErrors,
    drafts: &[PedigreeDraft],
    today: NaiveDate,
) -> Vec<PedigreeAttrs> {
    if drafts.len() > MAX_PEDIGREE_ENTRIES {
        errors.push("pedigree", "at most two entries, one per parent");
        return Vec::new();
    }

    let mut seen: Vec<ParentKind> = Vec::new();
    let mut out = Vec::new();
    for draft in drafts {
        let kind = match ParentKind::parse(draft.kind.trim()) {
            Some(k) => k,
            None => {
                errors.push("pedigree", "parent must be mother or father");
                continue;
            }
        };
        if seen.contains(&kind) {
            errors.push("pedigree", format!("duplicate {} entry", kind.as_str()));
            continue;
        }
        seen.push(kind);

        let field = match kind {
            ParentKind::Mother => "mother",
            ParentKind::Father => "father",
        };
        let name = check_name(errors, field, &draft.name);
        if let Some(birth) = draft.birth_date {
            if birth > today {
                errors.push(field, "birth date must not be in the future");
            }
        }
        if let Some(name) = name {
            out.push(PedigreeAttrs {
                kind,
                name,
                breed: draft.breed.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
                birth_date: draft.birth_date,
                description: draft
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            });
        }
    }
    out
}

pub fn validate_review(draft: &ReviewDraft) -> Result<ReviewAttrs> {
    let mut errors = ValidationErrors::new();

    let body = draft.body.trim().to_string();
    if body.is_empty() {
        errors.push("body", "must not be empty");
    } else if body.chars().count() > MAX_REVIEW_CHARS {
        errors.push("body", format!("must be at most {MAX_REVIEW_CHARS} characters"));
    }

    let rating = match draft.rating {
        None => {
            errors.push("rating", "is required");
            0
        }
        Some(r) if !(1..=5).contains(&r) => {
            errors.push("rating", "must be between 1 and 5");
            0
        }
        Some(r) => r,
    };

    errors.into_result()?;
    Ok(ReviewAttrs { body, rating })
}

/// Normalizes and checks an email handle. Returns the lowercase form the
/// store keys on.
pub fn validate_email(raw: &str) -> std::result::Result<String, String> {
    let email = raw.trim().to_lowercase();
    let ok = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if ok {
        Ok(email)
    } else {
        Err("must be a valid email address".to_string())
    }
}

pub fn validate_password(password: &str) -> std::result::Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        Err(format!("must be at least {MIN_PASSWORD_CHARS} characters"))
    } else {
        Ok(())
    }
}

/// Optional contact fields on a profile.
pub fn validate_profile(
    phone: Option<&str>,
    telegram: Option<&str>,
) -> Result<(Option<String>, Option<String>)> {
    let mut errors = ValidationErrors::new();

    let phone = phone.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    if let Some(p) = &phone {
        if p.chars().count() > MAX_PHONE_CHARS {
            errors.push("phone", format!("must be at most {MAX_PHONE_CHARS} characters"));
        }
    }
    let telegram = telegram.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    if let Some(t) = &telegram {
        if t.chars().count() > MAX_TELEGRAM_CHARS {
            errors.push("telegram", format!("must be at most {MAX_TELEGRAM_CHARS} characters"));
        }
    }

    errors.into_result()?;
    Ok((phone, telegram))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, species: &str, age: Option<u32>, birth: Option<NaiveDate>) -> PetDraft {
        PetDraft {
            name: name.into(),
            species: species.into(),
            age,
            birth_date: birth,
            description: "a fine animal".into(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn assert_field(result: Result<(PetAttrs, Vec<PedigreeAttrs>)>, field: &str) {
        match result {
            Err(crate::errors::DomainError::Validation(v)) => {
                assert!(v.contains_field(field), "expected failure on {field}: {v}")
            }
            other => panic!("expected validation failure on {field}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_plain_and_hyphenated_names() {
        for name in ["Rex", "Rex-the Great", "Мурка"] {
            let result = validate_pet_submission(&draft(name, "dog", Some(3), None), &[], today());
            assert!(result.is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn rejects_digits_and_punctuation_in_names() {
        for name in ["Rex123", "Rex!", ""] {
            assert_field(
                validate_pet_submission(&draft(name, "dog", Some(3), None), &[], today()),
                "name",
            );
        }
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "a".repeat(MAX_NAME_CHARS + 1);
        assert_field(
            validate_pet_submission(&draft(&name, "dog", Some(3), None), &[], today()),
            "name",
        );
    }

    #[test]
    fn rejects_unknown_species() {
        assert_field(
            validate_pet_submission(&draft("Rex", "dragon", Some(3), None), &[], today()),
            "species",
        );
    }

    #[test]
    fn age_bounds_are_inclusive() {
        for age in [1, 100] {
            assert!(
                validate_pet_submission(&draft("Rex", "dog", Some(age), None), &[], today()).is_ok()
            );
        }
        for age in [0, 101] {
            assert_field(
                validate_pet_submission(&draft("Rex", "dog", Some(age), None), &[], today()),
                "age",
            );
        }
    }

    #[test]
    fn age_is_required() {
        assert_field(
            validate_pet_submission(&draft("Rex", "dog", None, None), &[], today()),
            "age",
        );
    }

    #[test]
    fn birth_date_must_not_be_in_the_future() {
        let tomorrow = today().succ_opt().unwrap();
        assert_field(
            validate_pet_submission(&draft("Rex", "dog", Some(1), Some(tomorrow)), &[], today()),
            "birth_date",
        );
    }

    #[test]
    fn age_must_match_birth_date_within_tolerance() {
        let ten_years_ago = NaiveDate::from_ymd_opt(2015, 6, 15).unwrap();
        // computed age 10, stored 3: far outside the tolerance
        assert_field(
            validate_pet_submission(
                &draft("Rex", "dog", Some(3), Some(ten_years_ago)),
                &[],
                today(),
            ),
            "age",
        );
        // off by exactly one year is accepted
        for age in [9, 10, 11] {
            assert!(validate_pet_submission(
                &draft("Rex", "dog", Some(age), Some(ten_years_ago)),
                &[],
                today(),
            )
            .is_ok());
        }
        assert_field(
            validate_pet_submission(
                &draft("Rex", "dog", Some(12), Some(ten_years_ago)),
                &[],
                today(),
            ),
            "age",
        );
    }

    #[test]
    fn computed_age_respects_month_and_day() {
        let birth = NaiveDate::from_ymd_opt(2020, 7, 1).unwrap();
        // birthday not yet reached this year
        assert_eq!(age_from_birth(birth, today()), 4);
        let birth = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        // birthday is today
        assert_eq!(age_from_birth(birth, today()), 5);
    }

    #[test]
    fn collects_multiple_failures_at_once() {
        let result =
            validate_pet_submission(&draft("Rex123", "dragon", Some(0), None), &[], today());
        match result {
            Err(crate::errors::DomainError::Validation(v)) => {
                assert!(v.contains_field("name"));
                assert!(v.contains_field("species"));
                assert!(v.contains_field("age"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    fn parent(kind: &str, name: &str) -> PedigreeDraft {
        PedigreeDraft {
            kind: kind.into(),
            name: name.into(),
            breed: None,
            birth_date: None,
            description: None,
        }
    }

    #[test]
    fn pedigree_accepts_one_entry_per_parent() {
        let result = validate_pet_submission(
            &draft("Rex", "dog", Some(3), None),
            &[parent("mother", "Lassie"), parent("father", "Bolt")],
            today(),
        );
        let (_, entries) = result.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn pedigree_rejects_third_entry_and_duplicate_kind() {
        assert_field(
            validate_pet_submission(
                &draft("Rex", "dog", Some(3), None),
                &[
                    parent("mother", "Lassie"),
                    parent("father", "Bolt"),
                    parent("mother", "Extra"),
                ],
                today(),
            ),
            "pedigree",
        );
        assert_field(
            validate_pet_submission(
                &draft("Rex", "dog", Some(3), None),
                &[parent("mother", "Lassie"), parent("mother", "Other")],
                today(),
            ),
            "pedigree",
        );
    }

    #[test]
    fn pedigree_names_follow_the_name_rule() {
        assert_field(
            validate_pet_submission(
                &draft("Rex", "dog", Some(3), None),
                &[parent("mother", "La55ie")],
                today(),
            ),
            "mother",
        );
    }

    #[test]
    fn review_bounds() {
        let ok = ReviewDraft {
            body: "x".repeat(500),
            rating: Some(3),
        };
        assert!(validate_review(&ok).is_ok());

        let too_long = ReviewDraft {
            body: "x".repeat(MAX_REVIEW_CHARS + 1),
            rating: Some(3),
        };
        assert!(validate_review(&too_long).is_err());

        for rating in [0, 6] {
            let bad = ReviewDraft {
                body: "fine".into(),
                rating: Some(rating),
            };
            assert!(validate_review(&bad).is_err());
        }

        let blank = ReviewDraft {
            body: "   ".into(),
            rating: Some(3),
        };
        assert!(validate_review(&blank).is_err());
    }

    #[test]
    fn email_normalization() {
        assert_eq!(
            validate_email("  Jane@Example.COM ").unwrap(),
            "jane@example.com"
        );
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane@localhost").is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("hunter2").is_err());
        assert!(validate_password("hunter2hunter2").is_ok());
    }

    #[test]
    fn profile_fields_are_trimmed_and_bounded() {
        let (phone, telegram) = validate_profile(Some("  "), Some(" @rex ")).unwrap();
        assert_eq!(phone, None);
        assert_eq!(telegram.as_deref(), Some("@rex"));

        let long = "9".repeat(MAX_PHONE_CHARS + 1);
        assert!(validate_profile(Some(&long), None).is_err());
    }
}
