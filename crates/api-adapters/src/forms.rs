//! Form and query-string structs. Everything arrives as strings, is
//! parsed leniently here, and only the typed drafts cross into the
//! domain. The pet form deliberately has no fields for `is_active`,
//! the owner, or the view counter, so a crafted payload cannot smuggle
//! them in.

use chrono::NaiveDate;
use serde::Deserialize;

use domains::validation::{PedigreeDraft, PetDraft, ReviewDraft};
use domains::{CreatedWindow, ParentKind, PedigreeEntry, Pet, PetFilter, Species, ValidationErrors};

fn parse_date(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: &str,
) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(field, "must be a date like 2020-01-31");
            None
        }
    }
}

fn parse_number(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(field, "must be a whole number");
            None
        }
    }
}

/// The pet create/edit form, pedigree sections included. The two parent
/// sections mirror the two-entry limit: there is nowhere to put a
/// third.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PetForm {
    pub name: String,
    pub species: String,
    pub age: String,
    pub birth_date: String,
    pub description: String,

    pub mother_name: String,
    pub mother_breed: String,
    pub mother_birth_date: String,
    pub mother_description: String,

    pub father_name: String,
    pub father_breed: String,
    pub father_birth_date: String,
    pub father_description: String,
}

impl PetForm {
    /// Prefills the form from a stored pet for the edit page.
    pub fn from_pet(pet: &Pet, pedigree: &[PedigreeEntry]) -> Self {
        let mut form = PetForm {
            name: pet.name.clone(),
            species: pet.species.as_str().to_string(),
            age: pet.age.to_string(),
            birth_date: pet
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            description: pet.description.clone(),
            ..Default::default()
        };
        for entry in pedigree {
            let (name, breed, birth, description) = match entry.kind {
                ParentKind::Mother => (
                    &mut form.mother_name,
                    &mut form.mother_breed,
                    &mut form.mother_birth_date,
                    &mut form.mother_description,
                ),
                ParentKind::Father => (
                    &mut form.father_name,
                    &mut form.father_breed,
                    &mut form.father_birth_date,
                    &mut form.father_description,
                ),
            };
            *name = entry.name.clone();
            *breed = entry.breed.clone().unwrap_or_default();
            *birth = entry
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            *description = entry.description.clone().unwrap_or_default();
        }
        form
    }

    /// Parses the raw strings into domain drafts. Only wire-level
    /// problems (unparseable numbers and dates) are reported here; the
    /// field rules belong to domain validation.
    pub fn into_drafts(&self) -> Result<(PetDraft, Vec<PedigreeDraft>), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let age = parse_number(&mut errors, "age", &self.age);
        let birth_date = parse_date(&mut errors, "birth_date", &self.birth_date);

        let mut pedigree = Vec::new();
        if self.has_parent_input(ParentKind::Mother) {
            let birth = parse_date(&mut errors, "mother", &self.mother_birth_date);
            pedigree.push(PedigreeDraft {
                kind: "mother".into(),
                name: self.mother_name.clone(),
                breed: non_empty(&self.mother_breed),
                birth_date: birth,
                description: non_empty(&self.mother_description),
            });
        }
        if self.has_parent_input(ParentKind::Father) {
            let birth = parse_date(&mut errors, "father", &self.father_birth_date);
            pedigree.push(PedigreeDraft {
                kind: "father".into(),
                name: self.father_name.clone(),
                breed: non_empty(&self.father_breed),
                birth_date: birth,
                description: non_empty(&self.father_description),
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok((
            PetDraft {
                name: self.name.clone(),
                species: self.species.clone(),
                age,
                birth_date,
                description: self.description.clone(),
            },
            pedigree,
        ))
    }

    fn has_parent_input(&self, kind: ParentKind) -> bool {
        let fields = match kind {
            ParentKind::Mother => [
                &self.mother_name,
                &self.mother_breed,
                &self.mother_birth_date,
                &self.mother_description,
            ],
            ParentKind::Father => [
                &self.father_name,
                &self.father_breed,
                &self.father_birth_date,
                &self.father_description,
            ],
        };
        fields.iter().any(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub body: String,
    pub rating: String,
}

impl ReviewForm {
    pub fn into_draft(&self) -> Result<ReviewDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let rating = parse_number(&mut errors, "rating", &self.rating);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ReviewDraft {
            body: self.body.clone(),
            rating: rating.and_then(|r| u8::try_from(r).ok()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterForm {
    /// The confirm field is a wire concern; it never reaches the domain.
    pub fn confirm_matches(&self) -> Result<(), ValidationErrors> {
        if self.password == self.password_confirm {
            Ok(())
        } else {
            let mut errors = ValidationErrors::new();
            errors.push("password_confirm", "does not match the password");
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub phone: String,
    pub telegram: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordForm {
    pub old_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

impl ChangePasswordForm {
    pub fn confirm_matches(&self) -> Result<(), ValidationErrors> {
        if self.new_password == self.new_password_confirm {
            Ok(())
        } else {
            let mut errors = ValidationErrors::new();
            errors.push("new_password_confirm", "does not match the new password");
            Err(errors)
        }
    }
}

/// The listing filter/pager query string. Invalid values degrade to
/// "no filter" instead of failing the page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub name: String,
    pub species: String,
    pub age_min: String,
    pub age_max: String,
    pub owner: String,
    pub window: String,
    pub page: String,
    pub inactive_page: String,
}

impl ListQuery {
    pub fn filter(&self) -> PetFilter {
        PetFilter {
            name: non_empty(&self.name),
            species: Species::parse(self.species.trim()),
            age_min: self.age_min.trim().parse().ok(),
            age_max: self.age_max.trim().parse().ok(),
            owner_email: non_empty(&self.owner),
            window: (self.window.trim() == "last_month").then_some(CreatedWindow::LastMonth),
        }
    }

    pub fn active_page(&self) -> u32 {
        self.page.trim().parse().unwrap_or(1)
    }

    pub fn inactive_page(&self) -> u32 {
        self.inactive_page.trim().parse().unwrap_or(1)
    }

    /// Rebuilds the query string with one of the page parameters
    /// swapped, so the two pagers move independently.
    pub fn href_with_page(&self, param: PageParam, number: u32) -> String {
        let (page, inactive_page) = match param {
            PageParam::Active => (number.to_string(), self.inactive_page.clone()),
            PageParam::Inactive => (self.page.clone(), number.to_string()),
        };
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        for (key, value) in [
            ("name", self.name.as_str()),
            ("species", self.species.as_str()),
            ("age_min", self.age_min.as_str()),
            ("age_max", self.age_max.as_str()),
            ("owner", self.owner.as_str()),
            ("window", self.window.as_str()),
            ("page", page.as_str()),
            ("inactive_page", inactive_page.as_str()),
        ] {
            if !value.trim().is_empty() {
                pairs.push((key, value));
            }
        }
        let encoded: Vec<String> = pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", percent_encode(value)))
            .collect();
        format!("/?{}", encoded.join("&"))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PageParam {
    Active,
    Inactive,
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
