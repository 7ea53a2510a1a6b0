//! Askama template structs. Handlers precompute plain strings and
//! booleans so the templates stay free of logic beyond loops and
//! branches.

use askama::Template;

use domains::{Identity, Species};

use crate::forms::PetForm;

/// The navigation strip every page carries.
pub struct Nav {
    pub viewer_email: Option<String>,
    pub is_staff: bool,
}

impl Nav {
    pub fn for_viewer(viewer: Option<&Identity>) -> Self {
        Nav {
            viewer_email: viewer.map(|v| v.email.clone()),
            is_staff: viewer.is_some_and(|v| v.role.is_staff()),
        }
    }
}

pub struct SpeciesOption {
    pub value: &'static str,
    pub selected: bool,
}

pub fn species_options(selected: &str) -> Vec<SpeciesOption> {
    Species::ALL
        .iter()
        .map(|species| SpeciesOption {
            value: species.as_str(),
            selected: species.as_str() == selected,
        })
        .collect()
}

pub struct PetRow {
    pub id: String,
    pub name: String,
    pub species: &'static str,
    pub age: u32,
}

pub struct Pager {
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
}

pub struct Section {
    pub rows: Vec<PetRow>,
    pub pager: Pager,
}

pub struct FilterForm {
    pub name: String,
    pub species: String,
    pub age_min: String,
    pub age_max: String,
    pub owner: String,
    pub last_month: bool,
    pub species_options: Vec<SpeciesOption>,
}

#[derive(Template)]
#[template(path = "pet_list.html")]
pub struct PetListTemplate {
    pub nav: Nav,
    pub filters: FilterForm,
    pub show_owner_filter: bool,
    pub can_create: bool,
    pub active: Section,
    pub inactive: Option<Section>,
}

pub struct PedigreeRow {
    pub kind: &'static str,
    pub name: String,
    pub breed: String,
    pub birth_date: String,
    pub description: String,
}

pub struct ReviewRow {
    pub rating: u8,
    pub body: String,
    pub created_at: String,
}

pub struct ReviewFormView {
    pub body: String,
    pub rating: String,
}

#[derive(Template)]
#[template(path = "pet_detail.html")]
pub struct PetDetailTemplate {
    pub nav: Nav,
    pub id: String,
    pub name: String,
    pub species: &'static str,
    pub age: u32,
    pub birth_date: String,
    pub description: String,
    pub owner_email: String,
    pub is_active: bool,
    pub view_count: u64,
    pub created_at: String,
    pub pedigree: Vec<PedigreeRow>,
    pub reviews: Vec<ReviewRow>,
    pub can_edit: bool,
    pub can_toggle: bool,
    pub can_review: bool,
    pub review_form: ReviewFormView,
    pub review_errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "pet_form.html")]
pub struct PetFormTemplate {
    pub nav: Nav,
    pub heading: String,
    pub action: String,
    pub errors: Vec<String>,
    pub form: PetForm,
    pub species_options: Vec<SpeciesOption>,
    /// Field names this editor cannot touch; rendered as a note below
    /// the form.
    pub locked_fields: &'static [&'static str],
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub errors: Vec<String>,
    pub email: String,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub errors: Vec<String>,
    pub email: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub email: String,
    pub role: &'static str,
    pub phone: String,
    pub telegram: String,
    pub profile_errors: Vec<String>,
    pub password_errors: Vec<String>,
    pub notice: Option<String>,
}

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub role: &'static str,
    pub is_active: bool,
}

#[derive(Template)]
#[template(path = "user_list.html")]
pub struct UserListTemplate {
    pub nav: Nav,
    pub users: Vec<UserRow>,
}

#[derive(Template)]
#[template(path = "user_detail.html")]
pub struct UserDetailTemplate {
    pub nav: Nav,
    pub email: String,
    pub role: &'static str,
    pub phone: String,
    pub telegram: String,
    pub is_active: bool,
}
