//! Pet pages: listing, detail with its view-count side effect, the
//! create/edit forms, deletion, the moderation toggle, and reviews.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use uuid::Uuid;

use domains::{policy, DomainError, Identity, PageResult, Pet, PedigreeEntry, Review, Role};
use services::PetListing;

use crate::forms::{ListQuery, PageParam, PetForm, ReviewForm};
use crate::session::identify;
use crate::state::AppState;
use crate::views::{
    species_options, FilterForm, Nav, Pager, PedigreeRow, PetDetailTemplate, PetFormTemplate,
    PetListTemplate, PetRow, ReviewFormView, ReviewRow, Section,
};

use super::{error_response, render, render_with_status, require_login};

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    let viewer = identify(&state, &headers).await;

    let listing: PetListing = match state
        .pets
        .list(
            viewer.as_ref(),
            query.filter(),
            query.active_page(),
            query.inactive_page(),
        )
        .await
    {
        Ok(listing) => listing,
        Err(err) => return error_response(err),
    };

    let template = PetListTemplate {
        nav: Nav::for_viewer(viewer.as_ref()),
        show_owner_filter: viewer.as_ref().is_some_and(|v| v.role == Role::Admin),
        can_create: viewer.is_some(),
        filters: filter_form(&query),
        active: section(&listing.active, &query, PageParam::Active),
        inactive: listing
            .inactive
            .as_ref()
            .map(|page| section(page, &query, PageParam::Inactive)),
    };
    render(&template)
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let viewer = identify(&state, &headers).await;

    let (pet, pedigree) = match state.pets.view(id, viewer.as_ref()).await {
        Ok(loaded) => loaded,
        Err(err) => return error_response(err),
    };
    let reviews = match state.reviews.list_for_pet(id).await {
        Ok(reviews) => reviews,
        Err(err) => return error_response(err),
    };
    let owner_email = owner_email(&state, &pet).await;

    render(&detail_template(
        &pet,
        &pedigree,
        &reviews,
        owner_email,
        viewer.as_ref(),
        ReviewFormView {
            body: String::new(),
            rating: String::new(),
        },
        Vec::new(),
    ))
}

pub async fn new_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    render(&form_template(&viewer, None, PetForm::default(), Vec::new()))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Form(form): axum::Form<PetForm>,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };

    let (draft, pedigree) = match form.into_drafts() {
        Ok(parsed) => parsed,
        Err(errors) => {
            return render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                &form_template(&viewer, None, form, errors.messages()),
            )
        }
    };

    match state.pets.create(&viewer, draft, pedigree).await {
        Ok(pet) => Redirect::to(&format!("/pets/{}", pet.id)).into_response(),
        Err(DomainError::Validation(errors)) => render_with_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            &form_template(&viewer, None, form, errors.messages()),
        ),
        Err(err) => error_response(err),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    match state.pets.for_edit(id, &viewer).await {
        Ok((pet, pedigree)) => {
            let form = PetForm::from_pet(&pet, &pedigree);
            render(&form_template(&viewer, Some(&pet), form, Vec::new()))
        }
        Err(err) => error_response(err),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    axum::Form(form): axum::Form<PetForm>,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };

    let stored = match state.pets.for_edit(id, &viewer).await {
        Ok((pet, _)) => pet,
        Err(err) => return error_response(err),
    };

    let (draft, pedigree) = match form.into_drafts() {
        Ok(parsed) => parsed,
        Err(errors) => {
            return render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                &form_template(&viewer, Some(&stored), form, errors.messages()),
            )
        }
    };

    match state.pets.update(id, &viewer, draft, pedigree).await {
        Ok(pet) => Redirect::to(&format!("/pets/{}", pet.id)).into_response(),
        Err(DomainError::Validation(errors)) => render_with_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            &form_template(&viewer, Some(&stored), form, errors.messages()),
        ),
        Err(err) => error_response(err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    match state.pets.delete(id, &viewer).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    match state.pets.toggle_active(id, &viewer).await {
        Ok(pet) => Redirect::to(&format!("/pets/{}", pet.id)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn review_create(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    axum::Form(form): axum::Form<ReviewForm>,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };

    let outcome = match form.into_draft() {
        Ok(draft) => state.reviews.create(id, &viewer, draft).await,
        Err(errors) => Err(DomainError::Validation(errors)),
    };

    match outcome {
        Ok(_) => Redirect::to(&format!("/pets/{id}")).into_response(),
        Err(DomainError::Validation(errors)) => {
            // Re-render the detail page with the rejected submission.
            let (pet, pedigree) = match state.pets.view(id, Some(&viewer)).await {
                Ok(loaded) => loaded,
                Err(err) => return error_response(err),
            };
            let reviews = state.reviews.list_for_pet(id).await.unwrap_or_default();
            let owner_email = owner_email(&state, &pet).await;
            render_with_status(
                StatusCode::UNPROCESSABLE_ENTITY,
                &detail_template(
                    &pet,
                    &pedigree,
                    &reviews,
                    owner_email,
                    Some(&viewer),
                    ReviewFormView {
                        body: form.body.clone(),
                        rating: form.rating.clone(),
                    },
                    errors.messages(),
                ),
            )
        }
        Err(err) => error_response(err),
    }
}

async fn owner_email(state: &AppState, pet: &Pet) -> String {
    state
        .accounts
        .find(pet.owner_id)
        .await
        .ok()
        .flatten()
        .map(|owner| owner.email)
        .unwrap_or_default()
}

fn filter_form(query: &ListQuery) -> FilterForm {
    FilterForm {
        name: query.name.clone(),
        species: query.species.clone(),
        age_min: query.age_min.clone(),
        age_max: query.age_max.clone(),
        owner: query.owner.clone(),
        last_month: query.window.trim() == "last_month",
        species_options: species_options(query.species.trim()),
    }
}

fn section(page: &PageResult<Pet>, query: &ListQuery, param: PageParam) -> Section {
    let rows = page
        .items
        .iter()
        .map(|pet| PetRow {
            id: pet.id.to_string(),
            name: pet.name.clone(),
            species: pet.species.as_str(),
            age: pet.age,
        })
        .collect();
    Section {
        rows,
        pager: Pager {
            page: page.page,
            pages: page.pages,
            total: page.total,
            prev_href: page
                .has_prev()
                .then(|| query.href_with_page(param, page.page - 1)),
            next_href: page
                .has_next()
                .then(|| query.href_with_page(param, page.page + 1)),
        },
    }
}

fn form_template(
    viewer: &Identity,
    pet: Option<&Pet>,
    form: PetForm,
    errors: Vec<String>,
) -> PetFormTemplate {
    let (heading, action) = match pet {
        Some(pet) => (format!("Edit {}", pet.name), format!("/pets/{}/edit", pet.id)),
        None => ("Add a pet".to_string(), "/pets/new".to_string()),
    };
    let species_selected = form.species.trim().to_string();
    PetFormTemplate {
        nav: Nav::for_viewer(Some(viewer)),
        heading,
        action,
        errors,
        form,
        species_options: species_options(&species_selected),
        locked_fields: policy::restricted_fields(viewer),
    }
}

fn detail_template(
    pet: &Pet,
    pedigree: &[PedigreeEntry],
    reviews: &[Review],
    owner_email: String,
    viewer: Option<&Identity>,
    review_form: ReviewFormView,
    review_errors: Vec<String>,
) -> PetDetailTemplate {
    let can_edit = viewer.is_some_and(|v| policy::can_edit(v, pet));
    let can_toggle = viewer.is_some_and(policy::can_toggle_active);
    let can_review = viewer.is_some_and(|v| v.id != pet.owner_id);

    PetDetailTemplate {
        nav: Nav::for_viewer(viewer),
        id: pet.id.to_string(),
        name: pet.name.clone(),
        species: pet.species.as_str(),
        age: pet.age,
        birth_date: pet
            .birth_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        description: pet.description.clone(),
        owner_email,
        is_active: pet.is_active,
        view_count: pet.view_count,
        created_at: pet.created_at.format("%Y-%m-%d %H:%M").to_string(),
        pedigree: pedigree
            .iter()
            .map(|entry| PedigreeRow {
                kind: entry.kind.as_str(),
                name: entry.name.clone(),
                breed: entry.breed.clone().unwrap_or_default(),
                birth_date: entry
                    .birth_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                description: entry.description.clone().unwrap_or_default(),
            })
            .collect(),
        reviews: reviews
            .iter()
            .map(|review| ReviewRow {
                rating: review.rating,
                body: review.body.clone(),
                created_at: review.created_at.format("%Y-%m-%d").to_string(),
            })
            .collect(),
        can_edit,
        can_toggle,
        can_review,
        review_form,
        review_errors,
    }
}
