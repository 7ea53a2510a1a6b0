//! Route table and the small helpers every handler shares. Handlers
//! follow the same shape: resolve the viewer, let the service decide,
//! translate the outcome into a page or a redirect.

pub mod pets;
pub mod users;

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use domains::DomainError;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pets::list))
        .route("/pets/new", get(pets::new_form).post(pets::create))
        .route("/pets/{id}", get(pets::detail))
        .route("/pets/{id}/edit", get(pets::edit_form).post(pets::update))
        .route("/pets/{id}/delete", post(pets::delete))
        .route("/pets/{id}/toggle", post(pets::toggle))
        .route("/pets/{id}/reviews", post(pets::review_create))
        .route("/users/register", get(users::register_form).post(users::register))
        .route("/users/login", get(users::login_form).post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/profile", get(users::profile).post(users::update_profile))
        .route("/users/profile/password", post(users::change_password))
        .route("/users/profile/reset", post(users::reset_password))
        .route("/users", get(users::user_list))
        .route("/users/{id}", get(users::user_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub(crate) fn render<T: Template>(template: &T) -> Response {
    render_with_status(StatusCode::OK, template)
}

pub(crate) fn render_with_status<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(err) => {
            tracing::error!(%err, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "rendering failed").into_response()
        }
    }
}

/// The fallback mapping for errors no handler treats specially.
pub(crate) fn error_response(err: DomainError) -> Response {
    match err {
        DomainError::NotFound(entity, _) => {
            (StatusCode::NOT_FOUND, format!("{entity} not found")).into_response()
        }
        DomainError::Unauthorized(message) => (StatusCode::FORBIDDEN, message).into_response(),
        DomainError::Conflict(message) => (StatusCode::CONFLICT, message).into_response(),
        DomainError::Validation(errors) => {
            (StatusCode::UNPROCESSABLE_ENTITY, errors.to_string()).into_response()
        }
        DomainError::Internal(message) => {
            tracing::error!(%message, "internal error");
            (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong").into_response()
        }
    }
}

/// Anonymous requests to pages that need an account go to the login form.
pub(crate) fn require_login() -> Response {
    Redirect::to("/users/login").into_response()
}
