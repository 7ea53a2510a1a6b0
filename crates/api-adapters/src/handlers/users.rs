//! Account pages: registration, login/logout, the profile with its
//! password flows, and the staff-only user roster.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use uuid::Uuid;

use domains::{DomainError, Identity};

use crate::forms::{ChangePasswordForm, LoginForm, ProfileForm, RegisterForm};
use crate::session::{clear_session_cookie, identify, session_cookie, session_token};
use crate::state::AppState;
use crate::views::{
    LoginTemplate, Nav, ProfileTemplate, RegisterTemplate, UserDetailTemplate, UserListTemplate,
    UserRow,
};

use super::{error_response, render, render_with_status, require_login};

pub async fn register_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if identify(&state, &headers).await.is_some() {
        return Redirect::to("/").into_response();
    }
    render(&RegisterTemplate {
        nav: Nav::for_viewer(None),
        errors: Vec::new(),
        email: String::new(),
    })
}

pub async fn register(
    State(state): State<AppState>,
    axum::Form(form): axum::Form<RegisterForm>,
) -> Response {
    if let Err(errors) = form.confirm_matches() {
        return register_rejected(&form, errors.messages());
    }

    match state.accounts.register(&form.email, &form.password).await {
        Ok(user) => open_session(&state, &user).await,
        Err(DomainError::Validation(errors)) => register_rejected(&form, errors.messages()),
        Err(DomainError::Conflict(message)) => {
            register_rejected(&form, vec![format!("email: {message}")])
        }
        Err(err) => error_response(err),
    }
}

fn register_rejected(form: &RegisterForm, errors: Vec<String>) -> Response {
    render_with_status(
        StatusCode::UNPROCESSABLE_ENTITY,
        &RegisterTemplate {
            nav: Nav::for_viewer(None),
            errors,
            email: form.email.clone(),
        },
    )
}

pub async fn login_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if identify(&state, &headers).await.is_some() {
        return Redirect::to("/").into_response();
    }
    render(&LoginTemplate {
        nav: Nav::for_viewer(None),
        errors: Vec::new(),
        email: String::new(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    axum::Form(form): axum::Form<LoginForm>,
) -> Response {
    match state.accounts.authenticate(&form.email, &form.password).await {
        Ok(user) => open_session(&state, &user).await,
        Err(DomainError::Unauthorized(message)) => render_with_status(
            StatusCode::UNAUTHORIZED,
            &LoginTemplate {
                nav: Nav::for_viewer(None),
                errors: vec![message],
                email: form.email.clone(),
            },
        ),
        Err(err) => error_response(err),
    }
}

/// Issues the session cookie and lands on the listing page.
async fn open_session(state: &AppState, user: &Identity) -> Response {
    let token = match state.sessions.open(user.id).await {
        Ok(token) => token,
        Err(err) => return error_response(err),
    };
    redirect_with_cookie("/", &session_cookie(&token))
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(err) = state.sessions.close(&token).await {
            return error_response(err);
        }
    }
    redirect_with_cookie("/", &clear_session_cookie())
}

fn redirect_with_cookie(location: &str, cookie: &str) -> Response {
    let mut response = Redirect::to(location).into_response();
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
            response
        }
        Err(_) => error_response(DomainError::Internal("cookie assembly failed".into())),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileQuery {
    ok: String,
}

pub async fn profile(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    let notice = match query.ok.as_str() {
        "profile" => Some("Profile updated.".to_string()),
        "password" => Some("Password changed.".to_string()),
        "reset" => Some("A new password was sent to your email.".to_string()),
        _ => None,
    };
    render(&profile_template(&viewer, Vec::new(), Vec::new(), notice))
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Form(form): axum::Form<ProfileForm>,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    match state
        .accounts
        .update_profile(&viewer, Some(&form.phone), Some(&form.telegram))
        .await
    {
        Ok(_) => Redirect::to("/users/profile?ok=profile").into_response(),
        Err(DomainError::Validation(errors)) => render_with_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            &profile_template(&viewer, errors.messages(), Vec::new(), None),
        ),
        Err(err) => error_response(err),
    }
}

pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Form(form): axum::Form<ChangePasswordForm>,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };

    let outcome = match form.confirm_matches() {
        Ok(()) => {
            state
                .accounts
                .change_password(&viewer, &form.old_password, &form.new_password)
                .await
        }
        Err(errors) => Err(DomainError::Validation(errors)),
    };

    match outcome {
        Ok(()) => Redirect::to("/users/profile?ok=password").into_response(),
        Err(DomainError::Validation(errors)) => render_with_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            &profile_template(&viewer, Vec::new(), errors.messages(), None),
        ),
        Err(err) => error_response(err),
    }
}

pub async fn reset_password(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    match state.accounts.reset_password(&viewer).await {
        Ok(()) => Redirect::to("/users/profile?ok=reset").into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn user_list(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    match state.accounts.list_users(&viewer).await {
        Ok(users) => render(&UserListTemplate {
            nav: Nav::for_viewer(Some(&viewer)),
            users: users
                .iter()
                .map(|user| UserRow {
                    id: user.id.to_string(),
                    email: user.email.clone(),
                    role: user.role.as_str(),
                    is_active: user.is_active,
                })
                .collect(),
        }),
        Err(err) => error_response(err),
    }
}

pub async fn user_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let Some(viewer) = identify(&state, &headers).await else {
        return require_login();
    };
    match state.accounts.get_user(&viewer, id).await {
        Ok(user) => render(&UserDetailTemplate {
            nav: Nav::for_viewer(Some(&viewer)),
            email: user.email.clone(),
            role: user.role.as_str(),
            phone: user.phone.clone().unwrap_or_default(),
            telegram: user.telegram.clone().unwrap_or_default(),
            is_active: user.is_active,
        }),
        Err(err) => error_response(err),
    }
}

fn profile_template(
    viewer: &Identity,
    profile_errors: Vec<String>,
    password_errors: Vec<String>,
    notice: Option<String>,
) -> ProfileTemplate {
    ProfileTemplate {
        nav: Nav::for_viewer(Some(viewer)),
        email: viewer.email.clone(),
        role: viewer.role.as_str(),
        phone: viewer.phone.clone().unwrap_or_default(),
        telegram: viewer.telegram.clone().unwrap_or_default(),
        profile_errors,
        password_errors,
        notice,
    }
}
