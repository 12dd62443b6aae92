// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes: view, edit, change password, delete account.
//!
//! Every change re-checks the current password before touching the store.

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{end_session, require_login, require_owner, Session};
use crate::models::{ProfileUpdate, User};
use crate::views::{redirect_with_flash, trim_in_place, validation_messages, Page};
use crate::AppState;

const INCORRECT_PASSWORD: &str = "Incorrect Password";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/edit", get(edit_form).post(edit))
        .route("/users/password", get(password_form).post(change_password))
        .route("/users/delete", get(delete_form).post(delete))
        .route("/users/{id}", get(show))
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct EditProfileForm {
    #[validate(length(min = 1, max = 20, message = "Username must be 1-20 characters"))]
    pub username: String,
    #[validate(
        email(message = "Enter a valid e-mail address"),
        length(max = 50, message = "E-mail must be at most 50 characters")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    /// Current password, required to confirm the change
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl From<&User> for EditProfileForm {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password: String::new(),
        }
    }
}

impl EditProfileForm {
    fn trimmed(mut self) -> Self {
        for field in [
            &mut self.username,
            &mut self.email,
            &mut self.first_name,
            &mut self.last_name,
        ] {
            trim_in_place(field);
        }
        self
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ChangePasswordForm {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,
    #[validate(length(min = 6, message = "New password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct DeleteAccountForm {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

async fn show(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response> {
    let user = require_owner(&session, user_id)?;

    Page::new("user.html")
        .with("user", user)
        .render(&state.views, &session, jar)
}

async fn edit_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    let user = require_login(&session)?;

    Page::new("edit.html")
        .with("form", &EditProfileForm::from(user))
        .render(&state.views, &session, jar)
}

async fn edit(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    form: std::result::Result<Form<EditProfileForm>, FormRejection>,
) -> Result<Response> {
    let user = require_login(&session)?;
    let form = form?.0.trimmed();
    let page = || Page::new("edit.html").with("form", &form);

    if let Err(errors) = form.validate() {
        return page()
            .errors(validation_messages(&errors))
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .render(&state.views, &session, jar);
    }

    if !state.db.check_password(user, &form.password) {
        return page()
            .error(INCORRECT_PASSWORD)
            .status(StatusCode::UNAUTHORIZED)
            .render(&state.views, &session, jar);
    }

    let update = ProfileUpdate {
        username: form.username.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        email: form.email.clone(),
    };

    match state.db.edit_profile(user.id, update).await {
        Ok(updated) => Ok(redirect_with_flash(
            jar,
            &format!("/users/{}", updated.id),
            "Profile Info Edited",
        )),
        Err(err @ AppError::DuplicateIdentity) => page()
            .error(err.to_string())
            .status(StatusCode::CONFLICT)
            .render(&state.views, &session, jar),
        Err(err) => Err(err),
    }
}

async fn password_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    require_login(&session)?;
    Page::new("password.html").render(&state.views, &session, jar)
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    form: std::result::Result<Form<ChangePasswordForm>, FormRejection>,
) -> Result<Response> {
    let user = require_login(&session)?;
    let Form(form) = form?;

    if let Err(errors) = form.validate() {
        return Page::new("password.html")
            .errors(validation_messages(&errors))
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .render(&state.views, &session, jar);
    }

    if !state.db.check_password(user, &form.old_password) {
        return Page::new("password.html")
            .error(INCORRECT_PASSWORD)
            .status(StatusCode::UNAUTHORIZED)
            .render(&state.views, &session, jar);
    }

    state.db.change_password(user.id, &form.new_password).await?;
    Ok(redirect_with_flash(
        jar,
        &format!("/users/{}", user.id),
        "Password Changed",
    ))
}

async fn delete_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    require_login(&session)?;
    Page::new("delete.html").render(&state.views, &session, jar)
}

async fn delete(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    form: std::result::Result<Form<DeleteAccountForm>, FormRejection>,
) -> Result<Response> {
    let user = require_login(&session)?;
    let Form(form) = form?;

    if let Err(errors) = form.validate() {
        return Page::new("delete.html")
            .errors(validation_messages(&errors))
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .render(&state.views, &session, jar);
    }

    if !state.db.check_password(user, &form.password) {
        return Page::new("delete.html")
            .error(INCORRECT_PASSWORD)
            .status(StatusCode::UNAUTHORIZED)
            .render(&state.views, &session, jar);
    }

    state.db.delete_user(user.id).await?;
    tracing::info!(user_id = user.id, "User deleted own account");

    Ok(redirect_with_flash(
        end_session(jar),
        "/register",
        "Account Deleted",
    ))
}
