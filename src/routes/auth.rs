// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and logout routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{end_session, start_session, Session};
use crate::models::NewUser;
use crate::views::{redirect_with_flash, trim_in_place, validation_messages, Page};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

/// Registration form. The password is never echoed back to the page.
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 20, message = "Username must be 1-20 characters"))]
    pub username: String,
    #[serde(skip_serializing)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(
        email(message = "Enter a valid e-mail address"),
        length(max = 50, message = "E-mail must be at most 50 characters")
    )]
    pub email: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(skip_serializing)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl RegisterForm {
    /// Trim everything but the password, so validation sees what is stored.
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

impl LoginForm {
    fn trimmed(mut self) -> Self {
        trim_in_place(&mut self.username);
        self
    }
}

async fn register_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    if session.is_authenticated() {
        return Ok(redirect_with_flash(jar, "/search", "Already registered"));
    }

    Page::new("register.html")
        .with("form", &RegisterForm::default())
        .render(&state.views, &session, jar)
}

async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if session.is_authenticated() {
        return Ok(redirect_with_flash(jar, "/search", "Already registered"));
    }

    let form = form.trimmed();
    if let Err(errors) = form.validate() {
        return Page::new("register.html")
            .with("form", &form)
            .errors(validation_messages(&errors))
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .render(&state.views, &session, jar);
    }

    let new_user = NewUser {
        username: form.username.clone(),
        password: form.password.clone(),
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        email: form.email.clone(),
        // Administrators are only created by the seed tool.
        is_admin: false,
    };

    let user = match state.db.register(new_user).await {
        Ok(user) => user,
        Err(err @ AppError::DuplicateIdentity) => {
            tracing::info!(username = %form.username, "Registration rejected: identity taken");
            return Page::new("register.html")
                .with("form", &form)
                .error(err.to_string())
                .status(StatusCode::CONFLICT)
                .render(&state.views, &session, jar);
        }
        Err(err) => return Err(err),
    };

    let jar = start_session(jar, user.id, &state)?;
    Ok(redirect_with_flash(
        jar,
        &format!("/users/{}", user.id),
        "Account Created!",
    ))
}

async fn login_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    Page::new("login.html")
        .with("form", &LoginForm::default())
        .render(&state.views, &session, jar)
}

async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let form = form.trimmed();
    if let Err(errors) = form.validate() {
        return Page::new("login.html")
            .with("form", &form)
            .errors(validation_messages(&errors))
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .render(&state.views, &session, jar);
    }

    match state.db.authenticate(&form.username, &form.password).await? {
        Some(user) => {
            tracing::info!(user_id = user.id, "User logged in");
            let jar = start_session(jar, user.id, &state)?;
            Ok((jar, Redirect::to("/search")).into_response())
        }
        None => {
            tracing::info!(username = %form.username, "Login failed");
            Page::new("login.html")
                .with("form", &form)
                .error(AppError::AuthenticationFailure.to_string())
                .status(StatusCode::UNAUTHORIZED)
                .render(&state.views, &session, jar)
        }
    }
}

async fn logout(session: Session, jar: CookieJar) -> Response {
    if let Some(user) = session.user() {
        tracing::info!(user_id = user.id, "User logged out");
    }
    redirect_with_flash(end_session(jar), "/login", "Logout Successful")
}
