// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered pages and flash messages.
//!
//! Templates are compiled into the binary. A flash message lives in its own
//! cookie for exactly one page view: it is set alongside a redirect and
//! removed by the next page rendered.

use crate::error::{AppError, Result};
use crate::middleware::auth::Session;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use std::error::Error as _;
use tera::{Context, Tera};
use validator::ValidationErrors;

/// Name of the cookie carrying a one-shot flash message.
pub const FLASH_COOKIE: &str = "hikefinder_flash";

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("404.html", include_str!("../templates/404.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("user.html", include_str!("../templates/user.html")),
    ("edit.html", include_str!("../templates/edit.html")),
    ("password.html", include_str!("../templates/password.html")),
    ("delete.html", include_str!("../templates/delete.html")),
    ("admin.html", include_str!("../templates/admin.html")),
    ("search.html", include_str!("../templates/search.html")),
    ("past.html", include_str!("../templates/past.html")),
];

/// Compiled page templates.
pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Template error: {}", e)))?;
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            let mut message = format!("Failed to render '{}': {}", template, e);
            let mut source = e.source();
            while let Some(cause) = source {
                message.push_str(&format!(": {}", cause));
                source = cause.source();
            }
            AppError::Internal(anyhow::anyhow!(message))
        })
    }
}

/// A page about to be rendered.
///
/// Every page receives `current_user`, `flash` and `errors` in addition to
/// whatever the handler inserts.
pub struct Page {
    template: &'static str,
    status: StatusCode,
    context: Context,
    errors: Vec<String>,
}

impl Page {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            status: StatusCode::OK,
            context: Context::new(),
            errors: Vec::new(),
        }
    }

    pub fn with<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a message shown above the form.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    pub fn errors(mut self, messages: impl IntoIterator<Item = String>) -> Self {
        self.errors.extend(messages);
        self
    }

    /// Render into a response, consuming any pending flash message.
    pub fn render(mut self, views: &Views, session: &Session, jar: CookieJar) -> Result<Response> {
        let (jar, flash) = take_flash(jar);
        self.context.insert("current_user", &session.user());
        self.context.insert("flash", &flash);
        self.context.insert("errors", &self.errors);

        let body = views.render(self.template, &self.context)?;
        Ok((self.status, jar, Html(body)).into_response())
    }
}

/// Cookie carrying `message` to the next page.
pub fn flash_cookie(message: &str) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, urlencoding::encode(message).into_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Remove the flash cookie from the jar, returning its message.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };

    let message = urlencoding::decode(cookie.value())
        .map(|m| m.into_owned())
        .ok();
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), message)
}

/// Redirect to `to`, flashing `message` on arrival.
pub fn redirect_with_flash(jar: CookieJar, to: &str, message: &str) -> Response {
    (jar.add(flash_cookie(message)), Redirect::to(to)).into_response()
}

/// Flatten form validation errors into user-facing messages.
///
/// Fields are reported in name order so pages are stable.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect()
}

/// Strip surrounding whitespace from a submitted field.
pub fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Username is required"))]
        username: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_all_templates_compile() {
        let views = Views::new().unwrap();
        let mut context = Context::new();
        context.insert("current_user", &None::<User>);
        context.insert("flash", &None::<String>);
        context.insert("errors", &Vec::<String>::new());
        assert!(views.render("404.html", &context).unwrap().contains("Not Found"));
    }

    #[test]
    fn test_flash_roundtrip() {
        let cookie = flash_cookie("Account Created!");
        assert_eq!(cookie.value(), "Account%20Created%21");

        let jar = CookieJar::new().add(cookie);
        let (jar, message) = take_flash(jar);
        assert_eq!(message.as_deref(), Some("Account Created!"));
        assert!(jar.get(FLASH_COOKIE).is_none());

        let (_, message) = take_flash(CookieJar::new());
        assert_eq!(message, None);
    }

    #[test]
    fn test_trim_in_place() {
        let mut padded = "  hiker \t".to_string();
        trim_in_place(&mut padded);
        assert_eq!(padded, "hiker");

        let mut blank = "   ".to_string();
        trim_in_place(&mut blank);
        assert!(blank.is_empty());
    }

    #[test]
    fn test_validation_messages() {
        let form = Form {
            username: String::new(),
            email: "not-an-email".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(
            validation_messages(&errors),
            vec!["email is invalid".to_string(), "Username is required".to_string()]
        );
    }

    #[test]
    fn test_page_renders_flash_and_errors() {
        let views = Views::new().unwrap();
        let jar = CookieJar::new().add(flash_cookie("Logout Successful"));
        let response = Page::new("login.html")
            .with("form", &serde_json::json!({"username": "hiker"}))
            .error("Invalid username/password")
            .status(StatusCode::UNAUTHORIZED)
            .render(&views, &Session::Anonymous, jar)
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
