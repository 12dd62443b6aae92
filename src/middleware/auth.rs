// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session resolution and authorization guards.
//!
//! Every request carries an explicit [`Session`] value resolved from the
//! session cookie. Handlers pass it to [`require_login`], [`require_owner`] or
//! [`require_admin`] before touching protected resources.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "hikefinder_session";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
}

/// The per-request view of who is acting.
#[derive(Debug, Clone)]
pub enum Session {
    Anonymous,
    Authenticated(User),
}

impl Session {
    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Session::Anonymous);
        };

        let Some(user_id) = verify_session_token(cookie.value(), &state.config.session_signing_key)
        else {
            tracing::debug!("Ignoring invalid or expired session token");
            return Ok(Session::Anonymous);
        };

        // A token can outlive its account (deleted by an admin).
        match state.db.get_user(user_id).await? {
            Some(user) => Ok(Session::Authenticated(user)),
            None => {
                tracing::debug!(user_id, "Session refers to a deleted user");
                Ok(Session::Anonymous)
            }
        }
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthzFailure {
    #[error("not logged in")]
    NotLoggedIn,

    /// Logged in, but the resource belongs to someone else.
    #[error("logged in as user {user_id} but not the owner")]
    WrongOwner { user_id: i64 },

    #[error("logged in but not an administrator")]
    NotAdmin,
}

impl AuthzFailure {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthzFailure::NotLoggedIn => "not_logged_in",
            AuthzFailure::WrongOwner { .. } => "wrong_owner",
            AuthzFailure::NotAdmin => "not_admin",
        }
    }

    /// Message flashed to the user.
    pub fn message(&self) -> &'static str {
        match self {
            AuthzFailure::NotLoggedIn => "Please Register First",
            AuthzFailure::WrongOwner { .. } => "You can only access your own profile",
            AuthzFailure::NotAdmin => "Admin access required",
        }
    }

    /// Where the browser is sent after the failure.
    pub fn redirect_target(&self) -> String {
        match self {
            AuthzFailure::NotLoggedIn => "/register".to_string(),
            AuthzFailure::WrongOwner { user_id } => format!("/users/{}", user_id),
            AuthzFailure::NotAdmin => "/search".to_string(),
        }
    }
}

/// Require any logged-in user.
pub fn require_login(session: &Session) -> Result<&User, AuthzFailure> {
    session.user().ok_or(AuthzFailure::NotLoggedIn)
}

/// Require the logged-in user to own the resource.
pub fn require_owner(session: &Session, owner_id: i64) -> Result<&User, AuthzFailure> {
    let user = require_login(session)?;
    if user.id != owner_id {
        return Err(AuthzFailure::WrongOwner { user_id: user.id });
    }
    Ok(user)
}

/// Require a logged-in administrator.
pub fn require_admin(session: &Session) -> Result<&User, AuthzFailure> {
    let user = require_login(session)?;
    if !user.is_admin {
        return Err(AuthzFailure::NotAdmin);
    }
    Ok(user)
}

/// Create a signed session token for a user.
pub fn create_session_token(
    user_id: i64,
    signing_key: &[u8],
    ttl_hours: u64,
) -> anyhow::Result<String> {
    let now = get_current_timestamp();
    let exp = session_ttl_secs(ttl_hours)
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or_else(|| anyhow::anyhow!("session lifetime of {} hours is too long", ttl_hours))?;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

fn session_ttl_secs(ttl_hours: u64) -> Option<u64> {
    ttl_hours.checked_mul(60 * 60)
}

/// Verify a session token and return the user ID it was issued for.
pub fn verify_session_token(token: &str, signing_key: &[u8]) -> Option<i64> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    token_data.claims.sub.parse().ok()
}

/// Session cookie carrying a freshly issued token.
pub fn session_cookie(token: String, secure: bool, ttl_hours: u64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(
            session_ttl_secs(ttl_hours)
                .and_then(|secs| i64::try_from(secs).ok())
                .unwrap_or(i64::MAX),
        ))
        .build()
}

/// Start a session: issue a token for `user_id` and add it to the jar.
pub fn start_session(
    jar: CookieJar,
    user_id: i64,
    state: &AppState,
) -> crate::error::Result<CookieJar> {
    let token = create_session_token(
        user_id,
        &state.config.session_signing_key,
        state.config.session_ttl_hours,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Session token creation failed: {}", e)))?;

    Ok(jar.add(session_cookie(
        token,
        state.config.secure_cookies(),
        state.config.session_ttl_hours,
    )))
}

/// End a session by removing the session cookie.
pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
