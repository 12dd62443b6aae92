// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent responses.
//!
//! Page handlers recover from the form-level errors (duplicate identity, bad
//! credentials, validation, provider failures) themselves and re-render the
//! originating form. Whatever reaches `IntoResponse` is either an
//! authorization failure, which becomes a redirect carrying a flash message,
//! a form body axum could not extract, or a JSON error body.

use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::middleware::auth::AuthzFailure;
use crate::services::gateway::GatewayError;
use crate::services::normalizer::MalformedPayload;
use crate::views::flash_cookie;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Username or email already taken")]
    DuplicateIdentity,

    #[error("Invalid username/password")]
    AuthenticationFailure,

    /// Authorization failure on a page route (redirect with flash message).
    #[error("{0}")]
    Authorization(AuthzFailure),

    /// Authorization failure on a JSON route (401/403 body).
    #[error("{0}")]
    ApiAuthorization(AuthzFailure),

    #[error("Invalid request: {0}")]
    Validation(String),

    /// Form body could not be extracted; axum's own response is kept.
    #[error("Invalid form: {0}")]
    Form(#[from] FormRejection),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    MalformedPayload(#[from] MalformedPayload),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message shown to the user when a search fails at the provider.
    pub fn search_failure_message(&self) -> String {
        match self {
            AppError::MalformedPayload(_) => {
                "Search failed: unexpected response from provider".to_string()
            }
            AppError::Gateway(GatewayError::NoLocation) => {
                "Search failed: address not found".to_string()
            }
            AppError::Gateway(_) => "Search failed: provider unavailable".to_string(),
            other => format!("Search failed: {}", other),
        }
    }

    /// Whether the error is the provider's fault rather than ours.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, AppError::MalformedPayload(_) | AppError::Gateway(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::DuplicateIdentity;
            }
        }
        AppError::Database(err.to_string())
    }
}

impl From<AuthzFailure> for AppError {
    fn from(failure: AuthzFailure) -> Self {
        AppError::Authorization(failure)
    }
}

/// JSON error response body
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Form(rejection) = self {
            tracing::debug!(error = %rejection, "Form rejected");
            return rejection.into_response();
        }

        let (status, error, details) = match &self {
            AppError::Authorization(failure) => {
                tracing::warn!(kind = failure.code(), "Authorization failure");
                let jar = CookieJar::new().add(flash_cookie(failure.message()));
                return (jar, Redirect::to(&failure.redirect_target())).into_response();
            }
            AppError::DuplicateIdentity => {
                (StatusCode::CONFLICT, "duplicate_identity", Some(self.to_string()))
            }
            AppError::AuthenticationFailure => (
                StatusCode::UNAUTHORIZED,
                "authentication_failure",
                Some(self.to_string()),
            ),
            AppError::ApiAuthorization(failure) => {
                tracing::warn!(kind = failure.code(), "Authorization failure");
                let status = match failure {
                    AuthzFailure::NotLoggedIn => StatusCode::UNAUTHORIZED,
                    AuthzFailure::WrongOwner { .. } | AuthzFailure::NotAdmin => {
                        StatusCode::FORBIDDEN
                    }
                };
                (status, failure.code(), Some(failure.message().to_string()))
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::Form(rejection) => (rejection.status(), "bad_request", None),
            AppError::MalformedPayload(err) => {
                tracing::warn!(error = %err, "Malformed provider payload");
                (StatusCode::BAD_GATEWAY, "malformed_payload", None)
            }
            AppError::Gateway(err) => {
                tracing::warn!(error = %err, "Provider request failed");
                (StatusCode::BAD_GATEWAY, "gateway_error", Some(err.to_string()))
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
