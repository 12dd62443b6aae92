// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware and extractors (sessions, security headers).

pub mod auth;
pub mod security;

pub use auth::{require_admin, require_login, require_owner, AuthzFailure, Session};
