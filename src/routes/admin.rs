// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administrator routes.

use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::{require_admin, Session};
use crate::views::{redirect_with_flash, Page};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(list_users))
        .route("/admin/delete/{id}", post(delete_user))
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    require_admin(&session)?;
    let users = state.db.list_users().await?;

    Page::new("admin.html")
        .with("users", &users)
        .render(&state.views, &session, jar)
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    Path(user_id): Path<i64>,
) -> Result<Response> {
    let admin = require_admin(&session)?;

    if user_id == admin.id {
        return Ok(redirect_with_flash(
            jar,
            "/admin",
            "Use Delete account on your profile to remove yourself",
        ));
    }

    if !state.db.delete_user(user_id).await? {
        return Ok(redirect_with_flash(jar, "/admin", "User not found"));
    }

    tracing::info!(admin_id = admin.id, user_id, "Administrator deleted user");
    Ok(redirect_with_flash(jar, "/admin", "User Deleted"))
}
