// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Create the schema and the initial administrator.
//!
//! Registration never grants admin rights, so the first administrator comes
//! from here. Reads `DATABASE_URL` plus `SEED_ADMIN_USERNAME`,
//! `SEED_ADMIN_PASSWORD` and `SEED_ADMIN_EMAIL`.

use anyhow::Context;
use hike_finder::{db::Db, error::AppError, models::NewUser};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://hikefinder.db?mode=rwc".to_string());
    let db = Db::connect(&database_url).await?;
    db.migrate().await?;

    let admin = NewUser {
        username: seed_var("SEED_ADMIN_USERNAME")?,
        password: seed_var("SEED_ADMIN_PASSWORD")?,
        first_name: env::var("SEED_ADMIN_FIRST_NAME").unwrap_or_else(|_| "Site".to_string()),
        last_name: env::var("SEED_ADMIN_LAST_NAME").unwrap_or_else(|_| "Admin".to_string()),
        email: seed_var("SEED_ADMIN_EMAIL")?,
        is_admin: true,
    };

    match db.register(admin).await {
        Ok(user) => tracing::info!(user_id = user.id, username = %user.username, "Created administrator"),
        Err(AppError::DuplicateIdentity) => {
            tracing::info!("Administrator already exists, nothing to do")
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

fn seed_var(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} must be set", name))
}
