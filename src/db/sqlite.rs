// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (registration, credentials, profile edits, deletion)
//! - Searches (one row per result of a nearby-trail search)

use crate::error::{AppError, Result};
use crate::models::{NewUser, ProfileUpdate, SearchRecord, SearchResultCandidate, User};
use crate::services::password::{hash_password, verify_password};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

const USER_COLUMNS: &str = "id, username, password_hash, first_name, last_name, email, is_admin";
const SEARCH_COLUMNS: &str = "id, user_id, name, address, radius, place_id, timestamp";

/// SQLite database handle.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (creating if needed) the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Database(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        tracing::info!(url, "Connected to SQLite");
        Ok(Self { pool })
    }

    /// Private in-memory database with the schema applied, for tests.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Database(e.to_string()))?
            .foreign_keys(true);

        // Every connection to :memory: is a separate database, so keep
        // exactly one alive for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ─── Users ───────────────────────────────────────────────────

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// All users, in registration order.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Create a user with a freshly hashed password.
    ///
    /// Fails with `DuplicateIdentity` if the username or email is taken, in
    /// which case nothing is written.
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let password_hash = hash_password(&new_user.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, first_name, last_name, email, is_admin) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.username)
        .bind(&password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(new_user.is_admin)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = user.id, is_admin = user.is_admin, "Registered user");
        Ok(user)
    }

    /// Look up `username` and check `password` against its hash.
    ///
    /// Unknown user and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user_by_username(username).await? else {
            return Ok(None);
        };

        if self.check_password(&user, password) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Whether `plaintext` matches the user's stored hash.
    pub fn check_password(&self, user: &User, plaintext: &str) -> bool {
        match verify_password(plaintext, &user.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(user_id = user.id, error = %e, "Stored password hash is unusable");
                false
            }
        }
    }

    pub async fn change_password(&self, user_id: i64, new_plaintext: &str) -> Result<()> {
        let password_hash = hash_password(new_plaintext)?;

        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Replace the editable profile fields.
    pub async fn edit_profile(&self, user_id: i64, update: ProfileUpdate) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = ?, first_name = ?, last_name = ?, email = ? \
             WHERE id = ? RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&update.username)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.email)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        tracing::info!(user_id, "Profile edited");
        Ok(user)
    }

    /// Delete a user and, by cascade, their searches.
    ///
    /// Returns `false` if there was no such user.
    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(user_id, "Deleted user");
        }
        Ok(deleted)
    }

    // ─── Searches ────────────────────────────────────────────────

    /// Record every result of one search, atomically.
    ///
    /// All rows share the searched `address`, `radius` and timestamp.
    pub async fn add_searches(
        &self,
        user_id: i64,
        address: &str,
        radius: u32,
        candidates: &[SearchResultCandidate],
    ) -> Result<Vec<SearchRecord>> {
        let timestamp = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut records = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let record = sqlx::query_as::<_, SearchRecord>(&format!(
                "INSERT INTO searches (user_id, name, address, radius, place_id, timestamp) \
                 VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
                SEARCH_COLUMNS
            ))
            .bind(user_id)
            .bind(&candidate.name)
            .bind(address)
            .bind(radius)
            .bind(&candidate.place_id)
            .bind(timestamp)
            .fetch_one(&mut *tx)
            .await?;
            records.push(record);
        }

        tx.commit().await?;

        tracing::debug!(user_id, count = records.len(), "Recorded search results");
        Ok(records)
    }

    /// A user's search records, oldest first.
    pub async fn list_searches(&self, user_id: i64) -> Result<Vec<SearchRecord>> {
        let records = sqlx::query_as::<_, SearchRecord>(&format!(
            "SELECT {} FROM searches WHERE user_id = ? ORDER BY id",
            SEARCH_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
