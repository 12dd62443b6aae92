// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Hike Finder: find hiking trails near an address.
//!
//! Registered users search for trails around an address, check the forecast
//! at a trail head, get directions, and review their own search history.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use db::Db;
use services::Gateway;
use std::sync::Arc;
use views::Views;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub gateway: Arc<dyn Gateway>,
    pub views: Views,
}
