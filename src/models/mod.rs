// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod search;
pub mod user;

pub use search::{Coords, SearchRecord, SearchResultCandidate};
pub use user::{NewUser, ProfileUpdate, User};
