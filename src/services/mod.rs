// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - provider access and pure business logic.

pub mod gateway;
pub mod normalizer;
pub mod password;

pub use gateway::{Gateway, GatewayError, GoogleGateway};
pub use normalizer::{dedupe_chronological, to_search_results, MalformedPayload};
