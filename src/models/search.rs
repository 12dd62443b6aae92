// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Search history and search result models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Keyword sent with every places-nearby query.
pub const SEARCH_KEYWORD: &str = "hike";

/// Selectable search radii: (meters, miles label).
pub const RADIUS_CHOICES: [(u32, u32); 6] = [
    (5000, 3),
    (8000, 5),
    (12500, 8),
    (16000, 10),
    (24000, 15),
    (32000, 20),
];

/// Whether `meters` is one of the offered radius choices.
pub fn is_valid_radius(meters: u32) -> bool {
    RADIUS_CHOICES.iter().any(|(m, _)| *m == meters)
}

/// One stored result of a past search, owned by `user_id`.
///
/// `address` and `radius` are the search inputs, shared by every record
/// produced by the same search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SearchRecord {
    pub id: i64,
    pub user_id: i64,
    /// Trail name as reported by the provider
    pub name: String,
    /// Address the user searched from
    pub address: String,
    /// Search radius in meters
    pub radius: u32,
    /// Provider place identifier
    pub place_id: String,
    pub timestamp: DateTime<Utc>,
}

/// A normalized result derived from one provider record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchResultCandidate {
    pub name: String,
    /// Provider short address ("vicinity")
    pub address: String,
    pub place_id: String,
    /// Trail head location, when the provider included one
    pub location: Option<Coords>,
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoords")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
struct RawCoords {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoords> for Coords {
    type Error = CoordsError;

    fn try_from(raw: RawCoords) -> Result<Self, Self::Error> {
        Coords::new(raw.lat, raw.lng)
    }
}

impl Coords {
    /// Build a coordinate pair, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordsError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordsError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordsError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// `"lat,lng"` as expected by the Google location parameter.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// Coordinate validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordsError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}
