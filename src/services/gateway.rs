// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geo and weather provider gateway.
//!
//! Google Maps serves geocoding, nearby-place search and directions;
//! OpenWeatherMap serves the 5-day forecast. Each call is a single attempt
//! bounded only by the HTTP client's timeout.

use crate::models::Coords;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const GOOGLE_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Google statuses that carry a usable (possibly empty) answer.
const NEARBY_OK_STATUSES: &[&str] = &["OK", "ZERO_RESULTS"];
const DIRECTIONS_OK_STATUSES: &[&str] = &["OK", "ZERO_RESULTS", "NOT_FOUND"];

/// Provider failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Geocoding found nothing for the address.
    #[error("address not found")]
    NoLocation,

    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider returned HTTP {status}")]
    Status { status: u16, body: String },

    /// HTTP 200 with an error status in the body.
    #[error("provider reported {0}")]
    Provider(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// The operations the web layer needs from the providers.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Resolve an address to coordinates.
    async fn geocode(&self, address: &str) -> Result<Coords, GatewayError>;

    /// Raw nearby-search payload for `keyword` within `radius_m` meters.
    async fn places_nearby(
        &self,
        coords: Coords,
        radius_m: u32,
        keyword: &str,
    ) -> Result<Value, GatewayError>;

    /// Raw 5-day forecast payload.
    async fn forecast(&self, coords: Coords) -> Result<Value, GatewayError>;

    /// Raw directions payload from an address to a place.
    async fn directions(
        &self,
        origin: &str,
        destination_place_id: &str,
    ) -> Result<Value, GatewayError>;
}

/// Gateway backed by the Google Maps and OpenWeatherMap HTTP APIs.
#[derive(Clone)]
pub struct GoogleGateway {
    http: reqwest::Client,
    google_base_url: String,
    weather_base_url: String,
    google_api_key: String,
    weather_api_key: String,
}

impl GoogleGateway {
    pub fn new(
        google_api_key: String,
        weather_api_key: String,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Ok(Self {
            http,
            google_base_url: GOOGLE_BASE_URL.to_string(),
            weather_base_url: WEATHER_BASE_URL.to_string(),
            google_api_key,
            weather_api_key,
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, GatewayError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), url, "Provider returned error status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl Gateway for GoogleGateway {
    async fn geocode(&self, address: &str) -> Result<Coords, GatewayError> {
        let url = format!("{}/geocode/json", self.google_base_url);
        let body = self
            .get_json(
                &url,
                &[
                    ("address", address.to_string()),
                    ("key", self.google_api_key.clone()),
                ],
            )
            .await?;

        coords_from_geocode(&body)
    }

    async fn places_nearby(
        &self,
        coords: Coords,
        radius_m: u32,
        keyword: &str,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}/place/nearbysearch/json", self.google_base_url);
        let body = self
            .get_json(
                &url,
                &[
                    ("location", coords.to_query_value()),
                    ("radius", radius_m.to_string()),
                    ("keyword", keyword.to_string()),
                    ("key", self.google_api_key.clone()),
                ],
            )
            .await?;

        check_google_status(&body, NEARBY_OK_STATUSES)?;
        Ok(body)
    }

    async fn forecast(&self, coords: Coords) -> Result<Value, GatewayError> {
        let url = format!("{}/forecast", self.weather_base_url);
        self.get_json(
            &url,
            &[
                ("lat", coords.lat.to_string()),
                ("lon", coords.lng.to_string()),
                ("appid", self.weather_api_key.clone()),
            ],
        )
        .await
    }

    async fn directions(
        &self,
        origin: &str,
        destination_place_id: &str,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}/directions/json", self.google_base_url);
        let body = self
            .get_json(
                &url,
                &[
                    ("origin", origin.to_string()),
                    ("destination", format!("place_id:{}", destination_place_id)),
                    ("key", self.google_api_key.clone()),
                ],
            )
            .await?;

        check_google_status(&body, DIRECTIONS_OK_STATUSES)?;
        Ok(body)
    }
}

/// Reject a Google payload whose `status` is not one of `accepted`.
///
/// A payload without a `status` field is accepted as-is.
pub fn check_google_status(body: &Value, accepted: &[&str]) -> Result<(), GatewayError> {
    match body.get("status").and_then(Value::as_str) {
        None => Ok(()),
        Some(status) if accepted.contains(&status) => Ok(()),
        Some(status) => {
            let message = body
                .get("error_message")
                .and_then(Value::as_str)
                .map(|m| format!("{}: {}", status, m))
                .unwrap_or_else(|| status.to_string());
            Err(GatewayError::Provider(message))
        }
    }
}

/// Extract `results[0].geometry.location` from a geocode payload.
pub fn coords_from_geocode(body: &Value) -> Result<Coords, GatewayError> {
    if body.get("status").and_then(Value::as_str) == Some("ZERO_RESULTS") {
        return Err(GatewayError::NoLocation);
    }
    check_google_status(body, &["OK"])?;

    let results = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::Malformed("geocode payload has no results".to_string()))?;

    let first = results.first().ok_or(GatewayError::NoLocation)?;
    let location = first.pointer("/geometry/location").ok_or_else(|| {
        GatewayError::Malformed("geocode result has no geometry.location".to_string())
    })?;

    serde_json::from_value(location.clone())
        .map_err(|e| GatewayError::Malformed(format!("geocode location: {}", e)))
}
