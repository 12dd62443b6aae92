// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trail search, search history, directions and forecast routes.

use axum::{
    body::Bytes,
    extract::{rejection::FormRejection, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_login, Session};
use crate::models::search::{is_valid_radius, RADIUS_CHOICES, SEARCH_KEYWORD};
use crate::models::{Coords, SearchRecord, SearchResultCandidate};
use crate::services::normalizer::{dedupe_chronological, to_search_results};
use crate::time_utils::{format_search_time, format_utc_rfc3339};
use crate::views::{validation_messages, Page};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search_form).post(search))
        .route("/search/past", get(past_searches))
        .route("/search/details", post(directions))
        .route("/search/forecast", post(forecast))
}

/// Optional prefill for the search form ("search again" links).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub address: Option<String>,
    pub radius: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SearchForm {
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    /// Radius in meters; kept as text so a bad value re-renders the form
    pub radius: String,
}

#[derive(Debug, Deserialize)]
pub struct DirectionsRequest {
    pub origin_address: String,
    pub destination_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub coords: Coords,
}

/// One row of the history page.
#[derive(Debug, Serialize)]
struct PastSearchRow {
    name: String,
    address: String,
    miles: Option<u32>,
    when: String,
    when_iso: String,
    again_url: String,
}

impl From<SearchRecord> for PastSearchRow {
    fn from(record: SearchRecord) -> Self {
        Self {
            again_url: format!(
                "/search?address={}&radius={}",
                urlencoding::encode(&record.address),
                record.radius
            ),
            miles: miles_for(record.radius),
            when: format_search_time(record.timestamp),
            when_iso: format_utc_rfc3339(record.timestamp),
            name: record.name,
            address: record.address,
        }
    }
}

fn miles_for(radius: u32) -> Option<u32> {
    RADIUS_CHOICES
        .iter()
        .find(|(meters, _)| *meters == radius)
        .map(|(_, miles)| *miles)
}

fn search_page(address: &str, radius: Option<u32>) -> Page {
    Page::new("search.html")
        .with("radius_choices", &RADIUS_CHOICES)
        .with("address", address)
        .with("radius", &radius)
        .with("hikes", &Vec::<SearchResultCandidate>::new())
        .with("searched", &false)
}

async fn search_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    Query(query): Query<SearchQuery>,
) -> Result<Response> {
    require_login(&session)?;

    let radius = query
        .radius
        .and_then(|r| r.parse::<u32>().ok())
        .filter(|r| is_valid_radius(*r));
    let address = query.address.unwrap_or_default();

    search_page(&address, radius).render(&state.views, &session, jar)
}

async fn search(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    form: std::result::Result<Form<SearchForm>, FormRejection>,
) -> Result<Response> {
    let user = require_login(&session)?;
    let Form(form) = form?;
    let address = form.address.trim();
    let radius = form.radius.trim().parse::<u32>().ok().filter(|r| is_valid_radius(*r));

    let mut messages = form
        .validate()
        .err()
        .map(|errors| validation_messages(&errors))
        .unwrap_or_default();
    if address.is_empty() && messages.is_empty() {
        messages.push("Address is required".to_string());
    }
    if radius.is_none() {
        messages.push("Choose one of the offered distances".to_string());
    }
    let Some(radius) = radius.filter(|_| messages.is_empty()) else {
        return search_page(address, radius)
            .errors(messages)
            .status(StatusCode::UNPROCESSABLE_ENTITY)
            .render(&state.views, &session, jar);
    };

    let (coords, hikes) = match find_hikes(&state, address, radius).await {
        Ok(found) => found,
        Err(err) if err.is_provider_error() => {
            tracing::warn!(user_id = user.id, error = %err, "Search failed at provider");
            return search_page(address, Some(radius))
                .error(err.search_failure_message())
                .status(StatusCode::BAD_GATEWAY)
                .render(&state.views, &session, jar);
        }
        Err(err) => return Err(err),
    };

    state
        .db
        .add_searches(user.id, address, radius, &hikes)
        .await?;
    tracing::info!(user_id = user.id, radius, results = hikes.len(), "Search completed");

    search_page(address, Some(radius))
        .with("coords", &coords)
        .with("hikes", &hikes)
        .with("searched", &true)
        .render(&state.views, &session, jar)
}

/// Geocode, query nearby trails and normalize. Nothing is persisted here.
async fn find_hikes(
    state: &AppState,
    address: &str,
    radius: u32,
) -> Result<(Coords, Vec<SearchResultCandidate>)> {
    let coords = state.gateway.geocode(address).await?;
    let raw = state
        .gateway
        .places_nearby(coords, radius, SEARCH_KEYWORD)
        .await?;
    let hikes = to_search_results(&raw)?;
    Ok((coords, hikes))
}

async fn past_searches(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    let user = require_login(&session)?;

    let records = state.db.list_searches(user.id).await?;
    let rows: Vec<PastSearchRow> = dedupe_chronological(&records)
        .into_iter()
        .map(PastSearchRow::from)
        .collect();

    Page::new("past.html")
        .with("searches", &rows)
        .render(&state.views, &session, jar)
}

/// Parse a JSON body, reporting any problem as a validation error.
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::Validation(e.to_string()))
}

async fn directions(
    State(state): State<Arc<AppState>>,
    session: Session,
    body: Bytes,
) -> Result<Json<Value>> {
    let user = require_login(&session).map_err(AppError::ApiAuthorization)?;
    let request: DirectionsRequest = parse_json(&body)?;

    let origin = request.origin_address.trim();
    let destination = request.destination_id.trim();
    if origin.is_empty() || destination.is_empty() {
        return Err(AppError::Validation(
            "origin_address and destination_id are required".to_string(),
        ));
    }

    tracing::debug!(user_id = user.id, destination, "Directions requested");
    Ok(Json(state.gateway.directions(origin, destination).await?))
}

async fn forecast(
    State(state): State<Arc<AppState>>,
    session: Session,
    body: Bytes,
) -> Result<Json<Value>> {
    let user = require_login(&session).map_err(AppError::ApiAuthorization)?;
    let request: ForecastRequest = parse_json(&body)?;

    tracing::debug!(user_id = user.id, "Forecast requested");
    Ok(Json(state.gateway.forecast(request.coords).await?))
}
