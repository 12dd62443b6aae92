// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
};
use hike_finder::config::Config;
use hike_finder::db::Db;
use hike_finder::middleware::auth::{create_session_token, SESSION_COOKIE};
use hike_finder::models::{Coords, NewUser, User};
use hike_finder::routes::create_router;
use hike_finder::services::{Gateway, GatewayError};
use hike_finder::views::{Views, FLASH_COOKIE};
use hike_finder::AppState;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Password given to every seeded user.
#[allow(dead_code)]
pub const PASSWORD: &str = "password123";

/// Provider stand-in with canned answers.
pub struct FakeGateway {
    /// `None` makes geocoding report "address not found".
    pub location: Option<Coords>,
    /// Body returned by `places_nearby`.
    pub nearby: Value,
    /// When set, `places_nearby` fails with this HTTP status.
    pub nearby_status: Option<u16>,
    /// One entry per call, e.g. `geocode:1 Main St`.
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            location: Some(Coords {
                lat: 42.3292493,
                lng: -71.352353,
            }),
            nearby: nearby_payload(&[("Loop Trail", "1 Park Rd"), ("Ridge Trail", "2 Hill St")]),
            nearby_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn geocode(&self, address: &str) -> Result<Coords, GatewayError> {
        self.record(format!("geocode:{}", address));
        self.location.ok_or(GatewayError::NoLocation)
    }

    async fn places_nearby(
        &self,
        coords: Coords,
        radius_m: u32,
        keyword: &str,
    ) -> Result<Value, GatewayError> {
        self.record(format!(
            "places_nearby:{}:{}:{}",
            coords.to_query_value(),
            radius_m,
            keyword
        ));
        if let Some(status) = self.nearby_status {
            return Err(GatewayError::Status {
                status,
                body: String::new(),
            });
        }
        Ok(self.nearby.clone())
    }

    async fn forecast(&self, coords: Coords) -> Result<Value, GatewayError> {
        self.record(format!("forecast:{}", coords.to_query_value()));
        Ok(json!({
            "cod": "200",
            "list": [{"dt": 1700000000, "main": {"temp": 285.1}}],
            "city": {"coord": {"lat": coords.lat, "lon": coords.lng}}
        }))
    }

    async fn directions(
        &self,
        origin: &str,
        destination_place_id: &str,
    ) -> Result<Value, GatewayError> {
        self.record(format!("directions:{}:{}", origin, destination_place_id));
        Ok(json!({
            "status": "OK",
            "routes": [{"summary": format!("{} to {}", origin, destination_place_id)}]
        }))
    }
}

/// A places-nearby body with one result per `(name, vicinity)`.
#[allow(dead_code)]
pub fn nearby_payload(results: &[(&str, &str)]) -> Value {
    let results: Vec<Value> = results
        .iter()
        .enumerate()
        .map(|(i, (name, vicinity))| {
            json!({
                "name": name,
                "vicinity": vicinity,
                "place_id": format!("place_{}", i),
                "geometry": {"location": {"lat": 42.3 + i as f64 / 100.0, "lng": -71.3}}
            })
        })
        .collect();
    json!({"results": results, "status": "OK"})
}

pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub gateway: Arc<FakeGateway>,
}

/// Create a test app backed by an in-memory database and the default fake.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    create_test_app_with(FakeGateway::default()).await
}

#[allow(dead_code)]
pub async fn create_test_app_with(gateway: FakeGateway) -> TestApp {
    let gateway = Arc::new(gateway);
    let db = Db::in_memory().await.expect("in-memory database");

    let state = Arc::new(AppState {
        config: Config::test_default(),
        db,
        gateway: gateway.clone(),
        views: Views::new().expect("templates compile"),
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        gateway,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Register a user directly in the store.
    pub async fn seed_user(&self, username: &str, is_admin: bool) -> User {
        self.state
            .db
            .register(NewUser {
                username: username.to_string(),
                password: PASSWORD.to_string(),
                first_name: "Test".to_string(),
                last_name: "Hiker".to_string(),
                email: format!("{}@example.com", username.to_lowercase()),
                is_admin,
            })
            .await
            .expect("seed user")
    }

    /// `Cookie` header value for a logged-in session.
    pub fn session_cookie(&self, user_id: i64) -> String {
        let token = create_session_token(
            user_id,
            &self.state.config.session_signing_key,
            self.state.config.session_ttl_hours,
        )
        .unwrap();
        format!("{}={}", SESSION_COOKIE, token)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("GET", uri, cookie, None, Body::empty()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response {
        self.send(
            "POST",
            uri,
            cookie,
            Some("application/x-www-form-urlencoded"),
            Body::from(body.to_string()),
        )
        .await
    }

    /// POST with no body and no content type.
    pub async fn post_empty(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send("POST", uri, cookie, None, Body::empty()).await
    }

    pub async fn post_json(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response {
        self.send(
            "POST",
            uri,
            cookie,
            Some("application/json"),
            Body::from(body.to_string()),
        )
        .await
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        content_type: Option<&str>,
        body: Body,
    ) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }

        self.router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }
}

#[allow(dead_code)]
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Value of the named cookie set by the response, if any.
#[allow(dead_code)]
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    set_cookie_headers(response).iter().find_map(|header| {
        let rest = header.strip_prefix(&format!("{}=", name))?;
        Some(rest.split(';').next().unwrap_or_default().to_string())
    })
}

/// The flash message carried by a redirect.
#[allow(dead_code)]
pub fn flash(response: &Response) -> Option<String> {
    cookie_value(response, FLASH_COOKIE)
        .filter(|v| !v.is_empty())
        .map(|v| urlencoding::decode(&v).unwrap().into_owned())
}

#[allow(dead_code)]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect has a Location")
        .to_str()
        .unwrap()
        .to_string()
}
