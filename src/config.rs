// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first, if present.

use std::env;
use std::time::Duration;

/// Minimum length of the session signing key.
const MIN_SIGNING_KEY_LEN: usize = 32;

/// Longest allowed login session (one year).
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    /// Public URL of the site; an `https` URL marks cookies `Secure`
    pub base_url: String,
    /// Server port
    pub port: u16,
    /// Connect/request timeout for provider calls
    pub http_timeout: Duration,
    /// Lifetime of a login session
    pub session_ttl_hours: u64,

    // --- Secrets ---
    /// Google Maps API key (geocode, places, directions)
    pub google_api_key: String,
    /// OpenWeatherMap API key
    pub weather_api_key: String,
    /// HS256 key for session tokens (raw bytes)
    pub session_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let session_signing_key = required("SESSION_SIGNING_KEY")?.into_bytes();
        if session_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid {
                name: "SESSION_SIGNING_KEY",
                reason: format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            });
        }

        let session_ttl_hours = parsed("SESSION_TTL_HOURS", 168)?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                reason: format!("must be between 1 and {}", MAX_SESSION_TTL_HOURS),
            });
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://hikefinder.db?mode=rwc".to_string()),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: parsed("PORT", 8080)?,
            http_timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", 10)?),
            session_ttl_hours,
            google_api_key: required("GOOGLE_API_KEY")?,
            weather_api_key: required("WEATHER_API_KEY")?,
            session_signing_key,
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            base_url: "http://localhost:8080".to_string(),
            port: 8080,
            http_timeout: Duration::from_secs(10),
            session_ttl_hours: 168,
            google_api_key: "test_google_key".to_string(),
            weather_api_key: "test_weather_key".to_string(),
            session_signing_key: b"test_session_key_32_bytes_minimum".to_vec(),
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("cannot parse {:?}", value),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so the environment is not mutated concurrently.
    #[test]
    fn test_config_from_env() {
        env::set_var("GOOGLE_API_KEY", "google");
        env::set_var("WEATHER_API_KEY", "weather");
        env::set_var("SESSION_SIGNING_KEY", "short");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid {
                name: "SESSION_SIGNING_KEY",
                ..
            })
        ));

        env::set_var("SESSION_SIGNING_KEY", "test_session_key_32_bytes_minimum");
        env::set_var("HTTP_TIMEOUT_SECS", "3");
        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.google_api_key, "google");
        assert_eq!(config.weather_api_key, "weather");
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.session_ttl_hours, 168);

        env::set_var("PORT", "not-a-port");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
        env::remove_var("PORT");

        for ttl in ["0", "8761", "9223372036854775807", "-1"] {
            env::set_var("SESSION_TTL_HOURS", ttl);
            assert!(
                matches!(
                    Config::from_env(),
                    Err(ConfigError::Invalid {
                        name: "SESSION_TTL_HOURS",
                        ..
                    })
                ),
                "accepted SESSION_TTL_HOURS={}",
                ttl
            );
        }
        for ttl in ["1", "8760"] {
            env::set_var("SESSION_TTL_HOURS", ttl);
            let config = Config::from_env().expect("TTL within bounds");
            assert_eq!(config.session_ttl_hours.to_string(), ttl);
        }
        env::remove_var("SESSION_TTL_HOURS");

        env::remove_var("WEATHER_API_KEY");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("WEATHER_API_KEY"))
        ));
    }

    #[test]
    fn test_secure_cookies_follow_base_url() {
        let mut config = Config::test_default();
        assert!(!config.secure_cookies());
        config.base_url = "https://hikes.example.com".to_string();
        assert!(config.secure_cookies());
    }
}
