// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The Flickr API key and endpoints are injected here rather than embedded
//! in the client so tests can point the client at a local server.

use crate::models::PhotoSize;
use crate::services::dedup::{DedupPolicy, RevisitPolicy};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_FLICKR_API_URL: &str = "https://www.flickr.com/services/rest";
const DEFAULT_FLICKR_PHOTO_URL: &str = "https://live.staticflickr.com";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub flickr: FlickrConfig,
    pub trip: TripSettings,
    /// How long a pending authorization request waits for the device to answer
    pub auth_request_timeout: Duration,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
}

/// Flickr endpoints, credentials and search parameters.
#[derive(Debug, Clone)]
pub struct FlickrConfig {
    pub api_key: String,
    /// REST endpoint for `flickr.photos.search`
    pub api_url: String,
    /// Static host serving image files
    pub photo_url: String,
    pub radius_km: f64,
    /// Comma-separated tag filter
    pub tags: String,
    pub per_page: u32,
}

/// Policies applied by the trip orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TripSettings {
    pub dedup: DedupPolicy,
    pub revisit: RevisitPolicy,
    pub photo_size: PhotoSize,
}

impl Default for FlickrConfig {
    fn default() -> Self {
        Self {
            api_key: "test_api_key".to_string(),
            api_url: DEFAULT_FLICKR_API_URL.to_string(),
            photo_url: DEFAULT_FLICKR_PHOTO_URL.to_string(),
            radius_km: 10.0,
            tags: "landscape".to_string(),
            per_page: 50,
        }
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            flickr: FlickrConfig::default(),
            trip: TripSettings::default(),
            auth_request_timeout: Duration::from_secs(60),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("FLICKR_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("FLICKR_API_KEY"))?;

        let flickr = FlickrConfig {
            api_key,
            api_url: lookup("FLICKR_API_URL")
                .unwrap_or_else(|| DEFAULT_FLICKR_API_URL.to_string()),
            photo_url: lookup("FLICKR_PHOTO_URL")
                .unwrap_or_else(|| DEFAULT_FLICKR_PHOTO_URL.to_string()),
            radius_km: parse_or(&lookup, "FLICKR_SEARCH_RADIUS_KM", 10.0)?,
            tags: lookup("FLICKR_SEARCH_TAGS").unwrap_or_else(|| "landscape".to_string()),
            per_page: parse_or(&lookup, "FLICKR_PER_PAGE", 50)?,
        };

        let window_secs: u64 = parse_or(&lookup, "DEDUP_WINDOW_SECS", 10)?;
        let window = Duration::from_secs(window_secs);
        let dedup = match lookup("DEDUP_POLICY").as_deref().map(str::trim) {
            None | Some("") | Some("exact") => DedupPolicy::Exact,
            Some("exact_within") => DedupPolicy::ExactWithin(window),
            Some("proximity") => DedupPolicy::Proximity {
                meters: parse_or(&lookup, "DEDUP_DISTANCE_METERS", 100.0)?,
                window,
            },
            Some(_) => return Err(ConfigError::Invalid("DEDUP_POLICY")),
        };

        let revisit = match lookup("REVISIT_POLICY").as_deref().map(str::trim) {
            None | Some("") | Some("allow") => RevisitPolicy::Allow,
            Some("skip") => RevisitPolicy::Skip,
            Some(_) => return Err(ConfigError::Invalid("REVISIT_POLICY")),
        };

        let photo_size = parse_or(&lookup, "PHOTO_SIZE", PhotoSize::default())?;

        Ok(Self {
            flickr,
            trip: TripSettings {
                dedup,
                revisit,
                photo_size,
            },
            auth_request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "AUTH_REQUEST_TIMEOUT_SECS",
                60,
            )?),
            frontend_url: lookup("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
        })
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
