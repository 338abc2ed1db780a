// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flickr API client for finding and downloading photos near a location.
//!
//! Handles:
//! - Photo search by coordinates (`flickr.photos.search`)
//! - Image download from the static photo host
//! - API-level failures reported with HTTP 200 and `"stat": "fail"`

use crate::config::FlickrConfig;
use crate::models::{GeoPosition, PhotoCandidate, PhotoSize};
use crate::services::photos::{PhotoError, PhotoFetchClient, PhotoSearchClient};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

/// Only photos (no screenshots or other content).
const CONTENT_TYPE_PHOTOS: &str = "1";
/// Safe content only.
const SAFE_SEARCH: &str = "1";
/// Public photos only.
const PRIVACY_PUBLIC: &str = "1";
/// Photos taken outdoors.
const GEO_CONTEXT_OUTDOORS: &str = "2";

/// Flickr API client.
#[derive(Clone)]
pub struct FlickrClient {
    http: reqwest::Client,
    config: FlickrConfig,
}

impl FlickrClient {
    pub fn new(config: FlickrConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Search for photos around a coordinate pair, first page only.
    pub async fn search_photos(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<PhotoCandidate>, PhotoError> {
        let response = self
            .http
            .get(&self.config.api_url)
            .query(&self.search_query(latitude, longitude))
            .send()
            .await
            .map_err(|e| PhotoError::Transport(e.to_string()))?;

        let body = check_response(response).await?.text().await.map_err(|e| {
            PhotoError::Transport(format!("Failed to read search response: {}", e))
        })?;

        if body.trim().is_empty() {
            return Err(PhotoError::EmptyPayload);
        }

        parse_search_response(&body)
    }

    /// Download the image bytes for a candidate.
    pub async fn download_photo(
        &self,
        candidate: &PhotoCandidate,
        size: PhotoSize,
    ) -> Result<Vec<u8>, PhotoError> {
        let url = self.photo_url(candidate, size);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| PhotoError::Transport(e.to_string()))?;

        let response = check_response(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(PhotoError::Malformed(format!(
                "Expected an image, got {:?}",
                content_type
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PhotoError::Transport(format!("Failed to read image: {}", e)))?;

        if bytes.is_empty() {
            return Err(PhotoError::EmptyPayload);
        }

        tracing::debug!(photo_id = %candidate.id, bytes = bytes.len(), "Photo downloaded");
        Ok(bytes.to_vec())
    }

    /// Download URL: `{photo_url}/{server}/{id}_{secret}{suffix}.jpg`.
    pub fn photo_url(&self, candidate: &PhotoCandidate, size: PhotoSize) -> String {
        format!(
            "{}/{}/{}_{}{}.jpg",
            self.config.photo_url.trim_end_matches('/'),
            candidate.source_server,
            candidate.id,
            candidate.secret,
            size.suffix()
        )
    }

    fn search_query(&self, latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("method", "flickr.photos.search".to_string()),
            ("api_key", self.config.api_key.clone()),
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("radius", self.config.radius_km.to_string()),
            ("radius_units", "km".to_string()),
            ("safe_search", SAFE_SEARCH.to_string()),
            ("content_type", CONTENT_TYPE_PHOTOS.to_string()),
            ("privacy_filter", PRIVACY_PUBLIC.to_string()),
            ("geo_context", GEO_CONTEXT_OUTDOORS.to_string()),
            ("tags", self.config.tags.clone()),
            ("per_page", self.config.per_page.to_string()),
            ("page", "1".to_string()),
            ("format", "json".to_string()),
            ("nojsoncallback", "1".to_string()),
        ]
    }
}

#[async_trait]
impl PhotoSearchClient for FlickrClient {
    async fn search(&self, position: &GeoPosition) -> Result<Vec<PhotoCandidate>, PhotoError> {
        self.search_photos(position.latitude, position.longitude)
            .await
    }
}

#[async_trait]
impl PhotoFetchClient for FlickrClient {
    async fn fetch(
        &self,
        candidate: &PhotoCandidate,
        size: PhotoSize,
    ) -> Result<Vec<u8>, PhotoError> {
        self.download_photo(candidate, size).await
    }
}

/// Return the response if successful, otherwise an error with the body.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, PhotoError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.as_u16() == 429 {
        tracing::warn!("Flickr rate limit hit (429)");
    }

    Err(PhotoError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Decode a `flickr.photos.search` JSON body into candidates, in API order.
pub fn parse_search_response(body: &str) -> Result<Vec<PhotoCandidate>, PhotoError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| PhotoError::Malformed(format!("JSON parse error: {}", e)))?;

    if response.stat != "ok" {
        return Err(PhotoError::Api {
            code: response.code.unwrap_or_default(),
            message: response
                .message
                .unwrap_or_else(|| format!("stat={}", response.stat)),
        });
    }

    let photos = response
        .photos
        .ok_or_else(|| PhotoError::Malformed("Missing photos object".to_string()))?;

    Ok(photos
        .photo
        .into_iter()
        .map(|p| PhotoCandidate {
            id: p.id,
            source_server: p.server,
            secret: p.secret,
            title: p.title,
        })
        .collect())
}

/// Search response envelope.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    stat: String,
    photos: Option<SearchPage>,
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    photo: Vec<SearchPhoto>,
}

#[derive(Debug, Deserialize)]
struct SearchPhoto {
    id: String,
    server: String,
    secret: String,
    #[serde(default)]
    title: String,
}
