// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Photo search and download capabilities.
//!
//! The trip orchestrator only depends on these traits. `FlickrClient`
//! implements both against the Flickr REST API; tests supply their own.

use crate::models::{GeoPosition, PhotoCandidate, PhotoSize};
use async_trait::async_trait;

/// Finds candidate photos near a position, in the order the catalog ranks them.
#[async_trait]
pub trait PhotoSearchClient: Send + Sync {
    async fn search(&self, position: &GeoPosition) -> Result<Vec<PhotoCandidate>, PhotoError>;
}

/// Downloads the image for a candidate at the requested size.
#[async_trait]
pub trait PhotoFetchClient: Send + Sync {
    async fn fetch(&self, candidate: &PhotoCandidate, size: PhotoSize)
        -> Result<Vec<u8>, PhotoError>;
}

/// Failure while searching for or downloading a photo.
///
/// Callers report these as opaque causes and do not branch on the variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhotoError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Photo API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Response payload was empty")]
    EmptyPayload,
}
