// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip log entries.

use crate::models::{GeoPosition, TripPhoto};
use crate::time_utils::format_utc_rfc3339;
use serde::Serialize;

/// One visited location paired with the photo downloaded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct TripEntry {
    pub position: GeoPosition,
    pub photo: TripPhoto,
}

impl TripEntry {
    pub fn new(position: GeoPosition, photo: TripPhoto) -> Self {
        Self { position, photo }
    }

    /// Summary without the image bytes, for listing.
    pub fn summary(&self, index: usize) -> TripEntrySummary {
        TripEntrySummary {
            index,
            photo_id: self.photo.id.clone(),
            title: self.photo.title.clone(),
            latitude: self.position.latitude,
            longitude: self.position.longitude,
            observed_at: format_utc_rfc3339(self.position.observed_at),
            image_bytes: self.photo.image.len(),
        }
    }
}

/// Trip entry as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct TripEntrySummary {
    /// Position in the log (0 = most recent)
    pub index: usize,
    pub photo_id: String,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub observed_at: String,
    pub image_bytes: usize,
}
