// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPS position model.

use chrono::{DateTime, Utc};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// A single location fix reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// When the fix was observed by the device
    pub observed_at: DateTime<Utc>,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            observed_at,
        }
    }

    /// Create a position observed now.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, Utc::now())
    }

    /// Exact coordinate equality. No rounding or tolerance is applied.
    #[allow(clippy::float_cmp)]
    pub fn same_place(&self, other: &GeoPosition) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    /// Great-circle distance to another position in meters.
    pub fn distance_meters(&self, other: &GeoPosition) -> f64 {
        Haversine.distance(self.to_point(), other.to_point())
    }

    /// Absolute time between two fixes.
    pub fn time_between(&self, other: &GeoPosition) -> chrono::Duration {
        (self.observed_at - other.observed_at).abs()
    }

    /// Convert to a `geo` point (x = longitude, y = latitude).
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}
