// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod photo;
pub mod position;
pub mod trip;

pub use photo::{PhotoCandidate, PhotoSize, TripPhoto};
pub use position::GeoPosition;
pub use trip::{TripEntry, TripEntrySummary};
