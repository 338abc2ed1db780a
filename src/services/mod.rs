// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - trip pipeline and its collaborators.

pub mod dedup;
pub mod flickr;
pub mod location;
pub mod orchestrator;
pub mod photos;
pub mod presenter;
pub mod trip_log;

pub use dedup::{DedupPolicy, RecentPositions, RevisitPolicy};
pub use flickr::FlickrClient;
pub use location::{AuthorizationStatus, DeviceLocationSource, LocationError, LocationSource};
pub use orchestrator::{ToggleOutcome, TrackingState, TripOrchestrator, TripPrompt, UpdateOutcome};
pub use photos::{PhotoError, PhotoFetchClient, PhotoSearchClient};
pub use presenter::{AuthorizationIssue, EventLog, PipelineStage, TripEvent, TripPresenter};
pub use trip_log::TripLog;
