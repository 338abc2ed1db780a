// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Photo-Trail: a travel journal built from photos taken near where you are.
//!
//! As location fixes arrive, the trip orchestrator looks up a landscape
//! photo near each new position on Flickr, downloads it, and prepends it to
//! the trip log. This crate provides that pipeline plus an HTTP service
//! through which a device feeds locations and a viewer drives the trip.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{
    DeviceLocationSource, EventLog, PhotoFetchClient, PhotoSearchClient, TripOrchestrator,
};
use std::sync::Arc;

/// Shared application state.
///
/// The state owns the presenter; the orchestrator only refers to it weakly.
pub struct AppState {
    pub config: Config,
    pub orchestrator: TripOrchestrator,
    pub presenter: Arc<EventLog>,
    pub device: Arc<DeviceLocationSource>,
}

impl AppState {
    /// Wire the orchestrator to a device-fed location source and the event log.
    pub fn new(
        config: Config,
        search: Arc<dyn PhotoSearchClient>,
        fetch: Arc<dyn PhotoFetchClient>,
    ) -> Self {
        let presenter = Arc::new(EventLog::new());
        let device = Arc::new(DeviceLocationSource::new(config.auth_request_timeout));
        let orchestrator =
            TripOrchestrator::new(config.trip, device.clone(), search, fetch, &presenter);

        Self {
            config,
            orchestrator,
            presenter,
            device,
        }
    }
}
