// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device routes: the phone (or any GPS feed) pushes fixes and answers
//! permission requests here.

use crate::error::{AppError, Result};
use crate::models::GeoPosition;
use crate::services::location::{AuthorizationStatus, LocationError, LocationSource};
use crate::time_utils::parse_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Device routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/device", get(get_device))
        .route("/api/device/location", post(post_location))
        .route("/api/device/authorization", put(put_authorization))
        .route("/api/device/services", put(put_services))
}

#[derive(Serialize)]
pub struct DeviceStatusResponse {
    pub authorization: AuthorizationStatus,
    pub authorization_requested: bool,
    pub services_enabled: bool,
    pub updating: bool,
}

async fn get_device(State(state): State<Arc<AppState>>) -> Json<DeviceStatusResponse> {
    let device = &state.device;
    Json(DeviceStatusResponse {
        authorization: device.authorization_status(),
        authorization_requested: device.authorization_requested(),
        services_enabled: device.services_enabled().await,
        updating: device.is_updating().await,
    })
}

// ─── Location Fixes ──────────────────────────────────────────

/// A location fix, or a failure report when `error` is set.
#[derive(Debug, Deserialize, Validate)]
struct LocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: Option<f64>,
    /// RFC3339; defaults to the time the request is received
    observed_at: Option<String>,
    /// Platform error message instead of a fix
    error: Option<String>,
}

async fn post_location(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LocationRequest>,
) -> Result<StatusCode> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let accepted = match body.error {
        Some(message) => {
            state
                .device
                .push_failure(LocationError::Unavailable(message))
                .await
        }
        None => {
            let (Some(latitude), Some(longitude)) = (body.latitude, body.longitude) else {
                return Err(AppError::BadRequest(
                    "latitude and longitude are required".to_string(),
                ));
            };
            let observed_at = match body.observed_at.as_deref() {
                Some(raw) => parse_utc_rfc3339(raw).ok_or_else(|| {
                    AppError::BadRequest(format!("Invalid observed_at timestamp: {}", raw))
                })?,
                None => chrono::Utc::now(),
            };
            let position = GeoPosition::new(latitude, longitude, observed_at);
            state.device.push_position(position).await
        }
    };

    if !accepted {
        return Err(AppError::Conflict(
            "Location updates are not running".to_string(),
        ));
    }
    Ok(StatusCode::ACCEPTED)
}

// ─── Permissions ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AuthorizationRequest {
    status: AuthorizationStatus,
}

async fn put_authorization(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuthorizationRequest>,
) -> StatusCode {
    state.device.set_authorization(body.status).await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
struct ServicesRequest {
    enabled: bool,
}

async fn put_services(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ServicesRequest>,
) -> StatusCode {
    tracing::info!(enabled = body.enabled, "Location services setting changed");
    state.device.set_services_enabled(body.enabled);
    StatusCode::NO_CONTENT
}
