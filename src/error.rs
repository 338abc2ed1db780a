// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the trip pipeline and the HTTP API.

use crate::services::photos::PhotoError;
use crate::services::presenter::AuthorizationIssue;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Outcome of a trip operation that did not complete normally.
///
/// `NoNewPhotoAvailable` is informational: it is expected whenever a
/// location has no photos left that are not already in the log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripError {
    #[error("Location permission denied")]
    AuthorizationDenied,

    #[error("Location permission restricted")]
    AuthorizationRestricted,

    #[error("Location services are disabled")]
    LocationServicesDisabled,

    #[error("Photo search failed: {0}")]
    PhotoSearchFailed(#[source] PhotoError),

    #[error("Photo download failed: {0}")]
    PhotoDownloadFailed(#[source] PhotoError),

    #[error("No new photo available near this location")]
    NoNewPhotoAvailable,

    #[error("Trip orchestrator is no longer running")]
    OrchestratorGone,
}

impl TripError {
    /// `false` for informational outcomes.
    pub fn is_failure(&self) -> bool {
        !matches!(self, TripError::NoNewPhotoAvailable)
    }
}

impl From<AuthorizationIssue> for TripError {
    fn from(issue: AuthorizationIssue) -> Self {
        match issue {
            AuthorizationIssue::Denied => TripError::AuthorizationDenied,
            AuthorizationIssue::Restricted => TripError::AuthorizationRestricted,
            AuthorizationIssue::ServicesDisabled => TripError::LocationServicesDisabled,
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TripError> for AppError {
    fn from(err: TripError) -> Self {
        match err {
            TripError::OrchestratorGone => AppError::Internal(anyhow::Error::new(err)),
            other => AppError::Conflict(other.to_string()),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
