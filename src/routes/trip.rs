// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip routes: the start/stop button, the continue/discard prompt and the
//! read-only view of the trip log.

use crate::error::{AppError, Result};
use crate::models::TripEntrySummary;
use crate::services::{ToggleOutcome, TrackingState, TripEvent};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Trip routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trip", get(get_trip))
        .route("/api/trip/toggle", post(toggle_tracking))
        .route("/api/trip/continue", post(continue_trip))
        .route("/api/trip/discard", post(discard_trip))
        .route("/api/trip/entries", get(list_entries))
        .route("/api/trip/entries/{index}", get(get_entry))
        .route("/api/trip/entries/{index}/image", get(get_entry_image))
        .route("/api/events", get(list_events))
}

// ─── Status ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TripStatusResponse {
    pub state: TrackingState,
    pub entry_count: usize,
    pub prompt_pending: bool,
}

async fn get_trip(State(state): State<Arc<AppState>>) -> Json<TripStatusResponse> {
    Json(TripStatusResponse {
        state: state.orchestrator.state().await,
        entry_count: state.orchestrator.entry_count().await,
        prompt_pending: state.presenter.has_pending_prompt(),
    })
}

// ─── Commands ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ToggleResponse {
    pub outcome: ToggleOutcome,
    pub state: TrackingState,
}

/// Start/stop button.
///
/// If authorization has not been decided yet, this waits until the device
/// answers (or the request times out).
async fn toggle_tracking(State(state): State<Arc<AppState>>) -> Result<Json<ToggleResponse>> {
    let outcome = state.orchestrator.toggle_tracking().await?;
    tracing::info!(?outcome, "Tracking toggled");
    respond(&state, outcome).await
}

async fn continue_trip(State(state): State<Arc<AppState>>) -> Result<Json<ToggleResponse>> {
    let prompt = pending_prompt(&state)?;
    let outcome = prompt.continue_trip().await?;
    respond(&state, outcome).await
}

async fn discard_trip(State(state): State<Arc<AppState>>) -> Result<Json<ToggleResponse>> {
    let prompt = pending_prompt(&state)?;
    let outcome = prompt.discard_and_start_new().await?;
    respond(&state, outcome).await
}

fn pending_prompt(state: &AppState) -> Result<crate::services::TripPrompt> {
    state
        .presenter
        .take_prompt()
        .ok_or_else(|| AppError::Conflict("No trip prompt pending".to_string()))
}

async fn respond(state: &AppState, outcome: ToggleOutcome) -> Result<Json<ToggleResponse>> {
    Ok(Json(ToggleResponse {
        outcome,
        state: state.orchestrator.state().await,
    }))
}

// ─── Entries ─────────────────────────────────────────────────

async fn list_entries(State(state): State<Arc<AppState>>) -> Json<Vec<TripEntrySummary>> {
    let entries = state.orchestrator.entries().await;
    Json(
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| entry.summary(index))
            .collect(),
    )
}

async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<TripEntrySummary>> {
    let entry = state
        .orchestrator
        .entry_at(index)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Trip entry {}", index)))?;
    Ok(Json(entry.summary(index)))
}

/// Raw image bytes for an entry.
async fn get_entry_image(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse> {
    let entry = state
        .orchestrator
        .entry_at(index)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Trip entry {}", index)))?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], entry.photo.image.clone()))
}

// ─── Events ──────────────────────────────────────────────────

async fn list_events(State(state): State<Arc<AppState>>) -> Json<Vec<TripEvent>> {
    Json(state.presenter.events())
}
