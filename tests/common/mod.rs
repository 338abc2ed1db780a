// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use photo_trail::config::{Config, TripSettings};
use photo_trail::models::{GeoPosition, PhotoCandidate, PhotoSize};
use photo_trail::routes::create_router;
use photo_trail::services::{
    AuthorizationIssue, AuthorizationStatus, DeviceLocationSource, PhotoError, PhotoFetchClient,
    PhotoSearchClient, PipelineStage, TrackingState, TripOrchestrator, TripPresenter, TripPrompt,
};
use photo_trail::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Fixed epoch so positions compare deterministically.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_619_078_400 + secs, 0).unwrap()
}

pub fn position(latitude: f64, longitude: f64, secs: i64) -> GeoPosition {
    GeoPosition::new(latitude, longitude, at(secs))
}

pub fn candidate(id: &str) -> PhotoCandidate {
    PhotoCandidate {
        id: id.to_string(),
        source_server: "65535".to_string(),
        secret: format!("secret-{}", id),
        title: format!("Photo {}", id),
    }
}

/// Fake image bytes for a photo ID.
pub fn image_for(id: &str) -> Vec<u8> {
    let mut bytes = vec![0xff, 0xd8, 0xff];
    bytes.extend_from_slice(id.as_bytes());
    bytes
}

// ─── Photo clients ───────────────────────────────────────────────────────────

/// Search and fetch client with scripted results that records every call.
#[derive(Default)]
pub struct MockPhotos {
    candidates: Mutex<Vec<PhotoCandidate>>,
    search_error: Mutex<Option<PhotoError>>,
    fetch_errors: Mutex<HashMap<String, PhotoError>>,
    fetch_gate: Mutex<Option<Arc<Notify>>>,
    pub searches: Mutex<Vec<GeoPosition>>,
    pub fetches: Mutex<Vec<(String, PhotoSize)>>,
}

impl MockPhotos {
    pub fn with_candidates(ids: &[&str]) -> Arc<Self> {
        let photos = Arc::new(Self::default());
        photos.set_candidates(ids);
        photos
    }

    pub fn set_candidates(&self, ids: &[&str]) {
        *self.candidates.lock().unwrap() = ids.iter().map(|id| candidate(id)).collect();
    }

    pub fn fail_search(&self, error: PhotoError) {
        *self.search_error.lock().unwrap() = Some(error);
    }

    pub fn fail_fetch(&self, id: &str, error: PhotoError) {
        self.fetch_errors
            .lock()
            .unwrap()
            .insert(id.to_string(), error);
    }

    /// Make every fetch wait until the returned gate is notified.
    pub fn gate_fetches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.fetch_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    pub fn fetched_ids(&self) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl PhotoSearchClient for MockPhotos {
    async fn search(&self, position: &GeoPosition) -> Result<Vec<PhotoCandidate>, PhotoError> {
        self.searches.lock().unwrap().push(*position);
        if let Some(error) = self.search_error.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.candidates.lock().unwrap().clone())
    }
}

#[async_trait]
impl PhotoFetchClient for MockPhotos {
    async fn fetch(
        &self,
        candidate: &PhotoCandidate,
        size: PhotoSize,
    ) -> Result<Vec<u8>, PhotoError> {
        self.fetches
            .lock()
            .unwrap()
            .push((candidate.id.clone(), size));

        let gate = self.fetch_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.fetch_errors.lock().unwrap().get(&candidate.id) {
            return Err(error.clone());
        }
        Ok(image_for(&candidate.id))
    }
}

// ─── Presenter ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Reported {
    AuthorizationIssue(AuthorizationIssue),
    PipelineFailure(PipelineStage, PhotoError),
    NoNewPhoto(GeoPosition),
    LogChanged,
    Prompt,
    TrackingChanged(TrackingState),
}

/// Presenter that records every call.
#[derive(Default)]
pub struct RecordingPresenter {
    pub reports: Mutex<Vec<Reported>>,
    pub prompts: Mutex<Vec<TripPrompt>>,
}

impl RecordingPresenter {
    pub fn reports(&self) -> Vec<Reported> {
        self.reports.lock().unwrap().clone()
    }

    /// Reports other than tracking state changes.
    pub fn outcomes(&self) -> Vec<Reported> {
        self.reports()
            .into_iter()
            .filter(|r| !matches!(r, Reported::TrackingChanged(_)))
            .collect()
    }

    pub fn count(&self, wanted: &Reported) -> usize {
        self.reports().iter().filter(|r| *r == wanted).count()
    }

    pub fn take_prompt(&self) -> Option<TripPrompt> {
        self.prompts.lock().unwrap().pop()
    }

    fn push(&self, report: Reported) {
        self.reports.lock().unwrap().push(report);
    }
}

impl TripPresenter for RecordingPresenter {
    fn report_authorization_issue(&self, issue: AuthorizationIssue) {
        self.push(Reported::AuthorizationIssue(issue));
    }

    fn report_pipeline_failure(&self, stage: PipelineStage, cause: &PhotoError) {
        self.push(Reported::PipelineFailure(stage, cause.clone()));
    }

    fn notify_log_changed(&self) {
        self.push(Reported::LogChanged);
    }

    fn prompt_continue_or_discard(&self, prompt: TripPrompt) {
        self.prompts.lock().unwrap().push(prompt);
        self.push(Reported::Prompt);
    }

    fn report_no_new_photo(&self, position: &GeoPosition) {
        self.push(Reported::NoNewPhoto(*position));
    }

    fn notify_tracking_changed(&self, state: TrackingState) {
        self.push(Reported::TrackingChanged(state));
    }
}

// ─── Harness ─────────────────────────────────────────────────────────────────

pub struct Harness {
    pub orchestrator: TripOrchestrator,
    pub presenter: Arc<RecordingPresenter>,
    pub photos: Arc<MockPhotos>,
    pub device: Arc<DeviceLocationSource>,
}

/// Orchestrator with mock photos and a device in the given authorization state.
pub fn harness(settings: TripSettings, status: AuthorizationStatus) -> Harness {
    let presenter = Arc::new(RecordingPresenter::default());
    let photos = Arc::new(MockPhotos::default());
    let device = Arc::new(
        DeviceLocationSource::new(Duration::from_secs(5)).with_authorization(status),
    );
    let orchestrator = TripOrchestrator::new(
        settings,
        device.clone(),
        photos.clone(),
        photos.clone(),
        &presenter,
    );
    Harness {
        orchestrator,
        presenter,
        photos,
        device,
    }
}

/// Authorized harness that is already tracking.
pub async fn tracking_harness(settings: TripSettings) -> Harness {
    let h = harness(settings, AuthorizationStatus::Authorized);
    let state = h
        .orchestrator
        .start_tracking()
        .await
        .expect("Tracking should start");
    assert_eq!(state, TrackingState::Tracking);
    h
}

/// Wait until the device has a pending permission request.
pub async fn wait_for_authorization_request(device: &DeviceLocationSource) {
    for _ in 0..1000 {
        if device.authorization_requested() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("Authorization was never requested");
}

/// Create a test app backed by mock photo clients.
pub fn create_test_app(photos: Arc<MockPhotos>) -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let state = Arc::new(AppState::new(config, photos.clone(), photos));
    (create_router(state.clone()), state)
}
