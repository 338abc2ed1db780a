// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip orchestration.
//!
//! Handles the core workflow for each location fix:
//! 1. Drop fixes that repeat a recently accepted one
//! 2. Search for photos near the fix
//! 3. Pick the first photo not already in the trip log
//! 4. Download it and prepend the entry to the log
//! 5. Tell the presenter the log changed
//!
//! Each accepted fix runs as its own task, so pipelines for consecutive
//! fixes may overlap. Stopping tracking does not cancel pipelines that are
//! already running; they still complete and update the log.

use crate::config::TripSettings;
use crate::error::TripError;
use crate::models::{GeoPosition, TripEntry, TripPhoto};
use crate::services::dedup::{RecentPositions, RevisitPolicy};
use crate::services::location::{
    AuthorizationStatus, LocationError, LocationSource, LocationUpdate,
};
use crate::services::photos::{PhotoError, PhotoFetchClient, PhotoSearchClient};
use crate::services::presenter::{AuthorizationIssue, PipelineStage, TripPresenter};
use crate::services::trip_log::TripLog;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};

/// Tracking lifecycle.
///
/// `AwaitingAuthorization` covers the permission check and any request
/// that is waiting for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    #[default]
    Idle,
    AwaitingAuthorization,
    Tracking,
}

/// Result of handling one location fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    NotTracking,
    Duplicate,
    Appended { photo_id: String },
}

/// Result of the start/stop button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Started,
    /// Authorization was not granted in time; still idle.
    NotStarted,
    Stopped,
    /// The presenter was asked whether to continue or discard the trip.
    Prompted,
    /// An authorization check is already in progress.
    Pending,
}

/// Coordinates location updates, photo lookups and the trip log.
///
/// Cheap to clone; all clones share the same trip.
#[derive(Clone)]
pub struct TripOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    settings: TripSettings,
    location: Arc<dyn LocationSource>,
    search: Arc<dyn PhotoSearchClient>,
    fetch: Arc<dyn PhotoFetchClient>,
    presenter: Weak<dyn TripPresenter>,
    state: Mutex<TrackingState>,
    recent: Mutex<RecentPositions>,
    log: TripLog,
    updates_task: Mutex<Option<JoinHandle<()>>>,
    /// Bumped whenever an update stream is started or abandoned.
    stream_generation: AtomicU64,
    pipelines: Mutex<JoinSet<()>>,
}

impl TripOrchestrator {
    /// Create an idle orchestrator with an empty trip.
    ///
    /// Only a weak reference to `presenter` is kept; the caller owns it.
    pub fn new<P: TripPresenter + 'static>(
        settings: TripSettings,
        location: Arc<dyn LocationSource>,
        search: Arc<dyn PhotoSearchClient>,
        fetch: Arc<dyn PhotoFetchClient>,
        presenter: &Arc<P>,
    ) -> Self {
        let presenter: Weak<P> = Arc::downgrade(presenter);
        let presenter: Weak<dyn TripPresenter> = presenter;
        Self {
            inner: Arc::new(Inner {
                settings,
                location,
                search,
                fetch,
                presenter,
                state: Mutex::new(TrackingState::Idle),
                recent: Mutex::new(RecentPositions::new(settings.dedup)),
                log: TripLog::new(),
                updates_task: Mutex::new(None),
                stream_generation: AtomicU64::new(0),
                pipelines: Mutex::new(JoinSet::new()),
            }),
        }
    }

    pub fn settings(&self) -> TripSettings {
        self.inner.settings
    }

    pub async fn state(&self) -> TrackingState {
        *self.inner.state.lock().await
    }

    pub async fn is_tracking(&self) -> bool {
        self.state().await == TrackingState::Tracking
    }

    // ─── Read Surface ────────────────────────────────────────────────────────

    pub async fn entry_count(&self) -> usize {
        self.inner.log.len().await
    }

    /// Entry at `index`, where 0 is the most recent.
    pub async fn entry_at(&self, index: usize) -> Option<Arc<TripEntry>> {
        self.inner.log.get(index).await
    }

    pub async fn entries(&self) -> Vec<Arc<TripEntry>> {
        self.inner.log.snapshot().await
    }

    // ─── Commands ────────────────────────────────────────────────────────────

    /// Start/stop button.
    ///
    /// Starting with a non-empty log does not touch the log; instead the
    /// presenter receives a `TripPrompt` and the choice is made there.
    pub async fn toggle_tracking(&self) -> Result<ToggleOutcome, TripError> {
        match self.state().await {
            TrackingState::Tracking => {
                self.stop_tracking().await;
                Ok(ToggleOutcome::Stopped)
            }
            TrackingState::AwaitingAuthorization => Ok(ToggleOutcome::Pending),
            TrackingState::Idle => {
                if self.inner.log.is_empty().await {
                    return self.start_outcome().await;
                }
                let entries = self.entry_count().await;
                tracing::info!(entries, "Existing trip found, asking whether to continue");
                let prompt = TripPrompt {
                    orchestrator: Arc::downgrade(&self.inner),
                };
                if let Some(presenter) = self.presenter() {
                    presenter.prompt_continue_or_discard(prompt);
                }
                Ok(ToggleOutcome::Prompted)
            }
        }
    }

    /// Check permissions and begin receiving location updates.
    ///
    /// Returns the resulting state. Authorization problems are reported to
    /// the presenter and returned as errors.
    pub async fn start_tracking(&self) -> Result<TrackingState, TripError> {
        {
            let mut state = self.inner.state.lock().await;
            if *state != TrackingState::Idle {
                return Ok(*state);
            }
            *state = TrackingState::AwaitingAuthorization;
        }
        self.notify_tracking_changed(TrackingState::AwaitingAuthorization);

        let location = &self.inner.location;
        if !location.services_enabled().await {
            return Err(self.refuse(AuthorizationIssue::ServicesDisabled).await);
        }

        let mut status = location.authorization_status();
        if status == AuthorizationStatus::NotDetermined {
            tracing::info!("Requesting location authorization");
            status = location.request_authorization().await;
        }

        match status {
            AuthorizationStatus::Authorized => Ok(self.begin_updates().await),
            AuthorizationStatus::Denied => Err(self.refuse(AuthorizationIssue::Denied).await),
            AuthorizationStatus::Restricted => {
                Err(self.refuse(AuthorizationIssue::Restricted).await)
            }
            AuthorizationStatus::NotDetermined => {
                tracing::info!("Authorization request went unanswered");
                self.set_state(TrackingState::Idle).await;
                Ok(TrackingState::Idle)
            }
        }
    }

    /// Stop location updates. The trip log is kept and in-flight pipelines
    /// run to completion.
    pub async fn stop_tracking(&self) {
        self.halt().await;
    }

    /// Discard the trip: stop tracking, clear the log and the recent
    /// positions, and reset the location source.
    pub async fn reset_trip(&self) {
        self.halt().await;
        self.inner.recent.lock().await.clear();
        self.inner.log.clear().await;
        self.inner.location.reset().await;
        tracing::info!("Trip discarded");
        if let Some(presenter) = self.presenter() {
            presenter.notify_log_changed();
        }
    }

    /// Wait for every pipeline started so far to finish.
    pub async fn drain_pipelines(&self) {
        let mut pipelines = std::mem::take(&mut *self.inner.pipelines.lock().await);
        while let Some(result) = pipelines.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    tracing::error!(error = %e, "Photo pipeline panicked");
                }
            }
        }
    }

    // ─── Location Pipeline ───────────────────────────────────────────────────

    /// Handle one location fix: dedup, search, select, download, prepend.
    pub async fn on_location_update(
        &self,
        position: GeoPosition,
    ) -> Result<UpdateOutcome, TripError> {
        if !self.is_tracking().await {
            tracing::debug!("Ignoring location update while not tracking");
            return Ok(UpdateOutcome::NotTracking);
        }

        if !self.accept(position).await {
            tracing::debug!(
                latitude = position.latitude,
                longitude = position.longitude,
                "Ignoring duplicate location"
            );
            return Ok(UpdateOutcome::Duplicate);
        }

        let photo_id = self.acquire_photo(position).await?;
        Ok(UpdateOutcome::Appended { photo_id })
    }

    /// Record the fix as seen unless it repeats an earlier one.
    async fn accept(&self, position: GeoPosition) -> bool {
        let mut recent = self.inner.recent.lock().await;
        if recent.is_duplicate(&position) {
            return false;
        }
        if self.inner.settings.revisit == RevisitPolicy::Skip
            && self.inner.log.contains_position(&position).await
        {
            return false;
        }
        recent.admit(position)
    }

    async fn acquire_photo(&self, position: GeoPosition) -> Result<String, TripError> {
        let inner = &self.inner;

        tracing::info!(
            latitude = position.latitude,
            longitude = position.longitude,
            "Searching for photos near location"
        );
        let candidates = match inner.search.search(&position).await {
            Ok(candidates) => candidates,
            Err(cause) => return Err(self.pipeline_failed(PipelineStage::Search, cause)),
        };

        let Some(candidate) = inner.log.first_unseen(&candidates).await else {
            return Err(self.no_new_photo(&position, candidates.len()));
        };

        tracing::debug!(photo_id = %candidate.id, "Downloading photo");
        let image = match inner.fetch.fetch(&candidate, inner.settings.photo_size).await {
            Ok(image) => image,
            Err(cause) => return Err(self.pipeline_failed(PipelineStage::Download, cause)),
        };

        let photo_id = candidate.id.clone();
        let entry = TripEntry::new(
            position,
            TripPhoto {
                id: candidate.id,
                title: candidate.title,
                image,
            },
        );

        // An overlapping pipeline may have logged the same photo meanwhile.
        if !inner.log.prepend_unique(entry).await {
            tracing::debug!(photo_id = %photo_id, "Photo was logged by another update");
            return Err(self.no_new_photo(&position, candidates.len()));
        }

        let entries = inner.log.len().await;
        tracing::info!(photo_id = %photo_id, entries, "Trip log updated");
        if let Some(presenter) = self.presenter() {
            presenter.notify_log_changed();
        }
        Ok(photo_id)
    }

    fn pipeline_failed(&self, stage: PipelineStage, cause: PhotoError) -> TripError {
        tracing::warn!(stage = %stage, error = %cause, "Photo pipeline failed");
        if let Some(presenter) = self.presenter() {
            presenter.report_pipeline_failure(stage, &cause);
        }
        match stage {
            PipelineStage::Search => TripError::PhotoSearchFailed(cause),
            PipelineStage::Download => TripError::PhotoDownloadFailed(cause),
        }
    }

    fn no_new_photo(&self, position: &GeoPosition, candidates: usize) -> TripError {
        tracing::info!(candidates, "No photos near this location that are not already logged");
        if let Some(presenter) = self.presenter() {
            presenter.report_no_new_photo(position);
        }
        TripError::NoNewPhotoAvailable
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    async fn start_outcome(&self) -> Result<ToggleOutcome, TripError> {
        match self.start_tracking().await? {
            TrackingState::Tracking => Ok(ToggleOutcome::Started),
            TrackingState::AwaitingAuthorization => Ok(ToggleOutcome::Pending),
            TrackingState::Idle => Ok(ToggleOutcome::NotStarted),
        }
    }

    /// Start the source and spawn the task consuming its stream.
    async fn begin_updates(&self) -> TrackingState {
        let mut state = self.inner.state.lock().await;
        if *state != TrackingState::AwaitingAuthorization {
            // Stopped while the permission check was running.
            return *state;
        }

        let updates = self.inner.location.start_updates().await;
        let generation = self.inner.stream_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let consumer = tokio::spawn(consume_updates(
            Arc::downgrade(&self.inner),
            updates,
            generation,
        ));
        if let Some(previous) = self.inner.updates_task.lock().await.replace(consumer) {
            previous.abort();
        }
        *state = TrackingState::Tracking;
        drop(state);

        tracing::info!("Tracking started");
        self.notify_tracking_changed(TrackingState::Tracking);
        TrackingState::Tracking
    }

    /// Go idle and stop the update stream.
    async fn halt(&self) {
        self.halt_stream(None).await;
    }

    /// Go idle. The consumer task passes its own stream generation and is
    /// ignored if that stream has since been replaced or abandoned.
    async fn halt_stream(&self, generation: Option<u64>) {
        let mut state = self.inner.state.lock().await;
        if generation.is_some_and(|g| g != self.inner.stream_generation.load(Ordering::SeqCst)) {
            return;
        }
        let previous = *state;
        *state = TrackingState::Idle;
        self.inner.stream_generation.fetch_add(1, Ordering::SeqCst);

        let consumer = self.inner.updates_task.lock().await.take();
        if let Some(consumer) = consumer {
            // The consumer never aborts itself.
            if generation.is_none() {
                consumer.abort();
            }
        }
        self.inner.location.stop_updates().await;
        drop(state);

        if previous != TrackingState::Idle {
            tracing::info!("Tracking stopped");
            self.notify_tracking_changed(TrackingState::Idle);
        }
    }

    async fn refuse(&self, issue: AuthorizationIssue) -> TripError {
        self.set_state(TrackingState::Idle).await;
        tracing::warn!(?issue, "Cannot start tracking");
        if let Some(presenter) = self.presenter() {
            presenter.report_authorization_issue(issue);
        }
        issue.into()
    }

    async fn set_state(&self, new_state: TrackingState) {
        let changed = {
            let mut state = self.inner.state.lock().await;
            let changed = *state != new_state;
            *state = new_state;
            changed
        };
        if changed {
            self.notify_tracking_changed(new_state);
        }
    }

    async fn spawn_pipeline(&self, position: GeoPosition) {
        let orchestrator = self.clone();
        let mut pipelines = self.inner.pipelines.lock().await;
        // Reap finished pipelines so the set does not grow for the whole trip.
        while pipelines.try_join_next().is_some() {}
        pipelines.spawn(async move {
            if let Err(e) = orchestrator.on_location_update(position).await {
                tracing::debug!(error = %e, failure = e.is_failure(), "Location update finished without a photo");
            }
        });
    }

    fn notify_tracking_changed(&self, state: TrackingState) {
        if let Some(presenter) = self.presenter() {
            presenter.notify_tracking_changed(state);
        }
    }

    fn presenter(&self) -> Option<Arc<dyn TripPresenter>> {
        let presenter = self.inner.presenter.upgrade();
        if presenter.is_none() {
            tracing::debug!("Presenter dropped, notification discarded");
        }
        presenter
    }
}

/// Forward fixes from the location source into pipelines until the stream
/// ends or the orchestrator is dropped.
///
/// If the stream ends while it is still the current one, tracking goes idle.
async fn consume_updates(
    orchestrator: Weak<Inner>,
    mut updates: mpsc::Receiver<LocationUpdate>,
    generation: u64,
) {
    while let Some(update) = updates.recv().await {
        let Some(inner) = orchestrator.upgrade() else {
            return;
        };
        let orchestrator = TripOrchestrator { inner };

        let issue = match update {
            Ok(position) => {
                orchestrator.spawn_pipeline(position).await;
                continue;
            }
            Err(LocationError::Denied) => AuthorizationIssue::Denied,
            Err(LocationError::Restricted) => AuthorizationIssue::Restricted,
            Err(e) => {
                tracing::warn!(error = %e, "Location update failed");
                continue;
            }
        };

        tracing::warn!(?issue, "Location permission withdrawn while tracking");
        orchestrator.halt_stream(Some(generation)).await;
        if let Some(presenter) = orchestrator.presenter() {
            presenter.report_authorization_issue(issue);
        }
        return;
    }

    tracing::debug!("Location update stream closed");
    if let Some(inner) = orchestrator.upgrade() {
        TripOrchestrator { inner }
            .halt_stream(Some(generation))
            .await;
    }
}

/// The choice offered when tracking starts while a trip already exists.
///
/// Each method consumes the prompt, so at most one choice is taken.
/// Dropping the prompt takes neither.
pub struct TripPrompt {
    orchestrator: Weak<Inner>,
}

impl TripPrompt {
    /// Keep the existing log and start tracking again.
    pub async fn continue_trip(self) -> Result<ToggleOutcome, TripError> {
        let orchestrator = self.upgrade()?;
        tracing::info!("Continuing existing trip");
        orchestrator.start_outcome().await
    }

    /// Clear the log and recent positions, then start tracking.
    pub async fn discard_and_start_new(self) -> Result<ToggleOutcome, TripError> {
        let orchestrator = self.upgrade()?;
        orchestrator.reset_trip().await;
        orchestrator.start_outcome().await
    }

    fn upgrade(&self) -> Result<TripOrchestrator, TripError> {
        self.orchestrator
            .upgrade()
            .map(|inner| TripOrchestrator { inner })
            .ok_or(TripError::OrchestratorGone)
    }
}

impl fmt::Debug for TripPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TripPrompt")
            .field("orchestrator_alive", &(self.orchestrator.strong_count() > 0))
            .finish()
    }
}
