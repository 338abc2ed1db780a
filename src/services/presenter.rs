// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Presentation boundary: the calls the orchestrator makes outward.
//!
//! `EventLog` is the presenter used by the HTTP service. It keeps the most
//! recent notifications for clients to poll and parks the pending
//! continue/discard prompt until a client answers it.

use crate::models::GeoPosition;
use crate::services::orchestrator::{TrackingState, TripPrompt};
use crate::services::photos::PhotoError;
use crate::time_utils::format_utc_rfc3339;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of events retained by `EventLog`.
const EVENT_CAPACITY: usize = 100;

/// Why tracking could not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationIssue {
    Denied,
    Restricted,
    ServicesDisabled,
}

/// Pipeline step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Search,
    Download,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Search => f.write_str("search"),
            PipelineStage::Download => f.write_str("download"),
        }
    }
}

/// Receiver of everything the orchestrator reports.
///
/// The orchestrator only holds a weak reference; notifications sent after
/// the presenter is dropped are discarded.
pub trait TripPresenter: Send + Sync {
    fn report_authorization_issue(&self, issue: AuthorizationIssue);

    fn report_pipeline_failure(&self, stage: PipelineStage, cause: &PhotoError);

    fn notify_log_changed(&self);

    /// Ask whether to continue the existing trip or discard it.
    fn prompt_continue_or_discard(&self, prompt: TripPrompt);

    /// A search returned only photos that are already in the log.
    fn report_no_new_photo(&self, _position: &GeoPosition) {}

    fn notify_tracking_changed(&self, _state: TrackingState) {}
}

/// A recorded notification.
#[derive(Debug, Clone, Serialize)]
pub struct TripEvent {
    pub at: String,
    #[serde(flatten)]
    pub kind: TripEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripEventKind {
    AuthorizationIssue { issue: AuthorizationIssue },
    PipelineFailed { stage: PipelineStage, cause: String },
    NoNewPhoto { latitude: f64, longitude: f64 },
    LogChanged,
    Prompt,
    TrackingChanged { state: TrackingState },
}

/// Presenter that records events for polling clients.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<VecDeque<TripEvent>>,
    pending_prompt: Mutex<Option<TripPrompt>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> Vec<TripEvent> {
        lock(&self.events).iter().cloned().collect()
    }

    pub fn has_pending_prompt(&self) -> bool {
        lock(&self.pending_prompt).is_some()
    }

    /// Take the pending prompt so a client can answer it.
    pub fn take_prompt(&self) -> Option<TripPrompt> {
        lock(&self.pending_prompt).take()
    }

    fn record(&self, kind: TripEventKind) {
        let mut events = lock(&self.events);
        if events.len() == EVENT_CAPACITY {
            events.pop_front();
        }
        events.push_back(TripEvent {
            at: format_utc_rfc3339(chrono::Utc::now()),
            kind,
        });
    }
}

impl TripPresenter for EventLog {
    fn report_authorization_issue(&self, issue: AuthorizationIssue) {
        self.record(TripEventKind::AuthorizationIssue { issue });
    }

    fn report_pipeline_failure(&self, stage: PipelineStage, cause: &PhotoError) {
        self.record(TripEventKind::PipelineFailed {
            stage,
            cause: cause.to_string(),
        });
    }

    fn notify_log_changed(&self) {
        self.record(TripEventKind::LogChanged);
    }

    fn prompt_continue_or_discard(&self, prompt: TripPrompt) {
        // A newer prompt replaces an unanswered one.
        lock(&self.pending_prompt).replace(prompt);
        self.record(TripEventKind::Prompt);
    }

    fn report_no_new_photo(&self, position: &GeoPosition) {
        self.record(TripEventKind::NoNewPhoto {
            latitude: position.latitude,
            longitude: position.longitude,
        });
    }

    fn notify_tracking_changed(&self, state: TrackingState) {
        self.record(TripEventKind::TrackingChanged { state });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_is_bounded() {
        let log = EventLog::new();
        for _ in 0..(EVENT_CAPACITY + 5) {
            log.notify_log_changed();
        }
        log.report_authorization_issue(AuthorizationIssue::Denied);

        let events = log.events();
        assert_eq!(events.len(), EVENT_CAPACITY);
        assert_eq!(
            events.last().unwrap().kind,
            TripEventKind::AuthorizationIssue {
                issue: AuthorizationIssue::Denied
            }
        );
    }

    #[test]
    fn test_event_serialization() {
        let log = EventLog::new();
        log.report_pipeline_failure(PipelineStage::Download, &PhotoError::EmptyPayload);

        let json = serde_json::to_value(&log.events()[0]).unwrap();
        assert_eq!(json["type"], "pipeline_failed");
        assert_eq!(json["stage"], "download");
        assert_eq!(json["cause"], "Response payload was empty");
        assert!(json["at"].as_str().unwrap().ends_with('Z'));
    }
}
