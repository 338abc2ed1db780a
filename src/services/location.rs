// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Location source capability and the push-driven device implementation.
//!
//! `DeviceLocationSource` is fed from outside (the device HTTP routes, or
//! tests): fixes are forwarded on an mpsc channel while updates are running,
//! and authorization answers are published on a watch channel so a pending
//! `request_authorization` wakes up as soon as the device responds.

use crate::models::GeoPosition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

/// Buffered fixes per update stream before pushes start waiting.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Location permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Denied,
    Restricted,
    Authorized,
}

/// Error delivered on the update stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// Permission was withdrawn; the stream ends after this.
    #[error("Location permission denied")]
    Denied,

    /// Access is restricted by policy; the stream ends after this.
    #[error("Location permission restricted")]
    Restricted,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

pub type LocationUpdate = Result<GeoPosition, LocationError>;

/// Source of location fixes with permission and lifecycle controls.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Whether location services are enabled at the platform level.
    async fn services_enabled(&self) -> bool;

    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask for permission and wait for the answer.
    async fn request_authorization(&self) -> AuthorizationStatus;

    /// Start delivering fixes. The stream ends when updates are stopped.
    async fn start_updates(&self) -> mpsc::Receiver<LocationUpdate>;

    async fn stop_updates(&self);

    /// Stop updates and forget any pending request.
    async fn reset(&self);
}

/// Location source whose state is pushed in by the device.
pub struct DeviceLocationSource {
    services_enabled: AtomicBool,
    authorization: watch::Sender<AuthorizationStatus>,
    authorization_requested: AtomicBool,
    updates: Mutex<Option<mpsc::Sender<LocationUpdate>>>,
    request_timeout: Duration,
}

impl DeviceLocationSource {
    pub fn new(request_timeout: Duration) -> Self {
        let (authorization, _) = watch::channel(AuthorizationStatus::NotDetermined);
        Self {
            services_enabled: AtomicBool::new(true),
            authorization,
            authorization_requested: AtomicBool::new(false),
            updates: Mutex::new(None),
            request_timeout,
        }
    }

    /// Start from a known authorization state.
    pub fn with_authorization(self, status: AuthorizationStatus) -> Self {
        self.authorization.send_replace(status);
        self
    }

    pub fn set_services_enabled(&self, enabled: bool) {
        self.services_enabled.store(enabled, Ordering::SeqCst);
    }

    /// Record the device's answer. Withdrawing permission while updates
    /// are running ends the stream with a matching error.
    pub async fn set_authorization(&self, status: AuthorizationStatus) {
        let previous = self.authorization.send_replace(status);
        self.authorization_requested.store(false, Ordering::SeqCst);
        tracing::info!(?previous, current = ?status, "Location authorization changed");

        let error = match status {
            AuthorizationStatus::Denied => LocationError::Denied,
            AuthorizationStatus::Restricted => LocationError::Restricted,
            _ => return,
        };
        let sender = self.updates.lock().await.take();
        if let Some(sender) = sender {
            if sender.send(Err(error)).await.is_err() {
                tracing::debug!("Update stream already closed, revocation not delivered");
            }
        }
    }

    /// Whether a permission request is waiting for the device to answer.
    pub fn authorization_requested(&self) -> bool {
        self.authorization_requested.load(Ordering::SeqCst)
    }

    pub async fn is_updating(&self) -> bool {
        self.updates.lock().await.is_some()
    }

    /// Forward a fix. Returns `false` if updates are not running.
    pub async fn push_position(&self, position: GeoPosition) -> bool {
        self.push(Ok(position)).await
    }

    /// Forward a failure. Returns `false` if updates are not running.
    pub async fn push_failure(&self, error: LocationError) -> bool {
        self.push(Err(error)).await
    }

    async fn push(&self, update: LocationUpdate) -> bool {
        // Clone the sender so a full channel does not block stop/reset.
        let sender = self.updates.lock().await.clone();
        match sender {
            Some(sender) => sender.send(update).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl LocationSource for DeviceLocationSource {
    async fn services_enabled(&self) -> bool {
        self.services_enabled.load(Ordering::SeqCst)
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        *self.authorization.borrow()
    }

    async fn request_authorization(&self) -> AuthorizationStatus {
        let mut changes = self.authorization.subscribe();
        self.authorization_requested.store(true, Ordering::SeqCst);
        tracing::info!("Waiting for device to answer authorization request");

        if tokio::time::timeout(self.request_timeout, changes.changed())
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_secs = self.request_timeout.as_secs(),
                "Authorization request timed out"
            );
        }

        self.authorization_requested.store(false, Ordering::SeqCst);
        let status = *changes.borrow();
        status
    }

    async fn start_updates(&self) -> mpsc::Receiver<LocationUpdate> {
        let (sender, receiver) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        if self.updates.lock().await.replace(sender).is_some() {
            tracing::debug!("Replaced running location update stream");
        }
        receiver
    }

    async fn stop_updates(&self) {
        self.updates.lock().await.take();
    }

    async fn reset(&self) {
        self.stop_updates().await;
        self.authorization_requested.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_push_without_updates_is_rejected() {
        let source = DeviceLocationSource::new(Duration::from_secs(1));
        assert!(!source.push_position(GeoPosition::now(1.0, 2.0)).await);
    }

    #[tokio::test]
    async fn test_updates_flow_until_stopped() {
        let source = DeviceLocationSource::new(Duration::from_secs(1));
        let mut updates = source.start_updates().await;

        let position = GeoPosition::now(51.5, -0.12);
        assert!(source.push_position(position).await);
        assert_eq!(updates.recv().await, Some(Ok(position)));

        source.stop_updates().await;
        assert!(!source.is_updating().await);
        assert_eq!(updates.recv().await, None);
    }

    #[tokio::test]
    async fn test_request_authorization_waits_for_answer() {
        let source = Arc::new(DeviceLocationSource::new(Duration::from_secs(5)));
        let requester = source.clone();
        let request = tokio::spawn(async move { requester.request_authorization().await });

        while !source.authorization_requested() {
            tokio::task::yield_now().await;
        }
        source
            .set_authorization(AuthorizationStatus::Authorized)
            .await;

        let status = request.await.expect("Task join failed");
        assert_eq!(status, AuthorizationStatus::Authorized);
        assert!(!source.authorization_requested());
    }

    #[tokio::test]
    async fn test_request_authorization_times_out() {
        let source = DeviceLocationSource::new(Duration::from_millis(20));
        let status = source.request_authorization().await;
        assert_eq!(status, AuthorizationStatus::NotDetermined);
        assert!(!source.authorization_requested());
    }

    #[tokio::test]
    async fn test_revoking_permission_ends_stream() {
        let source = DeviceLocationSource::new(Duration::from_secs(1))
            .with_authorization(AuthorizationStatus::Authorized);
        let mut updates = source.start_updates().await;

        source.set_authorization(AuthorizationStatus::Denied).await;

        assert_eq!(updates.recv().await, Some(Err(LocationError::Denied)));
        assert_eq!(updates.recv().await, None);
        assert!(!source.is_updating().await);
    }

    #[tokio::test]
    async fn test_restricting_permission_ends_stream() {
        let source = DeviceLocationSource::new(Duration::from_secs(1))
            .with_authorization(AuthorizationStatus::Authorized);
        let mut updates = source.start_updates().await;

        source
            .set_authorization(AuthorizationStatus::Restricted)
            .await;

        assert_eq!(updates.recv().await, Some(Err(LocationError::Restricted)));
        assert_eq!(updates.recv().await, None);
    }

    #[tokio::test]
    async fn test_revoking_after_receiver_dropped() {
        let source = DeviceLocationSource::new(Duration::from_secs(1))
            .with_authorization(AuthorizationStatus::Authorized);
        drop(source.start_updates().await);

        source.set_authorization(AuthorizationStatus::Denied).await;

        assert!(!source.is_updating().await);
        assert_eq!(source.authorization_status(), AuthorizationStatus::Denied);
    }
}
