// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ordered log of visited locations and their photos.
//!
//! Entries are kept newest first. Each photo ID appears at most once; the
//! uniqueness check and the insert happen under one write guard so
//! overlapping pipelines cannot add the same photo twice.

use crate::models::{GeoPosition, PhotoCandidate, TripEntry};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct TripLog {
    entries: RwLock<VecDeque<Arc<TripEntry>>>,
}

impl TripLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Entry at `index`, where 0 is the most recent.
    pub async fn get(&self, index: usize) -> Option<Arc<TripEntry>> {
        self.entries.read().await.get(index).cloned()
    }

    /// Snapshot of all entries, most recent first.
    pub async fn snapshot(&self) -> Vec<Arc<TripEntry>> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn contains_photo(&self, photo_id: &str) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|e| e.photo.id == photo_id)
    }

    pub async fn contains_position(&self, position: &GeoPosition) -> bool {
        self.entries
            .read()
            .await
            .iter()
            .any(|e| e.position.same_place(position))
    }

    /// First candidate, in the given order, whose photo is not logged yet.
    pub async fn first_unseen(&self, candidates: &[PhotoCandidate]) -> Option<PhotoCandidate> {
        let entries = self.entries.read().await;
        candidates
            .iter()
            .find(|c| !entries.iter().any(|e| e.photo.id == c.id))
            .cloned()
    }

    /// Insert at the head of the log.
    ///
    /// Returns `false` and leaves the log untouched if an entry with the
    /// same photo ID is already present.
    pub async fn prepend_unique(&self, entry: TripEntry) -> bool {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.photo.id == entry.photo.id) {
            return false;
        }
        entries.push_front(Arc::new(entry));
        true
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}
