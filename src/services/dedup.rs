// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Duplicate suppression for incoming location fixes.
//!
//! Location sources commonly redeliver the same fix several times. Every
//! accepted fix is remembered for the lifetime of the trip; there is no
//! eviction, so memory grows with the number of accepted fixes.

use crate::models::GeoPosition;
use std::time::Duration;

/// How a new fix is compared against previously accepted fixes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DedupPolicy {
    /// Same coordinates, at any time.
    #[default]
    Exact,
    /// Same coordinates observed less than `window` apart.
    ExactWithin(Duration),
    /// Within `meters` (haversine) and observed less than `window` apart.
    Proximity { meters: f64, window: Duration },
}

impl DedupPolicy {
    /// Whether `candidate` counts as a repeat of `seen`.
    pub fn matches(&self, seen: &GeoPosition, candidate: &GeoPosition) -> bool {
        match *self {
            DedupPolicy::Exact => seen.same_place(candidate),
            DedupPolicy::ExactWithin(window) => {
                seen.same_place(candidate) && within(seen, candidate, window)
            }
            DedupPolicy::Proximity { meters, window } => {
                within(seen, candidate, window) && seen.distance_meters(candidate) <= meters
            }
        }
    }
}

/// Whether a position already present in the trip log may produce another entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevisitPolicy {
    /// Revisits are searched again; only the photo must be new.
    #[default]
    Allow,
    /// Fixes at a logged position are dropped as duplicates.
    Skip,
}

fn within(a: &GeoPosition, b: &GeoPosition, window: Duration) -> bool {
    a.time_between(b).to_std().is_ok_and(|elapsed| elapsed < window)
}

/// Every fix accepted during the current trip.
#[derive(Debug, Clone, Default)]
pub struct RecentPositions {
    policy: DedupPolicy,
    seen: Vec<GeoPosition>,
}

impl RecentPositions {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            seen: Vec::new(),
        }
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Check whether the fix repeats one already accepted.
    pub fn is_duplicate(&self, position: &GeoPosition) -> bool {
        self.seen.iter().any(|seen| self.policy.matches(seen, position))
    }

    /// Record the fix unless it is a duplicate. Returns `true` if accepted.
    pub fn admit(&mut self, position: GeoPosition) -> bool {
        if self.is_duplicate(&position) {
            return false;
        }
        self.seen.push(position);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}
