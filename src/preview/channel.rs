//! Build result ordering and the latest published result.
//!
//! Builds may finish out of order. Each one carries the sequence number it
//! was started with; [`ResultGate`] only lets a result through when no newer
//! one has been shown. The accepted result is kept in [`Published`] so late
//! clients and the HTTP endpoints see the same state as connected ones.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::bundler::BundleResult;

/// Last-result-wins filter over sequence numbers.
#[derive(Debug, Default)]
pub struct ResultGate {
    /// Highest sequence number shown so far, 0 when none.
    shown: AtomicU64,
}

impl ResultGate {
    pub const fn new() -> Self {
        Self {
            shown: AtomicU64::new(0),
        }
    }

    /// Claim `seq` for display.
    ///
    /// Returns `false` when a result with the same or a newer sequence
    /// number was already accepted; the caller drops the result.
    pub fn accept(&self, seq: u64) -> bool {
        self.shown.fetch_max(seq, Ordering::AcqRel) < seq
    }

    /// Whether `seq` would still be accepted.
    pub fn is_current(&self, seq: u64) -> bool {
        self.shown.load(Ordering::Acquire) < seq
    }

    pub fn shown(&self) -> u64 {
        self.shown.load(Ordering::Acquire)
    }
}

/// A result that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub seq: u64,
    pub result: BundleResult,
}

/// Slot holding the latest accepted result.
#[derive(Debug, Default)]
pub struct LatestResult(RwLock<Option<Published>>);

impl LatestResult {
    pub const fn new() -> Self {
        Self(RwLock::new(None))
    }

    /// Replace the published result.
    pub fn publish(&self, seq: u64, result: BundleResult) {
        *self.0.write() = Some(Published { seq, result });
    }

    pub fn get(&self) -> Option<Published> {
        self.0.read().clone()
    }

    /// Code of the latest result when it is a bundle.
    pub fn code(&self) -> Option<String> {
        self.0
            .read()
            .as_ref()
            .and_then(|published| published.result.code().map(str::to_string))
    }
}

/// Result shown to host pages, shared with the HTTP endpoints.
static PUBLISHED: LatestResult = LatestResult::new();

pub fn publish(seq: u64, result: BundleResult) {
    PUBLISHED.publish(seq, result);
}

/// The latest accepted result, if any build has finished.
pub fn latest() -> Option<Published> {
    PUBLISHED.get()
}
