//! Statistics and metrics for hub and broadcast activity

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of hub membership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Live connections
    pub connections: usize,
    /// Distinct topics with at least one member
    pub topics: usize,
    /// Total topic memberships across all connections
    pub subscriptions: usize,
}

/// Cumulative broadcast counters
///
/// Updated by the scheduler, readable from any task. Counters only ever
/// increase for the lifetime of the process.
#[derive(Debug, Default)]
pub struct BroadcastCounters {
    frames_broadcast: AtomicU64,
    ticks_skipped: AtomicU64,
    deliveries: AtomicU64,
    send_failures: AtomicU64,
}

impl BroadcastCounters {
    /// Create a zeroed counter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick whose frame was fanned out
    pub fn record_frame(&self) {
        self.frames_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a tick skipped due to a production failure
    pub fn record_skipped_tick(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record per-send outcomes from one fan-out pass
    pub fn record_fanout(&self, delivered: u64, failed: u64) {
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.send_failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Take a consistent-enough snapshot of the counters
    pub fn snapshot(&self) -> BroadcastStats {
        BroadcastStats {
            frames_broadcast: self.frames_broadcast.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of broadcast activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    /// Frames produced and fanned out
    pub frames_broadcast: u64,
    /// Ticks skipped because frame production failed
    pub ticks_skipped: u64,
    /// Envelopes successfully queued to sessions
    pub deliveries: u64,
    /// Envelopes dropped because a session was gone
    pub send_failures: u64,
}
