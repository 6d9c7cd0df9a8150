//! Statistics for hub and broadcast activity

pub mod metrics;

pub use metrics::{BroadcastCounters, BroadcastStats, HubStats};
