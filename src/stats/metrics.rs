//! Statistics and metrics for the signaling relay

use std::sync::atomic::{AtomicU64, Ordering};

/// Relay-wide counters
///
/// Shared across every connection task, so all counters are atomics.
/// Use [`RelayStats::snapshot`] for a consistent-enough view to log or
/// export.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Connections accepted over the process lifetime
    total_connections: AtomicU64,
    /// Connections currently open
    active_connections: AtomicU64,
    /// Frames handed to a unicast target
    unicasts: AtomicU64,
    /// Unicast frames whose target had already departed
    unicast_misses: AtomicU64,
    /// Broadcast fan-outs performed
    broadcasts: AtomicU64,
    /// Individual deliveries queued to peers
    deliveries: AtomicU64,
    /// Deliveries dropped (full queue or departed writer)
    dropped_deliveries: AtomicU64,
    /// Inbound frames dropped as unparseable
    malformed_frames: AtomicU64,
    /// Synthesized leave notices broadcast on disconnect
    leave_notices: AtomicU64,
}

impl RelayStats {
    /// Create a zeroed stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_connected(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disconnected(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unicast(&self) {
        self.unicasts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unicast_miss(&self) {
        self.unicast_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_broadcast(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivery(&self, accepted: bool) {
        if accepted {
            self.deliveries.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dropped_deliveries.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_leave_notice(&self) {
        self.leave_notices.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            unicasts: self.unicasts.load(Ordering::Relaxed),
            unicast_misses: self.unicast_misses.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped_deliveries: self.dropped_deliveries.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            leave_notices: self.leave_notices.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the relay counters at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    /// Connections accepted over the process lifetime
    pub total_connections: u64,
    /// Connections currently open
    pub active_connections: u64,
    /// Frames handed to a unicast target
    pub unicasts: u64,
    /// Unicast frames whose target had already departed
    pub unicast_misses: u64,
    /// Broadcast fan-outs performed
    pub broadcasts: u64,
    /// Individual deliveries queued to peers
    pub deliveries: u64,
    /// Deliveries dropped (full queue or departed writer)
    pub dropped_deliveries: u64,
    /// Inbound frames dropped as unparseable
    pub malformed_frames: u64,
    /// Synthesized leave notices broadcast on disconnect
    pub leave_notices: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_starts_zeroed() {
        let stats = RelayStats::new();
        assert_eq!(stats.snapshot(), RelayStatsSnapshot::default());
    }

    #[test]
    fn test_connection_counters() {
        let stats = RelayStats::new();

        stats.record_connected();
        stats.record_connected();
        stats.record_disconnected();

        let snap = stats.snapshot();
        assert_eq!(snap.total_connections, 2);
        assert_eq!(snap.active_connections, 1);
    }

    #[test]
    fn test_delivery_counters() {
        let stats = RelayStats::new();

        stats.record_broadcast();
        stats.record_delivery(true);
        stats.record_delivery(true);
        stats.record_delivery(false);
        stats.record_unicast();
        stats.record_unicast_miss();
        stats.record_malformed();
        stats.record_leave_notice();

        let snap = stats.snapshot();
        assert_eq!(snap.broadcasts, 1);
        assert_eq!(snap.deliveries, 2);
        assert_eq!(snap.dropped_deliveries, 1);
        assert_eq!(snap.unicasts, 1);
        assert_eq!(snap.unicast_misses, 1);
        assert_eq!(snap.malformed_frames, 1);
        assert_eq!(snap.leave_notices, 1);
    }
}
