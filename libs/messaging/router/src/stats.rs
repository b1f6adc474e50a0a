//! Router counters
//!
//! Plain atomics updated from the reactor and the workers; a snapshot is
//! logged when the router stops.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct RouterStats {
    connections_accepted: AtomicU64,
    connections_closed: AtomicU64,
    messages_received: AtomicU64,
    messages_forwarded: AtomicU64,
    messages_rejected: AtomicU64,
    messages_dropped_busy: AtomicU64,
}

/// Point-in-time copy of [`RouterStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouterStatsSnapshot {
    pub connections_accepted: u64,
    pub connections_closed: u64,
    pub messages_received: u64,
    pub messages_forwarded: u64,
    pub messages_rejected: u64,
    pub messages_dropped_busy: u64,
}

impl RouterStats {
    pub fn connection_accepted(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_forwarded(&self) {
        self.messages_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_rejected(&self) {
        self.messages_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn message_dropped_busy(&self) {
        self.messages_dropped_busy.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RouterStatsSnapshot {
        RouterStatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_forwarded: self.messages_forwarded.load(Ordering::Relaxed),
            messages_rejected: self.messages_rejected.load(Ordering::Relaxed),
            messages_dropped_busy: self.messages_dropped_busy.load(Ordering::Relaxed),
        }
    }
}
