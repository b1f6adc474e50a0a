//! Service defaults
//!
//! Default values used by [`crate::RouterConfig`] when a setting is absent
//! from both the configuration file and the environment.

/// Listener defaults
pub mod network {
    /// Address both listeners bind to
    pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

    /// Port brokers connect to
    pub const DEFAULT_BROKER_PORT: u16 = 5000;

    /// Port markets connect to
    pub const DEFAULT_MARKET_PORT: u16 = 5001;

    /// Upper bound on one reactor poll (milliseconds)
    pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1_000;

    /// Size of the per-read socket buffer
    pub const DEFAULT_READ_BUFFER_SIZE: usize = 8_192;

    /// Bytes a connection may buffer without a delimiter before the buffer
    /// is handed to validation as-is
    pub const DEFAULT_MAX_PENDING_BYTES: usize = 16_384;

    /// Time a connection marked for closure gets to flush (milliseconds)
    pub const DEFAULT_CLOSURE_GRACE_MS: u64 = 5_000;
}

/// Message pipeline defaults
pub mod pipeline {
    /// Worker threads running the handler chain
    pub const DEFAULT_WORKER_THREADS: usize = 4;

    /// Messages waiting for a worker before the router reports busy
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1_024;
}

/// Per-connection limits
pub mod limits {
    /// Consecutive invalid messages tolerated before disconnecting a peer
    pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 5;

    /// Bytes of undelivered output allowed per connection
    pub const DEFAULT_MAX_WRITE_QUEUE_BYTES: usize = 1024 * 1024; // 1MB
}
