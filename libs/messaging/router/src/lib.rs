//! # Router Core
//!
//! Accepts broker and market TCP connections, assigns each a session
//! identifier, and forwards delimiter-separated tag=value messages from one
//! peer to the peer named in tag 56.
//!
//! ## Architecture
//!
//! ```text
//!  brokers :5000 ─┐                         ┌─▶ ValidationHandler
//!                 ├─▶ reactor (1 thread) ───┤   RoutingHandler
//!  markets :5001 ─┘   accept / read / write │   ForwardingHandler
//!                         ▲                 └─ msg-processor-0..N
//!                         │                          │
//!                         └──── write queue ◀────────┘
//! ```
//!
//! - [`server`]: listeners, per-connection read/write loop, lifecycle
//! - [`connection`]: connection state, framing and the live registry
//! - [`pipeline`]: worker pool and the handler chain
//! - [`routing`]: identifier to connection lookup
//! - [`ids`]: prefixed identifier allocation

pub mod connection;
pub mod ids;
pub mod pipeline;
pub mod routing;
pub mod server;
pub mod shutdown;
pub mod stats;
pub mod types;

pub use connection::manager::ConnectionManager;
pub use connection::{Connection, ConnectionLimits};
pub use ids::IdAllocator;
pub use pipeline::{ErrorSeverity, HandlerChain, MessageContext, MessageHandler, MessageProcessor};
pub use routing::RoutingTable;
pub use server::{Router, RouterHandle};
pub use shutdown::{ShutdownListener, ShutdownSignal};
pub use stats::{RouterStats, RouterStatsSnapshot};
pub use types::{PeerId, PeerType};

use thiserror::Error;

/// Router runtime errors
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Identifier space exhausted for {peer_type} connections (ceiling {ceiling})")]
    IdSpaceExhausted { peer_type: PeerType, ceiling: u32 },

    #[error("Write queue full for {id}: {queued} bytes queued, limit {limit}")]
    WriteQueueFull {
        id: PeerId,
        queued: usize,
        limit: usize,
    },

    #[error("Processing queue full")]
    Overloaded,

    #[error("Router is shutting down")]
    ShuttingDown,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RouterResult<T> = std::result::Result<T, RouterError>;
