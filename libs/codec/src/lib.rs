//! # FIX Wire Codec
//!
//! ## Purpose
//!
//! The "rules" layer of the router: everything about what a wire message
//! looks like, independent of sockets and threads.
//! - Ordered `tag=value` message model with parse/serialize
//! - Mod-256 checksum
//! - Structural/security validation of raw text
//! - Schema-driven business validation
//! - Builders for the order and execution-report messages peers exchange
//!
//! ## Architecture Role
//!
//! ```text
//! router-config → [codec] → router-core
//!      ↑             ↓            ↓
//!  FixSchema    Validation     Reactor,
//!  Limits       WireMessage    Pipeline
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Socket handling or framing of byte streams (belongs in router-core)
//! - Routing decisions or error-severity policy

pub mod builder;
pub mod error;
pub mod message;
pub mod protocol_constants;
pub mod validation;

// Re-export key types for convenience
pub use builder::{execution_report, new_order_single, WireMessageBuilder};
pub use error::{ProtocolError, ProtocolResult};
pub use message::WireMessage;
pub use protocol_constants::{msg_types, tags, OrdStatus, Side};
pub use validation::{checksum, MessageValidator, ValidationLimits};
