//! # FIX Router Configuration
//!
//! Everything the router reads once at startup and never mutates afterwards.
//!
//! ## Features
//!
//! - **Protocol Constants**: delimiter, message limits, identifier layout
//! - **Service Defaults**: ports, poll timeout, worker pool sizing
//! - **FIX Schema**: tag definitions and per-message-type requirements
//! - **Router Configuration**: layered TOML + environment loading
//!
//! ## Usage
//!
//! ```rust,no_run
//! use router_config::{FixSchema, RouterConfig};
//!
//! let config = RouterConfig::load(None)?;
//! let schema = match &config.schema.path {
//!     Some(path) => FixSchema::from_file(path)?,
//!     None => FixSchema::builtin()?,
//! };
//! assert_eq!(schema.delimiter(), '|');
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod protocol;
pub mod router_config;
pub mod schema;
pub mod service;

// Re-export commonly used types
pub use protocol::*;
pub use router_config::{LimitSettings, PipelineSettings, RouterConfig, SchemaSettings, ServerSettings};
pub use schema::{FixSchema, MessageTypeDefinition, TagDefinition};
