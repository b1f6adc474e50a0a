//! End-to-end tests for the FIX router
//!
//! Starts the router on loopback ephemeral ports and drives it with real
//! broker and market TCP clients.

pub mod fixtures;
pub mod framework;

pub use fixtures::*;
pub use framework::{init_tracing, TestClient, TestRouter, READ_TIMEOUT};
