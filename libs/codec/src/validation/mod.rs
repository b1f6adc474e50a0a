//! # Wire Message Validation
//!
//! ## Architecture
//!
//! ```text
//! Raw text → single-message check → structural check → WireMessage::from_raw
//!              one checksum field     limits, syntax      checksum, msg type,
//!              nothing after it       injection chars     required tags
//! ```
//!
//! The first two layers are schema independent; the third lives on
//! [`crate::WireMessage`].

pub mod bounds;
pub mod checksum;
pub mod validator;

pub use bounds::{contains_dangerous_chars, ValidationLimits};
pub use validator::MessageValidator;
