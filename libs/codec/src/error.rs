//! Protocol-level errors for FIX message processing
//!
//! Every variant renders to the exact text a peer receives inside an
//! `ERROR|...|` notice, so the wording is part of the wire contract.

use thiserror::Error;

/// Why a wire message was rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Message is empty")]
    Empty,

    #[error("Message too long: {len} bytes (max: {max})")]
    TooLong { len: usize, max: usize },

    #[error("Invalid format: missing '='")]
    MissingEquals,

    #[error("Invalid format: missing delimiter '{delimiter}'")]
    MissingDelimiter { delimiter: char },

    #[error("Invalid format: double delimiter '{delimiter}{delimiter}'")]
    DoubleDelimiter { delimiter: char },

    #[error("Invalid format: message must end with '{delimiter}'")]
    MissingTrailingDelimiter { delimiter: char },

    #[error("Too many tags: {count} (max: {max})")]
    TooManyTags { count: usize, max: usize },

    #[error("Invalid tag format: '{segment}' (expected exactly one '=' per tag)")]
    MalformedField { segment: String },

    #[error("Empty tag found")]
    EmptyTag,

    #[error("Non-numeric tag: '{tag}' (tags must be numbers)")]
    NonNumericTag { tag: String },

    #[error("Empty value for tag {tag}")]
    EmptyValue { tag: String },

    #[error("Value too long for tag {tag}: {len} bytes (max: {max})")]
    ValueTooLong { tag: String, len: usize, max: usize },

    #[error("Duplicate tag: {tag}")]
    DuplicateTag { tag: String },

    #[error("Invalid characters in tag {tag} value")]
    DangerousCharacters { tag: String },

    /// Single-message framing: no checksum field at all
    #[error("Incomplete message: missing checksum (tag 10)")]
    MissingChecksum,

    /// Single-message framing: several checksum fields in one unit
    #[error("Multiple messages detected ({count} messages in buffer). Send one message at a time.")]
    MultipleMessages { count: usize },

    /// Single-message framing: bytes after the checksum field
    #[error("Data after checksum: '{data}'. Message must end with checksum.")]
    TrailingData { data: String },

    #[error("Invalid message checksum: received {received}, calculated {calculated}")]
    ChecksumMismatch { received: String, calculated: String },

    #[error("Invalid message checksum: tag 10 not present")]
    ChecksumFieldAbsent,

    #[error("Message type (tag 35) is required")]
    MissingMessageType,

    #[error("Unknown message type: {msg_type}")]
    UnknownMessageType { msg_type: String },

    #[error("Missing {name} (tag {tag}) required for message type {msg_type}")]
    MissingRequiredTag {
        tag: String,
        name: String,
        msg_type: String,
    },
}

impl ProtocolError {
    pub fn too_long(len: usize, max: usize) -> Self {
        Self::TooLong { len, max }
    }

    pub fn checksum_mismatch(received: impl Into<String>, calculated: impl Into<String>) -> Self {
        Self::ChecksumMismatch {
            received: received.into(),
            calculated: calculated.into(),
        }
    }

    /// Framing errors mean the unit handed to validation was not exactly one
    /// message; everything else is about message content
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            Self::MissingChecksum | Self::MultipleMessages { .. } | Self::TrailingData { .. }
        )
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;
