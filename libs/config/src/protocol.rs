//! Wire protocol constants
//!
//! Limits enforced by the structural validator and the identifier layout used
//! when peers connect. These are protocol facts, not tunables.

/// Field delimiter used when a schema does not override it
pub const DEFAULT_DELIMITER: char = '|';

/// Separator between a tag and its value
pub const TAG_VALUE_SEPARATOR: char = '=';

/// Structural limits applied to every inbound message
pub mod limits {
    /// Maximum length of one wire message in bytes
    pub const MAX_MESSAGE_LENGTH: usize = 4096;

    /// Maximum length of a single field value in bytes
    pub const MAX_TAG_VALUE_LENGTH: usize = 512;

    /// Maximum number of tag=value segments per message
    pub const MAX_TAGS: usize = 50;

    /// Characters rejected inside field values
    pub const DANGEROUS_CHARS: [char; 6] = ['<', '>', '\'', '"', ';', '\\'];
}

/// Peer identifier layout
pub mod ids {
    /// Prefix for identifiers handed to brokers
    pub const BROKER_PREFIX: &str = "1";

    /// Prefix for identifiers handed to markets
    pub const MARKET_PREFIX: &str = "2";

    /// Width of the zero-padded counter after the prefix
    pub const COUNTER_WIDTH: usize = 5;

    /// Highest counter value a peer type may reach
    pub const MAX_ID_CEILING: u32 = 99_999;
}
