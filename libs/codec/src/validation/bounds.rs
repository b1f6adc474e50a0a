//! Size limits applied during structural validation
//!
//! Bounds memory and CPU spent on any one message before it is parsed.

use crate::error::{ProtocolError, ProtocolResult};
use router_config::limits;

/// Limits enforced by [`super::MessageValidator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_message_length: usize,
    pub max_value_length: usize,
    pub max_tags: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_message_length: limits::MAX_MESSAGE_LENGTH,
            max_value_length: limits::MAX_TAG_VALUE_LENGTH,
            max_tags: limits::MAX_TAGS,
        }
    }
}

impl ValidationLimits {
    pub fn check_message_length(&self, raw: &str) -> ProtocolResult<()> {
        if raw.len() > self.max_message_length {
            return Err(ProtocolError::too_long(raw.len(), self.max_message_length));
        }
        Ok(())
    }

    pub fn check_tag_count(&self, count: usize) -> ProtocolResult<()> {
        if count > self.max_tags {
            return Err(ProtocolError::TooManyTags {
                count,
                max: self.max_tags,
            });
        }
        Ok(())
    }

    pub fn check_value_length(&self, tag: &str, value: &str) -> ProtocolResult<()> {
        if value.len() > self.max_value_length {
            return Err(ProtocolError::ValueTooLong {
                tag: tag.to_string(),
                len: value.len(),
                max: self.max_value_length,
            });
        }
        Ok(())
    }
}

/// Whether a value contains a character from the disallowed set
pub fn contains_dangerous_chars(value: &str) -> bool {
    value.contains(limits::DANGEROUS_CHARS)
}
