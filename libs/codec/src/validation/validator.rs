//! # Structural Message Validator
//!
//! Stateless checks on raw wire text, run before any parsing or schema
//! lookup. Two layers, both must pass:
//!
//! 1. [`MessageValidator::validate_single_message`]: the unit holds exactly
//!    one checksum field and nothing after it.
//! 2. [`MessageValidator::validate`]: size limits, field syntax, duplicate
//!    tags and injection characters.

use std::collections::HashSet;

use router_config::{FixSchema, DEFAULT_DELIMITER, TAG_VALUE_SEPARATOR};

use super::bounds::{contains_dangerous_chars, ValidationLimits};
use super::checksum::is_checksum_field;
use crate::error::{ProtocolError, ProtocolResult};

/// Structural and security validator for raw wire text
#[derive(Debug, Clone)]
pub struct MessageValidator {
    delimiter: char,
    limits: ValidationLimits,
}

impl Default for MessageValidator {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl MessageValidator {
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            limits: ValidationLimits::default(),
        }
    }

    /// Validator using the schema's delimiter
    pub fn for_schema(schema: &FixSchema) -> Self {
        Self::new(schema.delimiter())
    }

    pub fn with_limits(mut self, limits: ValidationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    /// Full structural and security validation
    pub fn validate(&self, raw: &str) -> ProtocolResult<()> {
        let d = self.delimiter;

        if raw.is_empty() {
            return Err(ProtocolError::Empty);
        }
        self.limits.check_message_length(raw)?;

        if !raw.contains(TAG_VALUE_SEPARATOR) {
            return Err(ProtocolError::MissingEquals);
        }
        if !raw.contains(d) {
            return Err(ProtocolError::MissingDelimiter { delimiter: d });
        }
        if raw.contains(&*format!("{d}{d}")) {
            return Err(ProtocolError::DoubleDelimiter { delimiter: d });
        }
        if !raw.ends_with(d) {
            return Err(ProtocolError::MissingTrailingDelimiter { delimiter: d });
        }

        // Trailing delimiter is guaranteed above, so the last split piece is empty
        let segments: Vec<&str> = raw[..raw.len() - d.len_utf8()]
            .split(d)
            .filter(|s| !s.is_empty())
            .collect();
        self.limits.check_tag_count(segments.len())?;

        let mut seen = HashSet::with_capacity(segments.len());
        for segment in segments {
            let (tag, value) = match segment.split_once(TAG_VALUE_SEPARATOR) {
                Some((tag, value)) if !value.contains(TAG_VALUE_SEPARATOR) => (tag, value),
                _ => {
                    return Err(ProtocolError::MalformedField {
                        segment: segment.to_string(),
                    })
                }
            };

            if tag.is_empty() {
                return Err(ProtocolError::EmptyTag);
            }
            if !tag.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ProtocolError::NonNumericTag { tag: tag.to_string() });
            }
            if value.is_empty() {
                return Err(ProtocolError::EmptyValue { tag: tag.to_string() });
            }
            self.limits.check_value_length(tag, value)?;
            if !seen.insert(tag) {
                return Err(ProtocolError::DuplicateTag { tag: tag.to_string() });
            }
            if contains_dangerous_chars(value) {
                return Err(ProtocolError::DangerousCharacters { tag: tag.to_string() });
            }
        }

        Ok(())
    }

    /// Exactly one checksum field, and nothing but whitespace after it
    pub fn validate_single_message(&self, raw: &str) -> ProtocolResult<()> {
        let mut count = 0usize;
        let mut end_of_last = 0usize;
        let mut offset = 0usize;

        for piece in raw.split_inclusive(self.delimiter) {
            offset += piece.len();
            if let Some(body) = piece.strip_suffix(self.delimiter) {
                if is_checksum_field(body) {
                    count += 1;
                    end_of_last = offset;
                }
            }
        }

        match count {
            0 => Err(ProtocolError::MissingChecksum),
            1 => {
                let rest = raw[end_of_last..].trim();
                if rest.is_empty() {
                    Ok(())
                } else {
                    Err(ProtocolError::TrailingData { data: rest.to_string() })
                }
            }
            count => Err(ProtocolError::MultipleMessages { count }),
        }
    }

    /// Cheap pre-filter: non-empty, within length, has `=`, ends with the delimiter
    pub fn is_valid_quick(&self, raw: &str) -> bool {
        !raw.is_empty()
            && raw.len() <= self.limits.max_message_length
            && raw.contains(TAG_VALUE_SEPARATOR)
            && raw.ends_with(self.delimiter)
    }
}
