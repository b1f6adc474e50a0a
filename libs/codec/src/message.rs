//! # Wire Message Model
//!
//! Ordered `tag=value` fields. Insertion order is preserved because it
//! determines both the serialized form and the checksum.
//!
//! Parsing is permissive: segments without `=` are skipped, and a repeated
//! tag keeps its first position while taking the later value. Structural
//! validation upstream rejects those inputs before they reach this point on
//! the router's path.

use std::fmt;

use router_config::{FixSchema, DEFAULT_DELIMITER, TAG_VALUE_SEPARATOR};

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol_constants::tags;
use crate::validation::checksum;

/// One wire message: ordered fields plus the delimiter they are written with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    fields: Vec<(String, String)>,
    delimiter: char,
}

impl Default for WireMessage {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl WireMessage {
    pub fn new(delimiter: char) -> Self {
        Self {
            fields: Vec::new(),
            delimiter,
        }
    }

    /// Split on the delimiter, then each non-empty segment at the first `=`
    pub fn parse(raw: &str, delimiter: char) -> Self {
        let mut message = Self::new(delimiter);
        for segment in raw.split(delimiter) {
            if let Some((tag, value)) = segment.split_once(TAG_VALUE_SEPARATOR) {
                message.set_field(tag, value);
            }
        }
        message
    }

    /// Parse and apply business validation against the schema: checksum,
    /// message type, and the type's required tags
    pub fn from_raw(raw: &str, schema: &FixSchema) -> ProtocolResult<Self> {
        let message = Self::parse(raw, schema.delimiter());
        message.validate(schema)?;
        Ok(message)
    }

    pub fn validate(&self, schema: &FixSchema) -> ProtocolResult<()> {
        let transmitted = self
            .get_field(tags::CHECKSUM)
            .ok_or(ProtocolError::ChecksumFieldAbsent)?;
        let calculated = self.calculate_checksum();
        if transmitted != calculated {
            return Err(ProtocolError::checksum_mismatch(transmitted, calculated));
        }

        let msg_type = self
            .get_field(tags::MSG_TYPE)
            .ok_or(ProtocolError::MissingMessageType)?;
        let definition = schema
            .message_type(msg_type)
            .ok_or_else(|| ProtocolError::UnknownMessageType {
                msg_type: msg_type.to_string(),
            })?;

        if let Some(missing) = definition
            .required_tags
            .iter()
            .find(|tag| !self.has_field(tag))
        {
            return Err(ProtocolError::MissingRequiredTag {
                tag: missing.clone(),
                name: schema.tag_name(missing).to_string(),
                msg_type: msg_type.to_string(),
            });
        }

        Ok(())
    }

    /// Fields whose value is outside the schema's enumerated set
    pub fn invalid_values<'a>(&'a self, schema: &FixSchema) -> Vec<(&'a str, &'a str)> {
        self.fields()
            .filter(|(tag, value)| !schema.is_valid_value(tag, value))
            .collect()
    }

    /// Set a field, replacing the value in place if the tag exists
    pub fn set_field(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        let tag = tag.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((tag, value)),
        }
    }

    pub fn get_field(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_field(&self, tag: &str) -> bool {
        self.fields.iter().any(|(t, _)| t == tag)
    }

    pub fn remove_field(&mut self, tag: &str) -> Option<String> {
        let index = self.fields.iter().position(|(t, _)| t == tag)?;
        Some(self.fields.remove(index).1)
    }

    /// Fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn msg_type(&self) -> Option<&str> {
        self.get_field(tags::MSG_TYPE)
    }

    pub fn sender_comp_id(&self) -> Option<&str> {
        self.get_field(tags::SENDER_COMP_ID)
    }

    pub fn target_comp_id(&self) -> Option<&str> {
        self.get_field(tags::TARGET_COMP_ID)
    }

    pub fn calculate_checksum(&self) -> String {
        checksum::format(checksum::calculate(self.fields(), self.delimiter))
    }

    pub fn has_valid_checksum(&self) -> bool {
        self.get_field(tags::CHECKSUM)
            .is_some_and(|transmitted| checksum::verify(self.fields(), self.delimiter, transmitted))
    }

    /// Recompute tag 10 and move it to the end
    pub fn update_checksum(&mut self) {
        self.remove_field(tags::CHECKSUM);
        let value = self.calculate_checksum();
        self.fields.push((tags::CHECKSUM.to_string(), value));
    }

    /// Each field rendered as `tag=value` followed by the delimiter
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (tag, value) in &self.fields {
            write!(f, "{}={}{}", tag, value, self.delimiter)?;
        }
        Ok(())
    }
}
