//! FIX schema: tag definitions and message-type requirements
//!
//! The schema is loaded once, validated, and then shared read-only by every
//! component that needs it. A default schema ships embedded in the crate.
//!
//! ```toml
//! protocol = "FIX"
//! version = "4.4"
//! delimiter = "|"
//!
//! [[tags]]
//! tag = "54"
//! name = "Side"
//! type = "Char"
//!
//! [tags.valid_values]
//! "1" = "Buy"
//! "2" = "Sell"
//!
//! [message_types.D]
//! name = "NewOrderSingle"
//! required_tags = ["35", "49", "55", "54", "38"]
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use crate::protocol::{DEFAULT_DELIMITER, TAG_VALUE_SEPARATOR};

const BUILTIN_SCHEMA: &str = include_str!("../schemas/fix_schema.toml");

/// Definition of a single tag
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagDefinition {
    pub tag: String,
    pub name: String,
    #[serde(rename = "type", default = "default_tag_type")]
    pub tag_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    /// Enumerated values; empty means any value is accepted
    #[serde(default)]
    pub valid_values: BTreeMap<String, String>,
}

fn default_tag_type() -> String {
    "String".to_string()
}

impl TagDefinition {
    pub fn has_valid_values(&self) -> bool {
        !self.valid_values.is_empty()
    }

    pub fn is_valid_value(&self, value: &str) -> bool {
        !self.has_valid_values() || self.valid_values.contains_key(value)
    }
}

/// Tags a message type must and may carry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MessageTypeDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required_tags: Vec<String>,
    #[serde(default)]
    pub optional_tags: Vec<String>,
}

impl MessageTypeDefinition {
    pub fn requires(&self, tag: &str) -> bool {
        self.required_tags.iter().any(|t| t == tag)
    }
}

/// On-disk layout of a schema file
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default = "default_protocol")]
    protocol: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_delimiter")]
    delimiter: String,
    #[serde(default)]
    tags: Vec<TagDefinition>,
    #[serde(default)]
    message_types: BTreeMap<String, MessageTypeDefinition>,
}

fn default_protocol() -> String {
    "FIX".to_string()
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// Read-only view of the protocol schema
#[derive(Debug, Clone)]
pub struct FixSchema {
    protocol: String,
    version: String,
    description: String,
    delimiter: char,
    tags: HashMap<String, TagDefinition>,
    tag_names: HashMap<String, String>,
    message_types: HashMap<String, MessageTypeDefinition>,
}

impl FixSchema {
    /// Load and validate a schema file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        let schema = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid schema file {}", path.display()))?;
        info!(
            path = %path.display(),
            tags = schema.tags.len(),
            message_types = schema.message_types.len(),
            "Loaded {} {} schema",
            schema.protocol,
            schema.version
        );
        Ok(schema)
    }

    /// Parse and validate a schema from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let document: SchemaDocument =
            toml::from_str(content).context("Failed to parse schema TOML")?;
        Self::from_document(document)
    }

    /// The schema embedded in this crate
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_SCHEMA).context("Embedded schema is invalid")
    }

    fn from_document(document: SchemaDocument) -> Result<Self> {
        let delimiter = single_char(&document.delimiter)?;

        let mut tags = HashMap::with_capacity(document.tags.len());
        let mut tag_names = HashMap::with_capacity(document.tags.len());
        for definition in document.tags {
            if definition.tag.is_empty() || !definition.tag.bytes().all(|b| b.is_ascii_digit()) {
                bail!("Tag '{}' ({}) is not numeric", definition.tag, definition.name);
            }
            if tag_names.insert(definition.name.clone(), definition.tag.clone()).is_some() {
                bail!("Tag name '{}' is defined twice", definition.name);
            }
            if let Some(previous) = tags.insert(definition.tag.clone(), definition) {
                bail!("Tag {} is defined twice", previous.tag);
            }
        }

        let message_types: HashMap<_, _> = document.message_types.into_iter().collect();
        for (code, message_type) in &message_types {
            let referenced = message_type.required_tags.iter().chain(&message_type.optional_tags);
            for tag in referenced {
                if !tags.contains_key(tag) {
                    bail!("Message type {} ({}) references unknown tag {}", code, message_type.name, tag);
                }
            }
            let unique: HashSet<_> = message_type.required_tags.iter().collect();
            if unique.len() != message_type.required_tags.len() {
                bail!("Message type {} lists a required tag twice", code);
            }
            debug!(code = %code, name = %message_type.name, "Registered message type");
        }

        Ok(Self {
            protocol: document.protocol,
            version: document.version,
            description: document.description,
            delimiter,
            tags,
            tag_names,
            message_types,
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Field delimiter on the wire
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn tag(&self, tag: &str) -> Option<&TagDefinition> {
        self.tags.get(tag)
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&TagDefinition> {
        self.tag_names.get(name).and_then(|tag| self.tags.get(tag))
    }

    /// Human name of a tag, falling back to the tag number itself
    pub fn tag_name<'a>(&'a self, tag: &'a str) -> &'a str {
        self.tags.get(tag).map(|d| d.name.as_str()).unwrap_or(tag)
    }

    pub fn is_required_tag(&self, tag: &str) -> bool {
        self.tags.get(tag).is_some_and(|d| d.required)
    }

    /// Whether `value` is allowed for `tag`. Tags without enumerated values,
    /// and tags the schema does not know, accept anything.
    pub fn is_valid_value(&self, tag: &str, value: &str) -> bool {
        self.tags.get(tag).map_or(true, |d| d.is_valid_value(value))
    }

    pub fn message_type(&self, code: &str) -> Option<&MessageTypeDefinition> {
        self.message_types.get(code)
    }

    pub fn is_known_message_type(&self, code: &str) -> bool {
        self.message_types.contains_key(code)
    }

    pub fn required_tags(&self, code: &str) -> &[String] {
        self.message_types
            .get(code)
            .map(|m| m.required_tags.as_slice())
            .unwrap_or(&[])
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn message_type_count(&self) -> usize {
        self.message_types.len()
    }
}

fn single_char(delimiter: &str) -> Result<char> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c == TAG_VALUE_SEPARATOR => {
            bail!("Delimiter cannot be '{}'", TAG_VALUE_SEPARATOR)
        }
        (Some(c), None) if c.is_ascii_alphanumeric() || c == '\n' || c == '\r' => {
            bail!("Delimiter {:?} would collide with message content", c)
        }
        (Some(c), None) => Ok(c),
        _ => bail!("Delimiter must be exactly one character, got {:?}", delimiter),
    }
}
