//! Peer identity types

use std::borrow::Borrow;
use std::fmt;

use router_config::ids;
use serde::{Deserialize, Serialize};

/// The two kinds of peer, each with its own listener and id space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerType {
    Broker,
    Market,
}

impl PeerType {
    pub const ALL: [PeerType; 2] = [PeerType::Broker, PeerType::Market];

    /// Leading digit of every identifier handed to this peer type
    pub fn id_prefix(self) -> &'static str {
        match self {
            PeerType::Broker => ids::BROKER_PREFIX,
            PeerType::Market => ids::MARKET_PREFIX,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeerType::Broker => "broker",
            PeerType::Market => "market",
        }
    }
}

impl fmt::Display for PeerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier assigned to a connected peer, e.g. `100001`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PeerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PeerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PeerId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PeerId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
