//! Tag numbers and enumerated values used by the router
//!
//! Only the fields the router inspects, plus the ones the message builders
//! populate. Anything else is carried through untouched.

/// FIX tag numbers
pub mod tags {
    pub const BEGIN_STRING: &str = "8";
    pub const CHECKSUM: &str = "10";
    pub const MSG_TYPE: &str = "35";
    pub const ORDER_QTY: &str = "38";
    pub const ORD_STATUS: &str = "39";
    pub const PRICE: &str = "44";
    pub const SENDER_COMP_ID: &str = "49";
    pub const SIDE: &str = "54";
    pub const SYMBOL: &str = "55";
    pub const TARGET_COMP_ID: &str = "56";
    pub const TEXT: &str = "58";
}

/// Values of tag 35
pub mod msg_types {
    pub const NEW_ORDER_SINGLE: &str = "D";
    pub const EXECUTION_REPORT: &str = "8";
}

/// Order side (tag 54)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn code(self) -> &'static str {
        match self {
            Side::Buy => "1",
            Side::Sell => "2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Side::Buy),
            "2" => Some(Side::Sell),
            _ => None,
        }
    }
}

/// Order status (tag 39)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdStatus {
    New,
    Filled,
    Rejected,
}

impl OrdStatus {
    pub fn code(self) -> &'static str {
        match self {
            OrdStatus::New => "0",
            OrdStatus::Filled => "2",
            OrdStatus::Rejected => "8",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(OrdStatus::New),
            "2" => Some(OrdStatus::Filled),
            "8" => Some(OrdStatus::Rejected),
            _ => None,
        }
    }
}
