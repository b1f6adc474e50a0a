//! # Message Builder
//!
//! Constructs checksummed wire messages for peers and tests. Fields are
//! written in the order they are added; [`WireMessageBuilder::build`] appends
//! the checksum last.
//!
//! ```rust
//! use codec::{new_order_single, Side};
//!
//! let order = new_order_single("100001", "200001", "AAPL", Side::Buy, 100, None);
//! assert_eq!(
//!     order.serialize(),
//!     "49=100001|56=200001|35=D|55=AAPL|54=1|38=100|10=061|"
//! );
//! ```

use router_config::DEFAULT_DELIMITER;

use crate::message::WireMessage;
use crate::protocol_constants::{msg_types, tags, OrdStatus, Side};

/// Fluent builder over [`WireMessage`]
#[derive(Debug, Clone)]
pub struct WireMessageBuilder {
    message: WireMessage,
}

impl Default for WireMessageBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl WireMessageBuilder {
    pub fn new(delimiter: char) -> Self {
        Self {
            message: WireMessage::new(delimiter),
        }
    }

    pub fn field(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.message.set_field(tag, value);
        self
    }

    pub fn sender(self, sender_id: &str) -> Self {
        self.field(tags::SENDER_COMP_ID, sender_id)
    }

    pub fn target(self, target_id: &str) -> Self {
        self.field(tags::TARGET_COMP_ID, target_id)
    }

    pub fn msg_type(self, msg_type: &str) -> Self {
        self.field(tags::MSG_TYPE, msg_type)
    }

    /// Finish with a freshly computed checksum
    pub fn build(mut self) -> WireMessage {
        self.message.update_checksum();
        self.message
    }

    /// Finish without touching tag 10
    pub fn build_unchecked(self) -> WireMessage {
        self.message
    }
}

/// NewOrderSingle (35=D) from a broker to a market
pub fn new_order_single(
    sender_id: &str,
    target_id: &str,
    symbol: &str,
    side: Side,
    quantity: u64,
    price: Option<&str>,
) -> WireMessage {
    let builder = WireMessageBuilder::default()
        .sender(sender_id)
        .target(target_id)
        .msg_type(msg_types::NEW_ORDER_SINGLE)
        .field(tags::SYMBOL, symbol)
        .field(tags::SIDE, side.code())
        .field(tags::ORDER_QTY, quantity.to_string());

    match price {
        Some(price) => builder.field(tags::PRICE, price).build(),
        None => builder.build(),
    }
}

/// ExecutionReport (35=8) from a market back to a broker
pub fn execution_report(
    sender_id: &str,
    target_id: &str,
    status: OrdStatus,
    symbol: &str,
    text: Option<&str>,
) -> WireMessage {
    let builder = WireMessageBuilder::default()
        .sender(sender_id)
        .target(target_id)
        .msg_type(msg_types::EXECUTION_REPORT)
        .field(tags::ORD_STATUS, status.code())
        .field(tags::SYMBOL, symbol);

    match text {
        Some(text) => builder.field(tags::TEXT, text).build(),
        None => builder.build(),
    }
}
