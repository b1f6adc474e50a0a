//! Wire messages used across scenarios

use codec::{execution_report, new_order_single, OrdStatus, Side, WireMessageBuilder};

/// Checksummed order from `sender` to `target`
pub fn order(sender: &str, target: &str, quantity: u64) -> String {
    new_order_single(sender, target, "AAPL", Side::Buy, quantity, None).serialize()
}

/// Fill report from a market back to a broker
pub fn fill(sender: &str, target: &str) -> String {
    execution_report(sender, target, OrdStatus::Filled, "AAPL", None).serialize()
}

/// Valid order with tag 56 left out
pub fn order_without_target(sender: &str) -> String {
    WireMessageBuilder::default()
        .sender(sender)
        .msg_type("D")
        .field("55", "AAPL")
        .field("54", "1")
        .field("38", "100")
        .build()
        .serialize()
}

/// Order whose checksum field is replaced with `checksum`
pub fn order_with_checksum(sender: &str, target: &str, checksum: &str) -> String {
    let mut message = new_order_single(sender, target, "AAPL", Side::Buy, 100, None);
    message.set_field("10", checksum);
    message.serialize()
}

/// Framed line with no checksum field
pub fn malformed(sender: &str) -> String {
    format!("49={}|35=D|55=AAPL|", sender)
}

/// What the target sees for a forwarded message
pub fn forwarded(source: &str, target: &str, raw: &str) -> String {
    format!("[{} → {}] {}", source, target, raw)
}
