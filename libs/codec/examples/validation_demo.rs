//! # Codec Validation Demo
//!
//! Walks a handful of wire messages through the same checks the router runs:
//! single-message framing, structural/security rules, then schema validation.
//!
//! ```text
//! cargo run -p codec --example validation_demo
//! ```

use codec::{new_order_single, MessageValidator, ProtocolResult, Side, WireMessage};
use router_config::FixSchema;

fn check(validator: &MessageValidator, schema: &FixSchema, raw: &str) -> ProtocolResult<WireMessage> {
    validator.validate_single_message(raw)?;
    validator.validate(raw)?;
    WireMessage::from_raw(raw, schema)
}

fn main() -> anyhow::Result<()> {
    println!("🔍 Codec Validation Demo");
    println!("========================\n");

    let schema = FixSchema::builtin()?;
    let validator = MessageValidator::for_schema(&schema);
    println!(
        "Schema: {} {} ({} tags, {} message types, delimiter '{}')\n",
        schema.protocol(),
        schema.version(),
        schema.tag_count(),
        schema.message_type_count(),
        schema.delimiter()
    );

    let mut message = new_order_single("100001", "200001", "AAPL", Side::Buy, 100, Some("187.25"));
    let order = message.serialize();
    message.set_field("10", "999");
    let corrupted = message.serialize();

    let samples = [
        ("well-formed order", order.clone()),
        ("wrong checksum", corrupted),
        ("two messages", format!("{}{}", order, order)),
        ("trailing data", format!("{}58=x|", order)),
        ("no checksum", "49=100001|56=200001|35=D|".to_string()),
        ("script injection", "49=100001|58=<script>|10=000|".to_string()),
        ("unknown type", "49=100001|35=Z|10=057|".to_string()),
    ];

    for (label, raw) in &samples {
        print!("  {:<18} ", label);
        match check(&validator, &schema, raw) {
            Ok(message) => println!(
                "✅ accepted: type={} sender={} target={}",
                message.msg_type().unwrap_or("-"),
                message.sender_comp_id().unwrap_or("-"),
                message.target_comp_id().unwrap_or("-")
            ),
            Err(e) => println!("❌ {}", e),
        }
    }

    println!("\nQuick pre-filter on \"hello\": {}", validator.is_valid_quick("hello"));
    Ok(())
}
