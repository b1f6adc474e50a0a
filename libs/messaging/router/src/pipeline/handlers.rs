//! # Handler Chain
//!
//! Every inbound message runs through an ordered list of handlers sharing one
//! [`MessageContext`]. A handler returns [`ControlFlow::Break`] to stop the
//! chain; it is responsible for reporting the failure to the source first.
//!
//! ```text
//! ValidationHandler → RoutingHandler → ForwardingHandler
//!   framing, syntax      sender check      wrap with provenance
//!   checksum, schema     target lookup     queue on target
//! ```
//!
//! The chain is open: additional handlers (rate limiting, auditing) can be
//! inserted with [`HandlerChain::with_handler`].

use std::ops::ControlFlow;
use std::sync::Arc;

use codec::{MessageValidator, WireMessage};
use router_config::FixSchema;
use tracing::{debug, error, warn};

use super::context::MessageContext;
use super::severity::{report_error, ErrorSeverity};
use crate::routing::RoutingTable;
use crate::stats::RouterStats;

/// One stage of message processing
pub trait MessageHandler: Send + Sync {
    fn handle(&self, ctx: &mut MessageContext) -> ControlFlow<()>;

    fn name(&self) -> &'static str;
}

/// Ordered list of handlers
#[derive(Default)]
pub struct HandlerChain {
    handlers: Vec<Box<dyn MessageHandler>>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validation → Routing → Forwarding
    pub fn standard(
        schema: Arc<FixSchema>,
        routing: Arc<RoutingTable>,
        stats: Arc<RouterStats>,
        verify_sender: bool,
    ) -> Self {
        Self::new()
            .with_handler(ValidationHandler::new(schema, stats.clone()))
            .with_handler(RoutingHandler::new(routing, stats.clone(), verify_sender))
            .with_handler(ForwardingHandler::new(stats))
    }

    pub fn with_handler(mut self, handler: impl MessageHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Run every handler until one stops the chain. Returns whether the
    /// message made it through all of them.
    pub fn process(&self, ctx: &mut MessageContext) -> bool {
        for handler in &self.handlers {
            if handler.handle(ctx).is_break() {
                debug!(
                    handler = handler.name(),
                    id = %ctx.source().id(),
                    error = ctx.error().unwrap_or("unspecified"),
                    "Chain stopped"
                );
                return false;
            }
        }
        true
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Fail the context and apply the severity policy to its source
fn reject(ctx: &mut MessageContext, stats: &RouterStats, text: String, severity: ErrorSeverity) -> ControlFlow<()> {
    stats.message_rejected();
    report_error(ctx.source(), &text, severity);
    ctx.fail(text);
    ControlFlow::Break(())
}

/// Structural, framing and business validation
pub struct ValidationHandler {
    validator: MessageValidator,
    schema: Arc<FixSchema>,
    stats: Arc<RouterStats>,
}

impl ValidationHandler {
    pub fn new(schema: Arc<FixSchema>, stats: Arc<RouterStats>) -> Self {
        Self {
            validator: MessageValidator::for_schema(&schema),
            schema,
            stats,
        }
    }
}

impl MessageHandler for ValidationHandler {
    fn handle(&self, ctx: &mut MessageContext) -> ControlFlow<()> {
        let raw = ctx.raw();
        let result = self
            .validator
            .validate_single_message(raw)
            .and_then(|()| self.validator.validate(raw))
            .and_then(|()| WireMessage::from_raw(raw, &self.schema));

        match result {
            Ok(message) => {
                for (tag, value) in message.invalid_values(&self.schema) {
                    warn!(
                        id = %ctx.source().id(),
                        tag,
                        value,
                        "Value not listed in schema for {}",
                        self.schema.tag_name(tag)
                    );
                }
                ctx.source().reset_error_count();
                ctx.set_message(message);
                ControlFlow::Continue(())
            }
            Err(e) => reject(ctx, &self.stats, e.to_string(), ErrorSeverity::Recoverable),
        }
    }

    fn name(&self) -> &'static str {
        "validation"
    }
}

/// Resolves the destination connection from TargetCompID
pub struct RoutingHandler {
    routing: Arc<RoutingTable>,
    stats: Arc<RouterStats>,
    verify_sender: bool,
}

impl RoutingHandler {
    pub fn new(routing: Arc<RoutingTable>, stats: Arc<RouterStats>, verify_sender: bool) -> Self {
        Self {
            routing,
            stats,
            verify_sender,
        }
    }
}

impl MessageHandler for RoutingHandler {
    fn handle(&self, ctx: &mut MessageContext) -> ControlFlow<()> {
        let Some(message) = ctx.message() else {
            error!(id = %ctx.source().id(), "Routing reached without a validated message");
            return reject(ctx, &self.stats, "Internal error: message not validated".into(), ErrorSeverity::Routing);
        };
        let sender = message.sender_comp_id().map(str::to_owned);
        let target = message.target_comp_id().map(str::to_owned);
        let source_id = ctx.source().id().clone();

        if self.verify_sender && sender.as_deref() != Some(source_id.as_str()) {
            let text = format!(
                "SenderCompID ({}) does not match connection ID ({})",
                sender.as_deref().unwrap_or("missing"),
                source_id
            );
            return reject(ctx, &self.stats, text, ErrorSeverity::Security);
        }

        let target = match target {
            Some(target) if !target.is_empty() => target,
            _ => {
                return reject(ctx, &self.stats, "Missing TargetCompID (tag 56)".into(), ErrorSeverity::Routing);
            }
        };

        if target == source_id.as_str() {
            return reject(ctx, &self.stats, "Cannot send message to self".into(), ErrorSeverity::Routing);
        }

        match self.routing.find_route(&target) {
            Some(connection) => {
                ctx.set_target(connection);
                ControlFlow::Continue(())
            }
            None => reject(
                ctx,
                &self.stats,
                format!("Destination not found: {}", target),
                ErrorSeverity::Routing,
            ),
        }
    }

    fn name(&self) -> &'static str {
        "routing"
    }
}

/// Wraps the raw text with provenance and queues it on the target
pub struct ForwardingHandler {
    stats: Arc<RouterStats>,
}

impl ForwardingHandler {
    pub fn new(stats: Arc<RouterStats>) -> Self {
        Self { stats }
    }
}

/// `[<source> → <destination>] <raw>`
pub fn provenance_wrap(source: &str, destination: &str, raw: &str) -> String {
    format!("[{} → {}] {}", source, destination, raw)
}

impl MessageHandler for ForwardingHandler {
    fn handle(&self, ctx: &mut MessageContext) -> ControlFlow<()> {
        let Some(target) = ctx.target().cloned() else {
            error!(id = %ctx.source().id(), "Forwarding reached without a target");
            return reject(ctx, &self.stats, "Internal error: no destination resolved".into(), ErrorSeverity::Routing);
        };

        let forwarded = provenance_wrap(ctx.source().id().as_str(), target.id().as_str(), ctx.raw());
        match target.queue_message(&forwarded) {
            Ok(()) => {
                target.request_write();
                self.stats.message_forwarded();
                debug!(from = %ctx.source().id(), to = %target.id(), bytes = forwarded.len(), "Forwarded");
                ControlFlow::Continue(())
            }
            Err(e) => {
                warn!(from = %ctx.source().id(), to = %target.id(), error = %e, "Forward refused");
                let text = format!("Destination {} is not accepting messages", target.id());
                reject(ctx, &self.stats, text, ErrorSeverity::Routing)
            }
        }
    }

    fn name(&self) -> &'static str {
        "forwarding"
    }
}
