//! Per-message state threaded through the handler chain

use std::sync::Arc;

use codec::WireMessage;

use crate::connection::Connection;

/// One inbound message on its way through the pipeline
#[derive(Debug)]
pub struct MessageContext {
    raw: String,
    source: Arc<Connection>,
    message: Option<WireMessage>,
    target: Option<Arc<Connection>>,
    error: Option<String>,
}

impl MessageContext {
    pub fn new(raw: impl Into<String>, source: Arc<Connection>) -> Self {
        Self {
            raw: raw.into(),
            source,
            message: None,
            target: None,
            error: None,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn source(&self) -> &Arc<Connection> {
        &self.source
    }

    /// Parsed message, present once validation succeeded
    pub fn message(&self) -> Option<&WireMessage> {
        self.message.as_ref()
    }

    pub fn set_message(&mut self, message: WireMessage) {
        self.message = Some(message);
    }

    pub fn target(&self) -> Option<&Arc<Connection>> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, target: Arc<Connection>) {
        self.target = Some(target);
    }

    /// Record why processing stopped; the first failure wins
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
