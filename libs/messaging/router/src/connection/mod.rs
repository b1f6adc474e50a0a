//! # Peer Connections
//!
//! A [`Connection`] is the state of one peer shared between the reactor
//! thread and the pipeline workers:
//!
//! - the outbound write queue, filled by workers and drained by the reactor
//! - identification and closure flags
//! - the consecutive-error counter used by the error policy
//!
//! The socket itself and the read accumulator ([`framing::MessageFramer`])
//! stay on the reactor thread; workers never touch them.
//!
//! ## Closure
//!
//! Closing is two-phase: [`Connection::mark_for_closure`] stops reading, and
//! the reactor tears the socket down only once [`Connection::should_close`]
//! reports that every queued notice has been flushed.

pub mod framing;
pub mod manager;

use std::collections::VecDeque;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use bytes::{Buf, Bytes};
use parking_lot::Mutex;
use router_config::RouterConfig;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::types::{PeerId, PeerType};
use crate::{RouterError, RouterResult};

/// Per-connection limits taken from the router configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    pub max_consecutive_errors: u32,
    pub max_write_queue_bytes: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self::from(&RouterConfig::default())
    }
}

impl From<&RouterConfig> for ConnectionLimits {
    fn from(config: &RouterConfig) -> Self {
        Self {
            max_consecutive_errors: config.limits.max_consecutive_errors,
            max_write_queue_bytes: config.limits.max_write_queue_bytes,
        }
    }
}

/// Outcome of one [`Connection::write_to`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteProgress {
    /// Queue is empty; write interest can be withdrawn
    Drained,
    /// Socket buffer is full; the head unit waits for the next writable event
    Pending,
}

/// Error counter value after an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorTally {
    pub count: u32,
    pub limit: u32,
}

impl ErrorTally {
    pub fn limit_reached(&self) -> bool {
        self.count >= self.limit
    }
}

#[derive(Debug, Default)]
struct WriteQueue {
    units: VecDeque<Bytes>,
    queued_bytes: usize,
}

/// Shared state of one connected peer
#[derive(Debug)]
pub struct Connection {
    id: PeerId,
    peer_type: PeerType,
    peer_addr: SocketAddr,
    connected_at: Instant,
    limits: ConnectionLimits,

    write_queue: Mutex<WriteQueue>,
    write_interest: Notify,

    identified: AtomicBool,
    closing: AtomicBool,
    error_count: AtomicU32,

    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
}

impl Connection {
    pub fn new(id: PeerId, peer_type: PeerType, peer_addr: SocketAddr, limits: ConnectionLimits) -> Self {
        Self {
            id,
            peer_type,
            peer_addr,
            connected_at: Instant::now(),
            limits,
            write_queue: Mutex::new(WriteQueue::default()),
            write_interest: Notify::new(),
            identified: AtomicBool::new(false),
            closing: AtomicBool::new(false),
            error_count: AtomicU32::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn peer_type(&self) -> PeerType {
        self.peer_type
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    /// Queue one outbound unit, newline-terminated
    pub fn queue_message(&self, text: &str) -> RouterResult<()> {
        if text.is_empty() {
            warn!(id = %self.id, "Ignoring empty outbound message");
            return Ok(());
        }

        let unit = if text.ends_with('\n') {
            Bytes::copy_from_slice(text.as_bytes())
        } else {
            let mut owned = String::with_capacity(text.len() + 1);
            owned.push_str(text);
            owned.push('\n');
            Bytes::from(owned)
        };

        let mut queue = self.write_queue.lock();
        if queue.queued_bytes + unit.len() > self.limits.max_write_queue_bytes {
            return Err(RouterError::WriteQueueFull {
                id: self.id.clone(),
                queued: queue.queued_bytes,
                limit: self.limits.max_write_queue_bytes,
            });
        }
        queue.queued_bytes += unit.len();
        queue.units.push_back(unit);
        Ok(())
    }

    /// Ask the reactor to flush this connection
    pub fn request_write(&self) {
        self.write_interest.notify_one();
    }

    /// Resolves after [`Self::request_write`]; a request made while nobody
    /// waits is kept for the next waiter
    pub async fn write_requested(&self) {
        self.write_interest.notified().await
    }

    /// Drain the queue into a non-blocking sink, front to back
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<WriteProgress> {
        let mut queue = self.write_queue.lock();
        loop {
            let Some(head) = queue.units.front_mut() else {
                return Ok(WriteProgress::Drained);
            };

            match sink.write(&head[..]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    head.advance(n);
                    let finished = head.is_empty();
                    queue.queued_bytes -= n;
                    if finished {
                        queue.units.pop_front();
                    }
                    self.bytes_sent.fetch_add(n as u64, Ordering::Relaxed);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(WriteProgress::Pending);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.write_queue.lock().units.is_empty()
    }

    pub fn queued_bytes(&self) -> usize {
        self.write_queue.lock().queued_bytes
    }

    pub fn set_identified(&self) {
        self.identified.store(true, Ordering::Release);
    }

    pub fn is_identified(&self) -> bool {
        self.identified.load(Ordering::Acquire)
    }

    pub fn mark_for_closure(&self) {
        if !self.closing.swap(true, Ordering::AcqRel) {
            debug!(id = %self.id, "Connection marked for closure");
        }
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Closure pending and nothing left to flush
    pub fn should_close(&self) -> bool {
        self.is_closing() && !self.has_pending_writes()
    }

    pub fn increment_error_count(&self) -> ErrorTally {
        let count = self.error_count.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        ErrorTally {
            count,
            limit: self.limits.max_consecutive_errors,
        }
    }

    pub fn reset_error_count(&self) {
        self.error_count.store(0, Ordering::Release);
    }

    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::Acquire)
    }

    pub fn max_errors(&self) -> u32 {
        self.limits.max_consecutive_errors
    }

    pub fn record_received(&self, bytes: usize) {
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }
}
