//! # Router Server
//!
//! ## Purpose
//!
//! Owns the two listeners and the single reactor thread that drives every
//! socket. The reactor accepts, reads, frames and writes; everything else
//! (validation, routing, forwarding) happens on the worker pool.
//!
//! ## Architecture
//!
//! ```text
//! Router::start()
//!   ├─ bind broker + market listeners (caller thread, errors surface here)
//!   ├─ MessageProcessor::start (msg-processor-N threads)
//!   └─ "router-reactor" thread: current_thread tokio runtime
//!         ├─ accept loop: register, queue "ID=<id>|", spawn session
//!         └─ one session task per connection
//!               ├─ readable  → framer → extract_messages → processor.submit
//!               ├─ requested → arm write interest
//!               └─ writable  → drain write queue, close once drained if marked
//! ```
//!
//! ## Lifecycle
//!
//! [`RouterHandle::stop`] fires the shutdown signal, joins the reactor (which
//! drops the listeners and ends every session), then drains the worker pool.
//! Dropping the handle does the same.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use router_config::{FixSchema, RouterConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, info, trace, warn};

use crate::connection::framing::{extract_messages, MessageFramer};
use crate::connection::manager::ConnectionManager;
use crate::connection::{Connection, ConnectionLimits, WriteProgress};
use crate::ids::IdAllocator;
use crate::pipeline::{report_error, ErrorSeverity, HandlerChain, MessageProcessor};
use crate::routing::RoutingTable;
use crate::shutdown::{ShutdownListener, ShutdownSignal};
use crate::stats::{RouterStats, RouterStatsSnapshot};
use crate::types::PeerType;
use crate::{RouterError, RouterResult};

const BUSY_NOTICE: &str = "Router busy: message dropped, retry later";

/// Sessions still running this long after shutdown are aborted
const SESSION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configured but not yet running router
pub struct Router {
    config: RouterConfig,
    schema: Arc<FixSchema>,
}

impl Router {
    pub fn new(config: RouterConfig, schema: FixSchema) -> Self {
        Self {
            config,
            schema: Arc::new(schema),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn schema(&self) -> &FixSchema {
        &self.schema
    }

    /// Bind both ports and start the reactor and worker threads
    pub fn start(self) -> RouterResult<RouterHandle> {
        self.config
            .validate()
            .map_err(|e| RouterError::Config(e.to_string()))?;

        let delimiter = self.schema.delimiter();
        if !delimiter.is_ascii() {
            return Err(RouterError::Config(format!(
                "Delimiter {:?} must be a single ASCII character",
                delimiter
            )));
        }

        let broker_listener = bind(&self.config.server.broker_endpoint())?;
        let market_listener = bind(&self.config.server.market_endpoint())?;
        let broker_addr = broker_listener.local_addr()?;
        let market_addr = market_listener.local_addr()?;

        let routing = Arc::new(RoutingTable::new());
        let stats = Arc::new(RouterStats::default());
        let manager = Arc::new(ConnectionManager::new(
            routing.clone(),
            IdAllocator::new(self.config.limits.id_ceiling),
            ConnectionLimits::from(&self.config),
        ));

        let chain = HandlerChain::standard(
            self.schema.clone(),
            routing,
            stats.clone(),
            self.config.pipeline.verify_sender,
        );
        let processor = Arc::new(MessageProcessor::start(
            chain,
            self.config.pipeline.worker_threads,
            self.config.pipeline.queue_capacity,
        )?);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RouterError::Runtime(format!("Failed to build reactor runtime: {}", e)))?;

        let shutdown = ShutdownSignal::new();
        let shared = Arc::new(Shared {
            manager: manager.clone(),
            processor: processor.clone(),
            stats: stats.clone(),
            settings: SessionSettings::new(&self.config, delimiter),
        });
        let reactor = Reactor {
            shared,
            shutdown: shutdown.clone(),
        };

        let thread = thread::Builder::new()
            .name("router-reactor".to_string())
            .spawn(move || runtime.block_on(reactor.run(broker_listener, market_listener)));
        let thread = match thread {
            Ok(thread) => thread,
            Err(e) => {
                processor.shutdown();
                return Err(RouterError::Runtime(format!("Failed to spawn reactor: {}", e)));
            }
        };

        info!(
            broker = %broker_addr,
            market = %market_addr,
            workers = processor.worker_count(),
            protocol = self.schema.protocol(),
            delimiter = %delimiter,
            "🚀 Router started"
        );

        Ok(RouterHandle {
            broker_addr,
            market_addr,
            shutdown,
            reactor: Some(thread),
            processor,
            manager,
            stats,
        })
    }
}

fn bind(endpoint: &str) -> RouterResult<StdTcpListener> {
    let listener = StdTcpListener::bind(endpoint).map_err(|source| RouterError::Bind {
        endpoint: endpoint.to_string(),
        source,
    })?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Control surface for a running router
pub struct RouterHandle {
    broker_addr: SocketAddr,
    market_addr: SocketAddr,
    shutdown: ShutdownSignal,
    reactor: Option<JoinHandle<()>>,
    processor: Arc<MessageProcessor>,
    manager: Arc<ConnectionManager>,
    stats: Arc<RouterStats>,
}

impl RouterHandle {
    /// Bound broker address; the real port when configured with port 0
    pub fn broker_addr(&self) -> SocketAddr {
        self.broker_addr
    }

    pub fn market_addr(&self) -> SocketAddr {
        self.market_addr
    }

    pub fn connection_count(&self) -> usize {
        self.manager.connection_count()
    }

    pub fn count_by_type(&self, peer_type: PeerType) -> usize {
        self.manager.count_by_type(peer_type)
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn stats(&self) -> RouterStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.reactor.is_some()
    }

    /// Stop accepting, close every connection and drain the workers
    pub fn stop(&mut self) {
        let Some(reactor) = self.reactor.take() else {
            return;
        };

        info!("Stopping router");
        self.shutdown.trigger();
        if reactor.join().is_err() {
            error!("Reactor thread panicked");
        }
        self.processor.shutdown();

        let stats = self.stats.snapshot();
        info!(
            accepted = stats.connections_accepted,
            received = stats.messages_received,
            forwarded = stats.messages_forwarded,
            rejected = stats.messages_rejected,
            dropped_busy = stats.messages_dropped_busy,
            "Router stopped"
        );
    }
}

impl Drop for RouterHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone)]
struct SessionSettings {
    poll_timeout: Duration,
    read_buffer_size: usize,
    max_pending_bytes: usize,
    closure_grace: Duration,
    delimiter: char,
}

impl SessionSettings {
    fn new(config: &RouterConfig, delimiter: char) -> Self {
        Self {
            poll_timeout: config.server.poll_timeout(),
            read_buffer_size: config.server.read_buffer_size,
            max_pending_bytes: config.server.max_pending_bytes,
            closure_grace: config.server.closure_grace(),
            delimiter,
        }
    }
}

/// State every session task needs
struct Shared {
    manager: Arc<ConnectionManager>,
    processor: Arc<MessageProcessor>,
    stats: Arc<RouterStats>,
    settings: SessionSettings,
}

struct Reactor {
    shared: Arc<Shared>,
    shutdown: ShutdownSignal,
}

impl Reactor {
    async fn run(self, broker: StdTcpListener, market: StdTcpListener) {
        let listeners = TcpListener::from_std(broker).and_then(|b| Ok((b, TcpListener::from_std(market)?)));
        let (broker, market) = match listeners {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "Failed to register listeners with the reactor");
                return;
            }
        };

        let mut shutdown = self.shutdown.subscribe();
        let mut sessions = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                accepted = broker.accept() => self.on_accept(accepted, PeerType::Broker, &mut sessions),
                accepted = market.accept() => self.on_accept(accepted, PeerType::Market, &mut sessions),
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Session task failed");
                    }
                }
                _ = sleep(self.shared.settings.poll_timeout) => {
                    trace!(connections = self.shared.manager.connection_count(), "Reactor idle");
                }
            }
        }

        drop(broker);
        drop(market);
        info!(open = sessions.len(), "Listeners closed, ending sessions");

        let drained = tokio::time::timeout(SESSION_DRAIN_TIMEOUT, async {
            while sessions.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = sessions.len(), "Aborting sessions that did not finish");
            sessions.abort_all();
            while sessions.join_next().await.is_some() {}
        }

        for connection in self.shared.manager.connections() {
            self.shared.manager.unregister(connection.id().as_str());
        }
        debug!("Reactor exiting");
    }

    fn on_accept(
        &self,
        accepted: io::Result<(TcpStream, SocketAddr)>,
        peer_type: PeerType,
        sessions: &mut JoinSet<()>,
    ) {
        let (stream, peer_addr) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!(peer_type = %peer_type, error = %e, "Accept failed");
                return;
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer_addr, error = %e, "Could not set TCP_NODELAY");
        }

        let connection = match self.shared.manager.register(peer_type, peer_addr) {
            Ok(connection) => connection,
            Err(e) => {
                error!(peer = %peer_addr, error = %e, "Rejecting connection");
                return;
            }
        };
        self.shared.stats.connection_accepted();

        let greeting = format!("ID={}{}", connection.id(), self.shared.settings.delimiter);
        if let Err(e) = connection.queue_message(&greeting) {
            error!(id = %connection.id(), error = %e, "Could not queue identifier");
            self.shared.manager.unregister(connection.id().as_str());
            self.shared.stats.connection_closed();
            return;
        }
        connection.request_write();

        let session = Session::new(stream, connection, self.shared.clone(), self.shutdown.subscribe());
        sessions.spawn(session.run());
    }
}

/// Why a session ended
#[derive(Debug)]
enum CloseReason {
    PeerClosed,
    Drained,
    GraceExpired,
    Shutdown,
    Io(io::Error),
}

/// Read/write loop for one accepted socket
struct Session {
    stream: TcpStream,
    connection: Arc<Connection>,
    framer: MessageFramer,
    read_buf: Vec<u8>,
    shared: Arc<Shared>,
    shutdown: ShutdownListener,
}

impl Session {
    fn new(stream: TcpStream, connection: Arc<Connection>, shared: Arc<Shared>, shutdown: ShutdownListener) -> Self {
        let settings = &shared.settings;
        Self {
            framer: MessageFramer::new(settings.delimiter, settings.max_pending_bytes),
            read_buf: vec![0; settings.read_buffer_size.max(1)],
            stream,
            connection,
            shared,
            shutdown,
        }
    }

    async fn run(mut self) {
        let reason = self.drive().await;

        let id = self.connection.id().clone();
        self.shared.manager.unregister(id.as_str());
        self.shared.stats.connection_closed();

        match reason {
            CloseReason::Io(e) => warn!(id = %id, error = %e, "Connection closed on I/O error"),
            reason => debug!(
                id = %id,
                ?reason,
                received = self.connection.bytes_received(),
                sent = self.connection.bytes_sent(),
                "Session ended"
            ),
        }
    }

    async fn drive(&mut self) -> CloseReason {
        let mut write_armed = false;
        let mut close_deadline: Option<Instant> = None;

        loop {
            if close_deadline.is_none() && self.connection.is_closing() {
                close_deadline = Some(Instant::now() + self.shared.settings.closure_grace);
                write_armed = true;
            }
            let reading = close_deadline.is_none();
            let deadline = close_deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                biased;

                _ = self.shutdown.wait() => return CloseReason::Shutdown,

                _ = self.connection.write_requested(), if !write_armed => {
                    write_armed = true;
                }

                ready = self.stream.writable(), if write_armed => {
                    if let Err(e) = ready {
                        return CloseReason::Io(e);
                    }
                    match self.connection.write_to(&mut SocketWriter(&self.stream)) {
                        Ok(WriteProgress::Drained) => {
                            write_armed = false;
                            if !self.connection.is_identified() {
                                self.connection.set_identified();
                                debug!(id = %self.connection.id(), "Identifier delivered");
                            }
                            if self.connection.should_close() {
                                return CloseReason::Drained;
                            }
                        }
                        Ok(WriteProgress::Pending) => {}
                        Err(e) => return CloseReason::Io(e),
                    }
                }

                ready = self.stream.readable(), if reading => {
                    if let Err(e) = ready {
                        return CloseReason::Io(e);
                    }
                    match self.read_once() {
                        Ok(true) => {}
                        Ok(false) => return CloseReason::PeerClosed,
                        Err(e) => return CloseReason::Io(e),
                    }
                }

                _ = sleep_until(deadline), if close_deadline.is_some() => {
                    warn!(
                        id = %self.connection.id(),
                        queued = self.connection.queued_bytes(),
                        "Write queue not drained within grace period, forcing close"
                    );
                    return CloseReason::GraceExpired;
                }
            }
        }
    }

    /// One non-blocking read; `Ok(false)` on end of stream
    fn read_once(&mut self) -> io::Result<bool> {
        let n = match self.stream.try_read(&mut self.read_buf) {
            Ok(0) => return Ok(false),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::Interrupted => {
                return Ok(true)
            }
            Err(e) => return Err(e),
        };

        self.connection.record_received(n);
        trace!(id = %self.connection.id(), bytes = n, "Read");

        if let Some(batch) = self.framer.push(&self.read_buf[..n]) {
            self.dispatch(&batch);
        }
        Ok(true)
    }

    fn dispatch(&mut self, batch: &str) {
        for raw in extract_messages(batch, self.shared.settings.delimiter) {
            if self.connection.is_closing() {
                debug!(id = %self.connection.id(), "Connection closing, ignoring remaining input");
                self.framer.clear();
                return;
            }

            self.shared.stats.message_received();
            match self.shared.processor.submit(raw, self.connection.clone()) {
                Ok(()) => {}
                Err(RouterError::Overloaded) => {
                    self.shared.stats.message_dropped_busy();
                    warn!(id = %self.connection.id(), "Processing queue full, message dropped");
                    report_error(&self.connection, BUSY_NOTICE, ErrorSeverity::Routing);
                }
                Err(e) => {
                    debug!(id = %self.connection.id(), error = %e, "Message not submitted");
                }
            }
        }
    }
}

/// `io::Write` over a tokio stream that never blocks
struct SocketWriter<'a>(&'a TcpStream);

impl Write for SocketWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.try_write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
