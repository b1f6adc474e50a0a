//! # Message Pipeline
//!
//! ## Purpose
//!
//! Runs the handler chain for every extracted message on a fixed pool of
//! worker threads, so validation never stalls socket I/O on the reactor.
//!
//! ## Architecture
//!
//! ```text
//! reactor ──try_send──▶ bounded channel ──▶ msg-processor-0..N
//!                                              │
//!                                              ▼
//!                              HandlerChain over a MessageContext
//!                                              │
//!                       queue_message + request_write on the target
//! ```
//!
//! Workers take jobs independently, so two messages from the same source
//! may be forwarded in either order when both are in flight.
//!
//! ## Shutdown
//!
//! [`MessageProcessor::shutdown`] closes the channel and joins the workers.
//! Jobs already queued or running are finished; nothing is cancelled.

pub mod context;
pub mod handlers;
pub mod severity;

pub use context::MessageContext;
pub use handlers::{
    provenance_wrap, ForwardingHandler, HandlerChain, MessageHandler, RoutingHandler,
    ValidationHandler,
};
pub use severity::{error_notice, report_error, ErrorSeverity};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::connection::Connection;
use crate::{RouterError, RouterResult};

const HANDLER_FAILURE_NOTICE: &str = "Internal error: message dropped";

struct Job {
    raw: String,
    source: Arc<Connection>,
}

/// Bounded worker pool executing the handler chain
pub struct MessageProcessor {
    sender: RwLock<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    chain: Arc<HandlerChain>,
    worker_count: usize,
}

impl MessageProcessor {
    /// Spawn `worker_threads` workers sharing a queue of `queue_capacity` jobs
    pub fn start(chain: HandlerChain, worker_threads: usize, queue_capacity: usize) -> RouterResult<Self> {
        if worker_threads == 0 {
            return Err(RouterError::Config("worker_threads must be at least 1".into()));
        }

        let (sender, receiver) = crossbeam_channel::bounded(queue_capacity.max(1));
        let chain = Arc::new(chain);

        let mut workers = Vec::with_capacity(worker_threads);
        for index in 0..worker_threads {
            let receiver = receiver.clone();
            let chain = chain.clone();
            let handle = thread::Builder::new()
                .name(format!("msg-processor-{}", index))
                .spawn(move || worker_loop(index, receiver, chain))
                .map_err(|e| RouterError::Runtime(format!("Failed to spawn worker {}: {}", index, e)))?;
            workers.push(handle);
        }

        info!(
            workers = worker_threads,
            queue_capacity,
            handlers = ?chain.names(),
            "Message processor started"
        );

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
            chain,
            worker_count: worker_threads,
        })
    }

    /// Hand a message to the pool without blocking
    pub fn submit(&self, raw: String, source: Arc<Connection>) -> RouterResult<()> {
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(RouterError::ShuttingDown)?;
        sender.try_send(Job { raw, source }).map_err(|e| match e {
            TrySendError::Full(_) => RouterError::Overloaded,
            TrySendError::Disconnected(_) => RouterError::ShuttingDown,
        })
    }

    /// Run the chain on the calling thread
    pub fn process_now(&self, raw: impl Into<String>, source: Arc<Connection>) -> MessageContext {
        run_job(&self.chain, Job { raw: raw.into(), source })
    }

    /// Jobs waiting for a worker
    pub fn queued(&self) -> usize {
        self.sender.read().as_ref().map_or(0, |s| s.len())
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn is_running(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Stop accepting work, let queued jobs finish, join the workers
    pub fn shutdown(&self) {
        let Some(sender) = self.sender.write().take() else {
            return;
        };
        drop(sender);

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in workers {
            let name = handle.thread().name().unwrap_or("msg-processor").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "Worker panicked");
            }
        }
        info!("Message processor stopped");
    }
}

impl Drop for MessageProcessor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A panicking handler costs one message, never the worker.
fn worker_loop(index: usize, receiver: Receiver<Job>, chain: Arc<HandlerChain>) {
    debug!(worker = index, "Worker started");
    for job in receiver.iter() {
        let source = job.source.clone();
        if panic::catch_unwind(AssertUnwindSafe(|| run_job(&chain, job))).is_err() {
            error!(worker = index, id = %source.id(), "Handler panicked, message dropped");
            report_error(&source, HANDLER_FAILURE_NOTICE, ErrorSeverity::Routing);
        }
    }
    debug!(worker = index, "Worker exiting");
}

fn run_job(chain: &HandlerChain, job: Job) -> MessageContext {
    let mut ctx = MessageContext::new(job.raw, job.source);
    if chain.process(&mut ctx) {
        debug!(id = %ctx.source().id(), "Message processed");
    } else {
        debug!(
            id = %ctx.source().id(),
            error = ctx.error().unwrap_or("unspecified"),
            "Message rejected"
        );
    }
    ctx
}
