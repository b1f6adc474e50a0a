//! Core E2E testing framework
//!
//! [`TestRouter`] runs a real router on ephemeral loopback ports;
//! [`TestClient`] is a line-oriented TCP peer with timeouts on every read.

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use router_config::{FixSchema, RouterConfig};
use router_core::{PeerType, Router, RouterHandle, RouterStatsSnapshot};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

/// Default wait for any single line from the router
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Install a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Router bound to 127.0.0.1 with OS-assigned ports
pub struct TestRouter {
    handle: Option<RouterHandle>,
}

impl TestRouter {
    /// Loopback configuration with fast polling and a short closure grace
    pub fn test_config() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.server.bind_address = "127.0.0.1".to_string();
        config.server.broker_port = 0;
        config.server.market_port = 0;
        config.server.poll_timeout_ms = 50;
        config.server.closure_grace_ms = 1_000;
        config
    }

    pub fn start() -> Result<Self> {
        Self::start_with(Self::test_config(), FixSchema::builtin()?)
    }

    pub fn start_with(config: RouterConfig, schema: FixSchema) -> Result<Self> {
        init_tracing();
        let handle = Router::new(config, schema)
            .start()
            .context("Failed to start router")?;
        debug!(broker = %handle.broker_addr(), market = %handle.market_addr(), "Test router up");
        Ok(Self {
            handle: Some(handle),
        })
    }

    pub fn handle(&self) -> Result<&RouterHandle> {
        self.handle.as_ref().ok_or_else(|| anyhow!("router already stopped"))
    }

    pub fn broker_addr(&self) -> Result<SocketAddr> {
        Ok(self.handle()?.broker_addr())
    }

    pub fn market_addr(&self) -> Result<SocketAddr> {
        Ok(self.handle()?.market_addr())
    }

    pub async fn connect_broker(&self) -> Result<TestClient> {
        TestClient::connect(self.broker_addr()?, '|').await
    }

    pub async fn connect_market(&self) -> Result<TestClient> {
        TestClient::connect(self.market_addr()?, '|').await
    }

    /// Poll until the registry holds `expected` connections of `peer_type`
    pub async fn wait_for_count(&self, peer_type: PeerType, expected: usize) -> Result<()> {
        let deadline = Instant::now() + READ_TIMEOUT;
        loop {
            let current = self.handle()?.count_by_type(peer_type);
            if current == expected {
                return Ok(());
            }
            if Instant::now() >= deadline {
                bail!("expected {} {} connections, found {}", expected, peer_type, current);
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    pub fn stats(&self) -> Result<RouterStatsSnapshot> {
        Ok(self.handle()?.stats())
    }

    /// Stop the router off the async runtime and return the final counters
    pub async fn stop(mut self) -> Result<RouterStatsSnapshot> {
        let mut handle = self.handle.take().ok_or_else(|| anyhow!("router already stopped"))?;
        let stats = tokio::task::spawn_blocking(move || {
            handle.stop();
            handle.stats()
        })
        .await?;
        Ok(stats)
    }
}

impl Drop for TestRouter {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
        }
    }
}

/// One broker or market peer
pub struct TestClient {
    stream: BufReader<TcpStream>,
    id: String,
    delimiter: char,
}

impl TestClient {
    /// Connect and consume the `ID=<id>` greeting
    pub async fn connect(addr: SocketAddr, delimiter: char) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        let mut client = Self {
            stream: BufReader::new(stream),
            id: String::new(),
            delimiter,
        };

        let greeting = client.read_line().await?;
        client.id = greeting
            .strip_prefix("ID=")
            .and_then(|rest| rest.strip_suffix(delimiter))
            .ok_or_else(|| anyhow!("unexpected greeting: {:?}", greeting))?
            .to_string();
        Ok(client)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send one message followed by a newline
    pub async fn send(&mut self, message: &str) -> Result<()> {
        self.send_raw(format!("{}\n", message).as_bytes()).await
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Next line without the trailing newline; errors on timeout or EOF
    pub async fn read_line(&mut self) -> Result<String> {
        match self.next_line(READ_TIMEOUT).await? {
            Some(line) => Ok(line),
            None => bail!("connection {} closed by router", self.id),
        }
    }

    /// Succeeds if nothing arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match timeout(window, self.read_some()).await {
            Err(_) => Ok(()),
            Ok(Ok(None)) => bail!("connection {} closed while expecting silence", self.id),
            Ok(Ok(Some(line))) => bail!("unexpected line on {}: {:?}", self.id, line),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Wait for the router to close the connection, returning any lines sent first
    pub async fn expect_closed(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            match self.next_line(READ_TIMEOUT).await {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => return Ok(lines),
                // reset by peer counts as closed
                Err(e) if is_reset(&e) => return Ok(lines),
                Err(e) => return Err(e),
            }
        }
    }

    async fn next_line(&mut self, wait: Duration) -> Result<Option<String>> {
        timeout(wait, self.read_some())
            .await
            .map_err(|_| anyhow!("timed out waiting for a line on {}", self.id))?
    }

    async fn read_some(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
        debug!(client = %self.id, line = %trimmed, delimiter = %self.delimiter, "Received");
        Ok(Some(trimmed))
    }
}

fn is_reset(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<std::io::Error>()
        .is_some_and(|e| e.kind() == std::io::ErrorKind::ConnectionReset)
}
