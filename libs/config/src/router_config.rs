//! Router Configuration Module
//!
//! Layered loading for the router: built-in defaults, then an optional TOML
//! file, then `FIX_ROUTER__*` environment variables
//! (e.g. `FIX_ROUTER__SERVER__BROKER_PORT=6000`).

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::protocol::{ids, limits as protocol_limits};
use crate::service::{limits, network, pipeline};

/// Complete router configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    pub server: ServerSettings,
    pub pipeline: PipelineSettings,
    pub limits: LimitSettings,
    pub schema: SchemaSettings,
}

/// Listener and reactor settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub broker_port: u16,
    pub market_port: u16,
    pub poll_timeout_ms: u64,
    pub read_buffer_size: usize,
    pub max_pending_bytes: usize,
    pub closure_grace_ms: u64,
}

/// Worker pool settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub worker_threads: usize,
    pub queue_capacity: usize,
    /// Reject messages whose SenderCompID differs from the connection id
    pub verify_sender: bool,
}

/// Per-connection and identifier limits
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitSettings {
    pub max_consecutive_errors: u32,
    pub id_ceiling: u32,
    pub max_write_queue_bytes: usize,
}

/// Where to find the FIX schema; the embedded schema is used when unset
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaSettings {
    pub path: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: network::DEFAULT_BIND_ADDRESS.to_string(),
            broker_port: network::DEFAULT_BROKER_PORT,
            market_port: network::DEFAULT_MARKET_PORT,
            poll_timeout_ms: network::DEFAULT_POLL_TIMEOUT_MS,
            read_buffer_size: network::DEFAULT_READ_BUFFER_SIZE,
            max_pending_bytes: network::DEFAULT_MAX_PENDING_BYTES,
            closure_grace_ms: network::DEFAULT_CLOSURE_GRACE_MS,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            worker_threads: pipeline::DEFAULT_WORKER_THREADS,
            queue_capacity: pipeline::DEFAULT_QUEUE_CAPACITY,
            verify_sender: true,
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_consecutive_errors: limits::DEFAULT_MAX_CONSECUTIVE_ERRORS,
            id_ceiling: ids::MAX_ID_CEILING,
            max_write_queue_bytes: limits::DEFAULT_MAX_WRITE_QUEUE_BYTES,
        }
    }
}

impl ServerSettings {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn closure_grace(&self) -> Duration {
        Duration::from_millis(self.closure_grace_ms)
    }

    pub fn broker_endpoint(&self) -> String {
        format!("{}:{}", self.bind_address, self.broker_port)
    }

    pub fn market_endpoint(&self) -> String {
        format!("{}:{}", self.bind_address, self.market_port)
    }
}

impl RouterConfig {
    /// Load configuration with environment overrides, then validate it
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading router config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        // Override with environment variables (FIX_ROUTER__ prefix)
        builder = builder.add_source(
            Environment::with_prefix("FIX_ROUTER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: RouterConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without consulting the environment
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RouterConfig =
            toml::from_str(content).context("Failed to parse router config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.bind_address.is_empty() {
            bail!("server.bind_address cannot be empty");
        }
        if server.broker_port != 0 && server.broker_port == server.market_port {
            bail!("Broker and market ports must differ (both {})", server.broker_port);
        }
        if server.poll_timeout_ms == 0 {
            bail!("server.poll_timeout_ms must be greater than 0");
        }
        if server.read_buffer_size == 0 {
            bail!("server.read_buffer_size must be greater than 0");
        }
        if server.max_pending_bytes <= protocol_limits::MAX_MESSAGE_LENGTH {
            bail!(
                "server.max_pending_bytes ({}) must exceed the maximum message length ({})",
                server.max_pending_bytes,
                protocol_limits::MAX_MESSAGE_LENGTH
            );
        }

        if self.pipeline.worker_threads == 0 {
            bail!("pipeline.worker_threads must be at least 1");
        }
        if self.pipeline.queue_capacity == 0 {
            bail!("pipeline.queue_capacity must be at least 1");
        }

        if self.limits.max_consecutive_errors == 0 {
            bail!("limits.max_consecutive_errors must be at least 1");
        }
        if self.limits.id_ceiling == 0 || self.limits.id_ceiling > ids::MAX_ID_CEILING {
            bail!(
                "limits.id_ceiling must be between 1 and {}, got {}",
                ids::MAX_ID_CEILING,
                self.limits.id_ceiling
            );
        }
        if self.limits.max_write_queue_bytes < protocol_limits::MAX_MESSAGE_LENGTH {
            bail!(
                "limits.max_write_queue_bytes ({}) cannot hold one maximum-size message",
                self.limits.max_write_queue_bytes
            );
        }

        Ok(())
    }

    /// One-line description for the startup log
    pub fn summary(&self) -> String {
        format!(
            "broker={} market={} workers={} queue={} max_errors={} verify_sender={} schema={}",
            self.server.broker_endpoint(),
            self.server.market_endpoint(),
            self.pipeline.worker_threads,
            self.pipeline.queue_capacity,
            self.limits.max_consecutive_errors,
            self.pipeline.verify_sender,
            self.schema
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "builtin".to_string()),
        )
    }
}
