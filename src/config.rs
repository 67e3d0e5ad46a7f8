//! Configuration for NodeSocket
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{NodeSocketError, Result};
use crate::protocol::SIGNATURE;

/// Main configuration for a node (and the server producing nodes)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Node Configuration
    // -------------------------------------------------------------------------
    /// Claim the master role before every remote call
    pub bidirectional: bool,

    /// Enable TCP keep-alive once the connection is verified
    pub keep_alive: bool,

    /// Deadline for polled reads (milliseconds), `None` waits indefinitely
    ///
    /// Does not apply to the control byte read of the listen loop, which
    /// always waits indefinitely.
    pub poll_timeout_ms: Option<u64>,

    /// Keep the master role when the peer requests it
    pub deny_master_request: bool,

    /// Upper bound on a single receive (bytes)
    pub max_read_size: usize,

    // -------------------------------------------------------------------------
    // Socket Configuration
    // -------------------------------------------------------------------------
    /// TCP connect timeout (milliseconds), `None` uses the OS default
    pub connect_timeout_ms: Option<u64>,

    /// Socket write timeout (milliseconds), `None` blocks indefinitely
    pub write_timeout_ms: Option<u64>,

    /// Disable Nagle's algorithm
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Server Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent sessions served by `Server::run`
    pub max_connections: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bidirectional: false,
            keep_alive: false,
            poll_timeout_ms: None,
            deny_master_request: false,
            max_read_size: 64 * 1024, // 64 KB
            connect_timeout_ms: None,
            write_timeout_ms: None,
            nodelay: true,
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 64,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check values the socket layer would otherwise reject at runtime
    pub fn validate(&self) -> Result<()> {
        // The handshake reads the whole signature in one receive
        if self.max_read_size < SIGNATURE.len() {
            return Err(NodeSocketError::Config(format!(
                "max_read_size must be at least {} bytes",
                SIGNATURE.len()
            )));
        }
        if self.max_connections == 0 {
            return Err(NodeSocketError::Config(
                "max_connections must be greater than zero".to_string(),
            ));
        }
        if self.poll_timeout_ms == Some(0) {
            return Err(NodeSocketError::Config(
                "poll_timeout_ms must be greater than zero (use None to wait indefinitely)"
                    .to_string(),
            ));
        }
        if self.connect_timeout_ms == Some(0) || self.write_timeout_ms == Some(0) {
            return Err(NodeSocketError::Config(
                "socket timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll deadline as a `Duration`
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_ms.map(Duration::from_millis)
    }

    /// Connect timeout as a `Duration`
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Write timeout as a `Duration`
    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_ms.map(Duration::from_millis)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Claim the master role before every remote call
    pub fn bidirectional(mut self, enabled: bool) -> Self {
        self.config.bidirectional = enabled;
        self
    }

    /// Enable TCP keep-alive after verification
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.config.keep_alive = enabled;
        self
    }

    /// Set the poll deadline (in milliseconds)
    pub fn poll_timeout_ms(mut self, ms: u64) -> Self {
        self.config.poll_timeout_ms = Some(ms);
        self
    }

    /// Wait indefinitely on polled reads
    pub fn no_poll_timeout(mut self) -> Self {
        self.config.poll_timeout_ms = None;
        self
    }

    /// Keep the master role when the peer requests it
    pub fn deny_master_request(mut self, deny: bool) -> Self {
        self.config.deny_master_request = deny;
        self
    }

    /// Set the upper bound on a single receive (in bytes)
    pub fn max_read_size(mut self, size: usize) -> Self {
        self.config.max_read_size = size;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = Some(ms);
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = Some(ms);
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.config.nodelay = enabled;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent sessions
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
