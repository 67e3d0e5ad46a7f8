//! TCP Server
//!
//! Accepts connections, verifies them, and hands each resulting node to a
//! session on its own thread. Every node shares the server's registry.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;

use crate::config::Config;
use crate::error::{NodeSocketError, Result};
use crate::node::Node;
use crate::registry::Registry;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);

/// TCP server producing verified slave nodes
pub struct Server {
    config: Config,
    listener: TcpListener,
    registry: Registry,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

/// Cloneable handle that stops `Server::run`
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Server {
    /// Bind `config.listen_addr` with a fresh registry
    pub fn bind(config: Config) -> Result<Self> {
        Self::bind_with_registry(config, Registry::new())
    }

    /// Bind `config.listen_addr`, serving functions from `registry`
    pub fn bind_with_registry(config: Config, registry: Registry) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            NodeSocketError::Network(format!("Failed to bind {}: {}", config.listen_addr, e))
        })?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            listener,
            registry,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Registry shared by every accepted node
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle for stopping `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Number of sessions currently running under `run`
    pub fn active_sessions(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Accept one connection and complete its handshake (blocking)
    pub fn accept(&self) -> Result<Node> {
        self.listener.set_nonblocking(false)?;
        let (stream, peer) = self.listener.accept()?;
        tracing::debug!("Accepted connection from {}", peer);
        verify_stream(self.config.clone(), self.registry.clone(), stream)
    }

    /// Accept connections until shutdown, running `session` per verified node
    ///
    /// Connections beyond `max_connections` are dropped. Returns once
    /// shutdown has been signalled and every running session has finished.
    pub fn run<F>(&self, session: F) -> Result<()>
    where
        F: Fn(Node) + Send + Sync + 'static,
    {
        let session = Arc::new(session);
        let wait_group = WaitGroup::new();

        self.listener.set_nonblocking(true)?;

        while !self.shutdown.load(Ordering::SeqCst) {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_BACKOFF);
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    continue;
                }
            };

            if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
                tracing::warn!(
                    "Rejecting {}: {} sessions already active",
                    peer,
                    self.config.max_connections
                );
                drop(stream);
                continue;
            }

            let session = Arc::clone(&session);
            let active = Arc::clone(&self.active);
            let guard = wait_group.clone();
            let config = self.config.clone();
            let registry = self.registry.clone();
            active.fetch_add(1, Ordering::SeqCst);

            let spawned = thread::Builder::new()
                .name(format!("nodesocket-{}", peer))
                .spawn(move || {
                    match verify_stream(config, registry, stream) {
                        Ok(node) => {
                            tracing::debug!("Session with {} started", peer);
                            session(node);
                            tracing::debug!("Session with {} ended", peer);
                        }
                        Err(e) => tracing::warn!("Handshake with {} failed: {}", peer, e),
                    }
                    active.fetch_sub(1, Ordering::SeqCst);
                    drop(guard);
                });

            if let Err(e) = spawned {
                self.active.fetch_sub(1, Ordering::SeqCst);
                tracing::error!("Failed to spawn session for {}: {}", peer, e);
            }
        }

        tracing::info!("Shutting down, waiting for {} session(s)", self.active_sessions());
        wait_group.wait();
        self.listener.set_nonblocking(false)?;
        Ok(())
    }
}

/// Wrap an accepted stream in a node and answer its handshake
fn verify_stream(config: Config, registry: Registry, stream: TcpStream) -> Result<Node> {
    let mut node = Node::detached(config).with_registry(registry);
    node.accept(stream)?;
    Ok(node)
}
