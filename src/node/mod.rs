//! Node Module
//!
//! One endpoint of a peer-to-peer connection. A node owns its socket, its
//! connection state and its role, and is the public entry point for
//! connecting, calling remote functions and servicing the peer's calls.
//!
//! ## Call Flow
//! ```text
//!   caller (master)                         peer (slave, listening)
//!   ───────────────                         ───────────────────────
//!   remote_execute("double", [3])
//!     state: Verified -> Processing
//!     ── 0x02 + call frame ───────────────▶  read control byte
//!                                            decode frame, run handler
//!     ◀────────────── 0x00 + Int(6) ──────  write response frame
//!     state: Processing -> Verified
//!   Ok(6)
//! ```
//!
//! Nodes are not reentrant: a handler must not call back into the node
//! that is dispatching it.

mod arbiter;
mod listen;

pub use arbiter::{Arbiter, ListenAction, Role};

use std::net::{SocketAddr, TcpStream};

use crate::config::Config;
use crate::error::{NodeSocketError, Result};
use crate::network::{self, fire, AddressFamily, Connection, ConnectionState, Hooks, StateEvent};
use crate::protocol::{encode_call_frame, ExecutionCode, FromWire, ResponseCode, WireValue};
use crate::registry::{HandlerResult, Invocation, ListenControl, Registry};

/// One endpoint of a NodeSocket connection
pub struct Node {
    /// Remote address used by `connect`, absent for accepted nodes
    addr: Option<SocketAddr>,

    /// Node configuration
    config: Config,

    /// Lifecycle callbacks
    hooks: Hooks,

    /// Active connection, if any
    connection: Option<Connection>,

    /// Current role and arbitration policy
    arbiter: Arbiter,

    /// Functions the peer may call
    registry: Registry,

    /// Stop flag for `listen`
    control: ListenControl,
}

impl Node {
    /// Create a node that will connect to `addr`
    pub fn new(addr: SocketAddr, config: Config) -> Self {
        let mut node = Self::detached(config);
        node.addr = Some(addr);
        node
    }

    /// Resolve `host` and create a node for the first matching address
    pub fn resolve(
        host: &str,
        port: u16,
        families: Option<&[AddressFamily]>,
        config: Config,
    ) -> Result<Self> {
        let addr = network::resolve(host, port, families)?;
        tracing::debug!("Resolved {}:{} to {}", host, port, addr);
        Ok(Self::new(addr, config))
    }

    /// Create a node with no remote address, to adopt an accepted stream
    pub fn detached(config: Config) -> Self {
        let arbiter = Arbiter::new(config.deny_master_request);
        Self {
            addr: None,
            config,
            hooks: Hooks::default(),
            connection: None,
            arbiter,
            registry: Registry::new(),
            control: ListenControl::new(),
        }
    }

    /// Replace the lifecycle callbacks
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Use a shared function registry
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    // =========================================================================
    // Connection Lifecycle
    // =========================================================================

    /// Connect, exchange signatures and claim the master role
    ///
    /// Fires OnConnect, then OnMaster, then OnVerified. Any previous
    /// connection is closed first. Fails without retrying.
    pub fn connect(&mut self) -> Result<()> {
        self.config.validate()?;

        let addr = self.addr.ok_or_else(|| {
            NodeSocketError::NotPermitted("node has no remote address to connect to".to_string())
        })?;

        self.close();

        tracing::debug!("Connecting to {}", addr);
        let mut connection = Connection::open(addr, &self.config, &mut self.hooks)?;
        let handshake = connection.initiate_handshake(&mut self.hooks);
        self.connection = Some(connection);
        handshake?;

        self.request_master()?;
        self.fire_verified();

        tracing::info!("Connected to {} as {}", addr, self.arbiter.role());
        Ok(())
    }

    /// Adopt an accepted stream and answer the peer's handshake
    ///
    /// The accepting node starts as slave. Fires OnConnect, then OnVerified.
    pub fn accept(&mut self, stream: TcpStream) -> Result<()> {
        self.config.validate()?;
        self.close();

        let mut connection = Connection::adopt(stream, &self.config, &mut self.hooks)?;
        let handshake = connection.respond_handshake(&mut self.hooks);
        self.connection = Some(connection);
        handshake?;

        self.fire_verified();

        tracing::info!("Accepted {} as {}", self.peer_addr().unwrap_or("unknown"), self.arbiter.role());
        Ok(())
    }

    /// Close the socket; the node returns to Disconnected
    pub fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.arbiter.set_role(Role::Slave);
    }

    fn fire_verified(&mut self) {
        if let Some(connection) = self.connection.as_ref() {
            fire(&mut self.hooks.on_verified, connection.stream());
        }
    }

    // =========================================================================
    // Arbitration
    // =========================================================================

    /// Claim the master role
    ///
    /// A no-op when already master. Otherwise requires an idle (Verified)
    /// connection, writes RequestMaster and takes the role without waiting
    /// for the peer. Fires OnMaster.
    pub fn request_master(&mut self) -> Result<()> {
        if self.arbiter.is_master() {
            return Ok(());
        }

        if self.state() != ConnectionState::Verified {
            return Err(NodeSocketError::NotPermitted(
                "a master request must be done over an idle, verified connection".to_string(),
            ));
        }

        let (connection, hooks) = self.connection_parts()?;
        connection.write_control(ExecutionCode::RequestMaster)?;
        fire(&mut hooks.on_master, connection.stream());

        self.arbiter.set_role(Role::Master);
        Ok(())
    }

    /// Hand the master role to the peer
    ///
    /// Requires master role on an idle connection. The peer claims master
    /// when its listen loop reads the RequestSlave byte.
    pub fn request_slave(&mut self) -> Result<()> {
        if !self.arbiter.is_master() {
            return Err(NodeSocketError::NotPermitted(
                "only the master can hand over its role".to_string(),
            ));
        }

        if self.state() != ConnectionState::Verified {
            return Err(NodeSocketError::NotPermitted(
                "a slave request must be done over an idle, verified connection".to_string(),
            ));
        }

        let (connection, _) = self.connection_parts()?;
        connection.write_control(ExecutionCode::RequestSlave)?;

        self.arbiter.set_role(Role::Slave);
        Ok(())
    }

    // =========================================================================
    // Remote Execution
    // =========================================================================

    /// Call `identifier` on the peer and decode its result as `T`
    ///
    /// - Okay => the decoded value
    /// - NoResult => `T::no_result()`
    /// - other known codes => `NodeSocketError::Remote`
    /// - unknown codes => `NodeSocketError::UnknownResponse`
    ///
    /// A call that fails before a whole response is read (timeout, unknown
    /// code, malformed frame, I/O) closes the node. Peer-reported codes and
    /// result type mismatches leave it Verified.
    pub fn remote_execute<T: FromWire>(&mut self, identifier: &str, args: &[WireValue]) -> Result<T> {
        if self.config.bidirectional {
            self.request_master()?;
        }

        if !self.arbiter.is_master() {
            return Err(NodeSocketError::NotPermitted(
                "unable to execute remote function when acting as a slave".to_string(),
            ));
        }

        if self.state() != ConnectionState::Verified {
            return Err(NodeSocketError::NotPermitted(
                "unable to execute remote function on an unverified/disconnected node".to_string(),
            ));
        }

        let frame = encode_call_frame(identifier, args)?;
        tracing::trace!("Calling '{}' with {} argument(s)", identifier, args.len());

        let (connection, hooks) = self.connection_parts()?;
        connection.apply(StateEvent::CallStarted)?;

        let outcome = match connection.write_all(&frame) {
            Ok(()) => connection.read_response_frame(hooks),
            Err(e) => Err(e),
        };

        let response = match outcome {
            Ok(response) => {
                connection.apply(StateEvent::CallFinished)?;
                response
            }
            Err(e) => {
                // A late or partial reply would be read by the next call
                tracing::warn!("Call to '{}' failed mid-exchange, closing: {}", identifier, e);
                self.close();
                return Err(e);
            }
        };

        match response.code {
            ResponseCode::Okay => {
                let value = response.value.ok_or_else(|| {
                    NodeSocketError::Protocol("Okay response carried no value".to_string())
                })?;
                T::from_wire(value)
            }
            ResponseCode::NoResult => Ok(T::no_result()),
            ResponseCode::NotAllowed => {
                // The peer still holds the master role
                self.arbiter.set_role(Role::Slave);
                Err(NodeSocketError::Remote(ResponseCode::NotAllowed))
            }
            code => {
                tracing::debug!("Call to '{}' failed: {}", identifier, code);
                Err(NodeSocketError::Remote(code))
            }
        }
    }

    /// A callable proxy for a remote function
    ///
    /// The identifier is not checked until the first call.
    pub fn link_function(&mut self, identifier: impl Into<String>) -> LinkedFunction<'_> {
        LinkedFunction {
            node: self,
            identifier: identifier.into(),
        }
    }

    // =========================================================================
    // Local Functions
    // =========================================================================

    /// Define a function the peer may call; redefinition replaces it
    pub fn define_function<F>(&self, identifier: impl Into<String>, handler: F)
    where
        F: Fn(&Invocation<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.registry.define(identifier, handler);
    }

    /// The registry backing this node
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// End `listen` once the current command has been answered
    pub fn stop_listening(&self) {
        self.control.stop_listening();
    }

    /// A handle that can stop `listen` from elsewhere
    pub fn listen_control(&self) -> ListenControl {
        self.control.clone()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Connection state, Disconnected when no connection exists
    pub fn state(&self) -> ConnectionState {
        self.connection
            .as_ref()
            .map(|c| c.state())
            .unwrap_or(ConnectionState::Disconnected)
    }

    pub fn role(&self) -> Role {
        self.arbiter.role()
    }

    pub fn is_master(&self) -> bool {
        self.arbiter.is_master()
    }

    /// Whether the handshake has completed on the current connection
    pub fn is_verified(&self) -> bool {
        self.state().is_verified()
    }

    /// Peer address of the current connection
    pub fn peer_addr(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.peer_addr())
    }

    /// Local address of the current connection
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.connection
            .as_ref()
            .and_then(|c| c.stream().local_addr().ok())
    }

    /// Address `connect` dials
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the lifecycle callbacks
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    fn connection_parts(&mut self) -> Result<(&mut Connection, &mut Hooks)> {
        let connection = self.connection.as_mut().ok_or_else(|| {
            NodeSocketError::NotPermitted("node is not connected".to_string())
        })?;
        Ok((connection, &mut self.hooks))
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("addr", &self.addr)
            .field("state", &self.state())
            .field("role", &self.role())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Local proxy for a remote function
pub struct LinkedFunction<'a> {
    node: &'a mut Node,
    identifier: String,
}

impl LinkedFunction<'_> {
    /// Run the remote function and decode its result
    pub fn call<T: FromWire>(&mut self, args: &[WireValue]) -> Result<T> {
        self.node.remote_execute(&self.identifier, args)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}
