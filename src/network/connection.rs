//! Connection Handler
//!
//! Owns the socket of one node and drives its lifecycle: the signature
//! handshake, framed reads and writes, and the state transitions between
//! them.

use std::net::{SocketAddr, TcpStream};

use bytes::{Bytes, BytesMut};

use super::hooks::{fire, Hooks};
use super::socket::{PollSocket, Wait};
use super::state::{ConnectionState, StateEvent};
use crate::config::Config;
use crate::error::{NodeSocketError, Result};
use crate::protocol::{
    decode_call_payload, decode_response_frame, parse_payload_len, CallFrame, ExecutionCode,
    ResponseCode, ResponseFrame, MAX_PAYLOAD_SIZE, SCALAR_HEADER_SIZE, SIGNATURE,
};

/// A single peer connection
pub struct Connection {
    /// Poll-style socket
    socket: PollSocket,

    /// Lifecycle state
    state: ConnectionState,

    /// Whether to set SO_KEEPALIVE once verified
    keep_alive: bool,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Connect to `addr`; fires OnConnect on success
    pub fn open(addr: SocketAddr, config: &Config, hooks: &mut Hooks) -> Result<Self> {
        let socket = PollSocket::connect(addr, config).map_err(|e| {
            NodeSocketError::Network(format!("Failed to connect to {}: {}", addr, e))
        })?;
        Ok(Self::established(socket, config, hooks))
    }

    /// Adopt an accepted stream; fires OnConnect
    pub fn adopt(stream: TcpStream, config: &Config, hooks: &mut Hooks) -> Result<Self> {
        let socket = PollSocket::from_stream(stream, config)?;
        Ok(Self::established(socket, config, hooks))
    }

    fn established(socket: PollSocket, config: &Config, hooks: &mut Hooks) -> Self {
        let peer_addr = socket
            .stream()
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let connection = Self {
            socket,
            state: ConnectionState::Connected,
            keep_alive: config.keep_alive,
            peer_addr,
        };

        tracing::debug!("Connection established with {}", connection.peer_addr);
        fire(&mut hooks.on_connect, connection.socket.stream());

        connection
    }

    // =========================================================================
    // Handshake
    // =========================================================================

    /// Connecting side: send our signature, then verify the peer's
    pub fn initiate_handshake(&mut self, hooks: &mut Hooks) -> Result<()> {
        self.expect_state(ConnectionState::Connected, "handshake")?;

        if let Err(e) = self.socket.send(SIGNATURE) {
            self.reject_signature();
            return Err(e.into());
        }

        self.verify_remote_signature(hooks)
    }

    /// Accepting side: verify the peer's signature, then answer with ours
    pub fn respond_handshake(&mut self, hooks: &mut Hooks) -> Result<()> {
        self.expect_state(ConnectionState::Connected, "handshake")?;

        self.verify_remote_signature(hooks)?;

        if let Err(e) = self.socket.send(SIGNATURE) {
            self.reject_signature();
            return Err(e.into());
        }
        Ok(())
    }

    /// One receive of up to the signature length; a short token is rejected
    /// rather than waited on.
    fn verify_remote_signature(&mut self, hooks: &mut Hooks) -> Result<()> {
        let received = match self.socket.receive(Some(SIGNATURE.len()), Wait::Poll) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                fire(&mut hooks.on_timeout, self.socket.stream());
                self.reject_signature();
                return Err(NodeSocketError::Handshake(
                    "no signature received before the poll deadline".to_string(),
                ));
            }
            Err(e) => {
                self.reject_signature();
                return Err(NodeSocketError::Handshake(format!(
                    "signature not received: {}",
                    e
                )));
            }
        };

        if received.len() != SIGNATURE.len() {
            self.reject_signature();
            return Err(NodeSocketError::Handshake(format!(
                "truncated signature from {}: {} of {} bytes",
                self.peer_addr,
                received.len(),
                SIGNATURE.len()
            )));
        }

        if received.as_ref() != SIGNATURE.as_slice() {
            self.reject_signature();
            return Err(NodeSocketError::Handshake(format!(
                "signature mismatch from {}: {:?}",
                self.peer_addr,
                String::from_utf8_lossy(&received)
            )));
        }

        self.apply(StateEvent::SignatureAccepted)?;

        if let Err(e) = self.socket.set_keepalive(self.keep_alive) {
            tracing::warn!("Failed to set keep-alive for {}: {}", self.peer_addr, e);
        }

        tracing::debug!("Connection with {} verified", self.peer_addr);
        Ok(())
    }

    fn reject_signature(&mut self) {
        if let Some(next) = self.state.on(StateEvent::SignatureRejected) {
            self.state = next;
        }
        self.socket.shutdown();
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Apply a lifecycle event
    pub fn apply(&mut self, event: StateEvent) -> Result<()> {
        match self.state.on(event) {
            Some(next) => {
                tracing::trace!("{}: {} -> {} ({:?})", self.peer_addr, self.state, next, event);
                self.state = next;
                Ok(())
            }
            None => Err(NodeSocketError::NotPermitted(format!(
                "{:?} is not valid while {}",
                event, self.state
            ))),
        }
    }

    fn expect_state(&self, expected: ConnectionState, operation: &str) -> Result<()> {
        if self.state != expected {
            return Err(NodeSocketError::NotPermitted(format!(
                "{} requires a {} connection, currently {}",
                operation, expected, self.state
            )));
        }
        Ok(())
    }

    /// Close the socket and return to Disconnected
    pub fn close(&mut self) {
        self.socket.shutdown();
        self.state = ConnectionState::Disconnected;
        tracing::debug!("Connection with {} closed", self.peer_addr);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// One poll-then-receive; `None` means no data this round (OnTimeout fired)
    pub fn poll_read(&mut self, max_bytes: Option<usize>, hooks: &mut Hooks) -> Result<Option<Bytes>> {
        let read = self.socket.receive(max_bytes, Wait::Poll);
        self.finish_read(read, hooks)
    }

    /// Block until one control byte arrives, with no deadline
    pub fn read_control_byte(&mut self) -> Result<u8> {
        let read = self.socket.receive(Some(1), Wait::Indefinite);
        match self.map_eof(read)? {
            Some(bytes) => Ok(bytes[0]),
            // An indefinite read only returns without data on a spurious wakeup
            None => Err(NodeSocketError::Timeout("control byte".to_string())),
        }
    }

    /// Read exactly `len` bytes under the poll deadline
    pub fn read_exact(&mut self, len: usize, what: &str, hooks: &mut Hooks) -> Result<Bytes> {
        let read = self.socket.receive_exact(len, Wait::Poll);
        self.finish_read(read, hooks)?
            .ok_or_else(|| NodeSocketError::Timeout(what.to_string()))
    }

    /// Read the rest of a call frame once its control byte has been consumed
    pub fn read_call_frame(&mut self, hooks: &mut Hooks) -> Result<CallFrame> {
        let payload = self.read_call_payload(hooks)?;
        decode_call_payload(&payload)
    }

    /// Read and drop the rest of a call frame, keeping the stream framed
    pub fn discard_call_frame(&mut self, hooks: &mut Hooks) -> Result<()> {
        let payload = self.read_call_payload(hooks)?;
        tracing::trace!("Discarded {} byte call payload from {}", payload.len(), self.peer_addr);
        Ok(())
    }

    fn read_call_payload(&mut self, hooks: &mut Hooks) -> Result<Bytes> {
        let len_bytes = self.read_exact(4, "call frame length", hooks)?;
        let payload_len = parse_payload_len([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])?;
        self.read_exact(payload_len, "call frame payload", hooks)
    }

    /// Read one response frame
    pub fn read_response_frame(&mut self, hooks: &mut Hooks) -> Result<ResponseFrame> {
        let code_byte = self.read_exact(1, "response", hooks)?[0];

        match ResponseCode::from_byte(code_byte) {
            Some(ResponseCode::Okay) => {}
            Some(code) => return Ok(ResponseFrame::code(code)),
            None => return Err(NodeSocketError::UnknownResponse(code_byte)),
        }

        let header = self.read_exact(SCALAR_HEADER_SIZE, "response value header", hooks)?;
        let value_len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
        if value_len > MAX_PAYLOAD_SIZE {
            return Err(NodeSocketError::Protocol(format!(
                "Response value too large: {} bytes (max {})",
                value_len, MAX_PAYLOAD_SIZE
            )));
        }

        let mut frame = BytesMut::with_capacity(1 + SCALAR_HEADER_SIZE + value_len as usize);
        frame.extend_from_slice(&[code_byte]);
        frame.extend_from_slice(&header);
        if value_len > 0 {
            let value = self.read_exact(value_len as usize, "response value", hooks)?;
            frame.extend_from_slice(&value);
        }

        decode_response_frame(&frame)
    }

    fn finish_read(
        &mut self,
        read: std::io::Result<Option<Bytes>>,
        hooks: &mut Hooks,
    ) -> Result<Option<Bytes>> {
        let read = self.map_eof(read)?;
        if read.is_none() {
            tracing::debug!("Poll deadline elapsed waiting on {}", self.peer_addr);
            fire(&mut hooks.on_timeout, self.socket.stream());
        }
        Ok(read)
    }

    fn map_eof(&mut self, read: std::io::Result<Option<Bytes>>) -> Result<Option<Bytes>> {
        match read {
            Ok(bytes) => Ok(bytes),
            Err(e) if is_disconnect(&e) => {
                tracing::debug!("Peer {} disconnected: {}", self.peer_addr, e);
                self.close();
                Err(NodeSocketError::Disconnected)
            }
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write raw bytes
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        match self.socket.send(bytes) {
            Ok(()) => Ok(()),
            Err(e) if is_disconnect(&e) => {
                tracing::debug!("Peer {} gone before write: {}", self.peer_addr, e);
                self.close();
                Err(NodeSocketError::Disconnected)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a single control byte
    pub fn write_control(&mut self, code: ExecutionCode) -> Result<()> {
        self.write_all(&[code as u8])
    }

    /// Write a bare response code
    pub fn write_response_code(&mut self, code: ResponseCode) -> Result<()> {
        self.write_all(&[code as u8])
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The underlying stream, as handed to hooks
    pub fn stream(&self) -> &TcpStream {
        self.socket.stream()
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(e: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        e.kind(),
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}
