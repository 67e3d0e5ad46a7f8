//! Poll-then-receive socket
//!
//! A read waits up to the poll deadline (or forever) for the stream to
//! become readable, then performs exactly one receive of whatever is
//! available, capped at the configured maximum. A deadline that passes
//! without data yields `Ok(None)`, not an error.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::config::Config;

/// How long a receive may block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Up to the configured poll deadline
    Poll,
    /// Until data arrives or the peer closes
    Indefinite,
}

/// Owned TCP stream with poll-style reads
pub struct PollSocket {
    stream: TcpStream,

    /// Deadline used for `Wait::Poll`
    poll_timeout: Option<Duration>,

    /// Cap on a single receive
    max_read_size: usize,

    /// Read timeout currently applied to the stream, to skip redundant syscalls
    applied_timeout: Option<Option<Duration>>,
}

impl PollSocket {
    /// Connect to `addr` and apply socket options from `config`
    pub fn connect(addr: SocketAddr, config: &Config) -> io::Result<Self> {
        let stream = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        Self::from_stream(stream, config)
    }

    /// Wrap an established stream and apply socket options from `config`
    pub fn from_stream(stream: TcpStream, config: &Config) -> io::Result<Self> {
        stream.set_nonblocking(false)?;
        stream.set_nodelay(config.nodelay)?;
        stream.set_write_timeout(config.write_timeout())?;

        Ok(Self {
            stream,
            poll_timeout: config.poll_timeout(),
            max_read_size: config.max_read_size,
            applied_timeout: None,
        })
    }

    /// Receive whatever is available, at most `max_bytes` (or the configured cap)
    ///
    /// Returns `Ok(None)` when the deadline passes with nothing to read and
    /// `UnexpectedEof` when the peer has closed the stream.
    pub fn receive(&mut self, max_bytes: Option<usize>, wait: Wait) -> io::Result<Option<Bytes>> {
        let deadline = match wait {
            Wait::Poll => self.poll_timeout,
            Wait::Indefinite => None,
        };
        self.apply_read_timeout(deadline)?;

        let cap = max_bytes
            .map(|max| max.min(self.max_read_size))
            .unwrap_or(self.max_read_size)
            .max(1);
        let mut buffer = vec![0u8; cap];

        loop {
            match self.stream.read(&mut buffer) {
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "peer closed the connection",
                    ))
                }
                Ok(n) => {
                    buffer.truncate(n);
                    return Ok(Some(Bytes::from(buffer)));
                }
                // Unix reports an elapsed read timeout as WouldBlock, Windows as TimedOut
                Err(ref e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    return Ok(None)
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Receive exactly `len` bytes, one polled receive at a time
    ///
    /// The deadline applies to each receive. `Ok(None)` if any of them
    /// times out; bytes gathered so far are discarded.
    pub fn receive_exact(&mut self, len: usize, wait: Wait) -> io::Result<Option<Bytes>> {
        let mut collected = BytesMut::with_capacity(len);

        while collected.len() < len {
            match self.receive(Some(len - collected.len()), wait)? {
                Some(chunk) => collected.extend_from_slice(&chunk),
                None => return Ok(None),
            }
        }

        Ok(Some(collected.freeze()))
    }

    /// Write the whole buffer and flush
    pub fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    /// Toggle SO_KEEPALIVE
    pub fn set_keepalive(&self, enabled: bool) -> io::Result<()> {
        socket2::SockRef::from(&self.stream).set_keepalive(enabled)
    }

    /// Shut down both halves, ignoring a socket that is already gone
    pub fn shutdown(&self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::trace!("Socket shutdown: {}", e);
        }
    }

    /// The underlying stream
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    fn apply_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        if self.applied_timeout != Some(timeout) {
            self.stream.set_read_timeout(timeout)?;
            self.applied_timeout = Some(timeout);
        }
        Ok(())
    }
}
