//! Lifecycle callbacks for the embedding application
//!
//! Each hook runs synchronously on the node's thread at its transition
//! point and receives the underlying stream.

use std::net::TcpStream;

/// A lifecycle callback
pub type Hook = Box<dyn FnMut(&TcpStream) + Send>;

/// Optional callbacks fired by a node
#[derive(Default)]
pub struct Hooks {
    /// After the TCP connection is established
    pub on_connect: Option<Hook>,

    /// After both signatures matched
    pub on_verified: Option<Hook>,

    /// After this node claimed the master role
    pub on_master: Option<Hook>,

    /// When a polled read hit its deadline without data
    pub on_timeout: Option<Hook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(mut self, hook: impl FnMut(&TcpStream) + Send + 'static) -> Self {
        self.on_connect = Some(Box::new(hook));
        self
    }

    pub fn on_verified(mut self, hook: impl FnMut(&TcpStream) + Send + 'static) -> Self {
        self.on_verified = Some(Box::new(hook));
        self
    }

    pub fn on_master(mut self, hook: impl FnMut(&TcpStream) + Send + 'static) -> Self {
        self.on_master = Some(Box::new(hook));
        self
    }

    pub fn on_timeout(mut self, hook: impl FnMut(&TcpStream) + Send + 'static) -> Self {
        self.on_timeout = Some(Box::new(hook));
        self
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_verified", &self.on_verified.is_some())
            .field("on_master", &self.on_master.is_some())
            .field("on_timeout", &self.on_timeout.is_some())
            .finish()
    }
}

/// Fire `hook` if set
pub(crate) fn fire(hook: &mut Option<Hook>, stream: &TcpStream) {
    if let Some(hook) = hook.as_mut() {
        hook(stream);
    }
}
