//! Function handler definitions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::protocol::{FromWire, WireValue};

/// Outcome of a handler: a value, nothing (NoResult) or a failure (NodeError)
pub type HandlerResult = std::result::Result<Option<WireValue>, HandlerError>;

/// A locally invocable function
pub type Handler = Arc<dyn Fn(&Invocation<'_>) -> HandlerResult + Send + Sync>;

/// Failures a handler can report; all surface to the caller as NodeError
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler produced something the wire cannot carry
    #[error("unsupported result type: {0}")]
    UnsupportedType(String),

    /// Missing or mistyped argument
    #[error("bad argument {index}: {reason}")]
    BadArgument { index: usize, reason: String },

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        HandlerError::UnsupportedType(type_name.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}

/// Stop flag for a node's listen loop
///
/// Clones share the flag, so a handler (or another thread) can end the
/// loop once the current command has been answered.
#[derive(Debug, Clone, Default)]
pub struct ListenControl {
    stop: Arc<AtomicBool>,
}

impl ListenControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the listen loop to return after the current command
    pub fn stop_listening(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Clear a pending stop so the next listen call runs
    pub fn reset(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }
}

/// One incoming call, as seen by its handler
pub struct Invocation<'a> {
    identifier: &'a str,
    args: &'a [WireValue],
    control: &'a ListenControl,
}

impl<'a> Invocation<'a> {
    pub fn new(identifier: &'a str, args: &'a [WireValue], control: &'a ListenControl) -> Self {
        Self {
            identifier,
            args,
            control,
        }
    }

    /// Identifier the peer called
    pub fn identifier(&self) -> &str {
        self.identifier
    }

    /// All arguments in call order
    pub fn args(&self) -> &[WireValue] {
        self.args
    }

    /// Typed argument at `index`
    pub fn arg<T: FromWire>(&self, index: usize) -> std::result::Result<T, HandlerError> {
        let value = self.args.get(index).cloned().ok_or_else(|| HandlerError::BadArgument {
            index,
            reason: format!("only {} argument(s) supplied", self.args.len()),
        })?;

        T::from_wire(value).map_err(|e| HandlerError::BadArgument {
            index,
            reason: e.to_string(),
        })
    }

    /// End the listen loop once this call has been answered
    pub fn stop_listening(&self) {
        self.control.stop_listening();
    }
}
