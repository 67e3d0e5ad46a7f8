//! Registry Module
//!
//! Maps identifiers to locally invocable functions.
//!
//! ## Responsibilities
//! - Store handlers by unique identifier (last definition wins)
//! - Run a decoded call frame against the matching handler
//! - Translate the handler outcome into a response frame
//!
//! A `Registry` is a cheap handle over shared state: clones see the same
//! functions, so one registry can serve every connection a server accepts.

mod function;

pub use function::{Handler, HandlerError, HandlerResult, Invocation, ListenControl};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::protocol::{CallFrame, ResponseCode, ResponseFrame, MAX_PAYLOAD_SIZE};

/// Shared table of locally defined functions
#[derive(Clone, Default)]
pub struct Registry {
    functions: Arc<RwLock<HashMap<String, Handler>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `identifier`, replacing any prior entry
    pub fn define<F>(&self, identifier: impl Into<String>, handler: F)
    where
        F: Fn(&Invocation<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        let replaced = self
            .functions
            .write()
            .insert(identifier.clone(), Arc::new(handler))
            .is_some();

        if replaced {
            tracing::debug!("Redefined function '{}'", identifier);
        } else {
            tracing::trace!("Defined function '{}'", identifier);
        }
    }

    /// Remove a function, returning whether it existed
    pub fn undefine(&self, identifier: &str) -> bool {
        self.functions.write().remove(identifier).is_some()
    }

    /// Whether `identifier` is defined
    pub fn contains(&self, identifier: &str) -> bool {
        self.functions.read().contains_key(identifier)
    }

    /// Look up a handler
    pub fn get(&self, identifier: &str) -> Option<Handler> {
        self.functions.read().get(identifier).cloned()
    }

    /// Number of defined functions
    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    /// Whether no functions are defined
    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }

    /// Defined identifiers, sorted
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.functions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Run a call frame and build the response to send back
    ///
    /// - unknown identifier => InvalidFunction
    /// - handler returned a value => Okay + value
    /// - handler returned nothing => NoResult
    /// - handler failed, or its value is too large to send => NodeError
    pub fn dispatch(&self, frame: &CallFrame, control: &ListenControl) -> ResponseFrame {
        // Clone the handler out so the lock is not held while it runs
        let handler = match self.get(&frame.identifier) {
            Some(handler) => handler,
            None => {
                tracing::debug!("Call to undefined function '{}'", frame.identifier);
                return ResponseFrame::code(ResponseCode::InvalidFunction);
            }
        };

        let invocation = Invocation::new(&frame.identifier, &frame.args, control);

        match handler(&invocation) {
            Ok(Some(value)) if value.encoded_len() > MAX_PAYLOAD_SIZE as usize => {
                tracing::warn!(
                    "Function '{}' returned {} bytes, over the {} byte limit",
                    frame.identifier,
                    value.encoded_len(),
                    MAX_PAYLOAD_SIZE
                );
                ResponseFrame::code(ResponseCode::NodeError)
            }
            Ok(Some(value)) => ResponseFrame::okay(value),
            Ok(None) => ResponseFrame::no_result(),
            Err(e) => {
                tracing::warn!("Function '{}' failed: {}", frame.identifier, e);
                ResponseFrame::code(ResponseCode::NodeError)
            }
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.identifiers())
            .finish()
    }
}
