//! Error types for NodeSocket
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::protocol::{DataType, ResponseCode};

/// Result type alias using NodeSocketError
pub type Result<T> = std::result::Result<T, NodeSocketError>;

/// Unified error type for NodeSocket operations
#[derive(Debug, Error)]
pub enum NodeSocketError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Address resolution failed: {0}")]
    Resolve(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Connection closed by peer")]
    Disconnected,

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    // -------------------------------------------------------------------------
    // Handshake Errors
    // -------------------------------------------------------------------------
    #[error("Handshake failed: {0}")]
    Handshake(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown response received from the connected node: 0x{0:02x}")]
    UnknownResponse(u8),

    #[error("Result type mismatch: expected {expected}, got {actual:?}")]
    TypeMismatch {
        expected: &'static str,
        actual: DataType,
    },

    // -------------------------------------------------------------------------
    // Execution Errors (reported by the peer)
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Remote(ResponseCode),

    // -------------------------------------------------------------------------
    // Local Precondition Errors
    // -------------------------------------------------------------------------
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NodeSocketError {
    /// Response code carried by a peer-reported failure
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            NodeSocketError::Remote(code) => Some(*code),
            _ => None,
        }
    }

    /// Whether the byte stream can no longer be trusted to be framed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            NodeSocketError::Io(_)
                | NodeSocketError::Disconnected
                | NodeSocketError::Timeout(_)
                | NodeSocketError::Protocol(_)
                | NodeSocketError::UnknownResponse(_)
        )
    }
}
