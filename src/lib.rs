//! # NodeSocket
//!
//! Symmetric remote procedure calls between two TCP peers, with:
//! - A fixed 8-byte signature handshake
//! - A connection state machine (disconnected → connected → verified → processing)
//! - Cooperative master/slave arbitration: only the master issues calls
//! - A little-endian, self-describing binary codec for typed scalars
//! - A registry of named functions the peer may invoke
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Node                               │
//! │     connect · remote_execute · listen · request_master       │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌─────────────┐       ┌──────────────┐        ┌─────────────┐
//! │   Arbiter   │       │  Connection  │        │  Registry   │
//! │(master/slave│       │ (state, I/O, │        │ (functions) │
//! │  decisions) │       │  handshake)  │        │             │
//! └─────────────┘       └──────┬───────┘        └──────┬──────┘
//!                              │                       │
//!                              ▼                       ▼
//!                       ┌──────────────────────────────────┐
//!                       │         Protocol (codec)          │
//!                       │  scalars · call / response frames │
//!                       └──────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use nodesocket::{Config, Node, WireValue};
//!
//! # fn main() -> nodesocket::Result<()> {
//! let addr = "127.0.0.1:8080".parse().unwrap();
//! let mut node = Node::new(addr, Config::default());
//! node.connect()?;
//!
//! let doubled: i32 = node.remote_execute("double", &[WireValue::Int(3)])?;
//! assert_eq!(doubled, 6);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod registry;
pub mod network;
pub mod node;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{NodeSocketError, Result};
pub use config::Config;
pub use network::{AddressFamily, ConnectionState, Hooks, Server};
pub use node::{LinkedFunction, Node, Role};
pub use protocol::{DataType, FromWire, ResponseCode, WireValue};
pub use registry::{HandlerError, HandlerResult, Invocation, Registry};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of NodeSocket
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
