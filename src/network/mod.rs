//! Network Module
//!
//! TCP transport for nodes.
//!
//! ## Architecture
//! - `PollSocket`: blocking reads with a poll deadline
//! - `Connection`: handshake and framed I/O over one socket
//! - `Server`: accept loop handing verified nodes to session threads

mod connection;
mod hooks;
mod resolve;
mod server;
mod socket;
mod state;

pub use connection::Connection;
pub use hooks::{Hook, Hooks};
pub use resolve::{resolve, select_address, AddressFamily};
pub use server::{Server, ShutdownHandle};
pub use socket::{PollSocket, Wait};
pub use state::{ConnectionState, StateEvent};

pub(crate) use hooks::fire;
