//! Connection lifecycle
//!
//! ```text
//!  Disconnected ──connect──▶ Connected ──signature ok──▶ Verified ◀──┐
//!        ▲                       │                          │        │
//!        └───signature bad───────┘                call begins     response
//!                                                           ▼        │
//!                                                      Processing ───┘
//! ```
//!
//! `Close` returns any state to Disconnected; a fresh connect is the only
//! way back to Connected.

/// Lifecycle state of a node's connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ConnectionState {
    #[default]
    Disconnected = 0x00,
    Connected = 0x01,
    Verified = 0x02,
    Processing = 0x03,
}

/// Events that drive the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// TCP connect (or accept) succeeded
    TransportUp,
    /// Remote signature matched ours
    SignatureAccepted,
    /// Remote signature mismatched, was truncated or never arrived
    SignatureRejected,
    /// A locally initiated call was written
    CallStarted,
    /// The response to that call was received
    CallFinished,
    /// Socket closed by either side
    Close,
}

impl ConnectionState {
    /// Apply `event`, returning the next state or `None` if illegal here
    pub fn on(self, event: StateEvent) -> Option<ConnectionState> {
        use ConnectionState::*;
        use StateEvent::*;

        match (self, event) {
            (_, Close) => Some(Disconnected),
            // A fresh connect may start from any state
            (_, TransportUp) => Some(Connected),
            (Connected, SignatureAccepted) => Some(Verified),
            (Connected, SignatureRejected) => Some(Disconnected),
            (Verified, CallStarted) => Some(Processing),
            (Processing, CallFinished) => Some(Verified),
            _ => None,
        }
    }

    /// Whether the handshake has completed on this connection
    pub fn is_verified(self) -> bool {
        matches!(self, ConnectionState::Verified | ConnectionState::Processing)
    }

    /// Whether a transport is attached
    pub fn is_connected(self) -> bool {
        self != ConnectionState::Disconnected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Verified => "verified",
            ConnectionState::Processing => "processing",
        };
        f.write_str(name)
    }
}
