//! Master/slave arbitration
//!
//! Decides what a listening node does with each control byte, given the
//! role it currently holds.
//!
//! | Role   | Byte           | Action                                        |
//! |--------|----------------|-----------------------------------------------|
//! | Master | RequestMaster  | yield (become slave) and keep listening, or   |
//! |        |                | keep the role and keep listening when denying |
//! | Master | RequestSlave   | end the cycle, no reply                       |
//! | Master | ExecFunction   | drain the frame, reply NotAllowed, end cycle  |
//! | Master | anything else  | reply NotAllowed, end cycle                   |
//! | Slave  | ExecFunction   | dispatch and keep listening                   |
//! | Slave  | RequestSlave   | claim master and end the cycle                |
//! | Slave  | RequestMaster  | ignore, keep listening                        |
//! | Slave  | anything else  | reply InvalidExecCode, keep listening         |
//!
//! Arbitration is cooperative: nothing fences a peer that claims the master
//! role while the other side still holds it.

use crate::protocol::ExecutionCode;

/// Role a node holds on its connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Master,
    #[default]
    Slave,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Master => f.write_str("master"),
            Role::Slave => f.write_str("slave"),
        }
    }
}

/// What the listen loop does with one control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenAction {
    /// Hand the master role to the peer and keep listening
    Yield,
    /// Keep the master role despite the peer's request and keep listening
    Retain,
    /// Return from this listen cycle without replying
    EndCycle,
    /// Reply NotAllowed and return; `drain` the call frame first
    RejectNotAllowed { drain: bool },
    /// Read the call frame, run it and reply
    Dispatch,
    /// The peer handed over the master role; claim it and return
    ClaimMaster,
    /// Nothing to do, keep listening
    Ignore,
    /// Reply InvalidExecCode and keep listening
    RejectInvalid,
}

impl ListenAction {
    /// Whether the loop keeps reading after this action
    pub fn continues(self) -> bool {
        matches!(
            self,
            ListenAction::Yield
                | ListenAction::Retain
                | ListenAction::Dispatch
                | ListenAction::Ignore
                | ListenAction::RejectInvalid
        )
    }
}

/// Per-node arbitration state
#[derive(Debug, Clone, Default)]
pub struct Arbiter {
    role: Role,
    deny_master_request: bool,
}

impl Arbiter {
    pub fn new(deny_master_request: bool) -> Self {
        Self {
            role: Role::Slave,
            deny_master_request,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }

    pub fn set_role(&mut self, role: Role) {
        if self.role != role {
            tracing::debug!("Role change: {} -> {}", self.role, role);
        }
        self.role = role;
    }

    /// Decide the action for `byte` under the current role
    ///
    /// Pure: the caller applies any role change the action implies.
    pub fn decide(&self, byte: u8) -> ListenAction {
        let code = ExecutionCode::from_byte(byte);

        match (self.role, code) {
            (Role::Master, Some(ExecutionCode::RequestMaster)) => {
                if self.deny_master_request {
                    ListenAction::Retain
                } else {
                    ListenAction::Yield
                }
            }
            (Role::Master, Some(ExecutionCode::RequestSlave)) => ListenAction::EndCycle,
            (Role::Master, Some(ExecutionCode::ExecFunction)) => {
                ListenAction::RejectNotAllowed { drain: true }
            }
            (Role::Master, None) => ListenAction::RejectNotAllowed { drain: false },
            (Role::Slave, Some(ExecutionCode::ExecFunction)) => ListenAction::Dispatch,
            (Role::Slave, Some(ExecutionCode::RequestSlave)) => ListenAction::ClaimMaster,
            (Role::Slave, Some(ExecutionCode::RequestMaster)) => ListenAction::Ignore,
            (Role::Slave, None) => ListenAction::RejectInvalid,
        }
    }
}
