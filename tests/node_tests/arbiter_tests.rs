//! Arbiter Tests
//!
//! Tests for the master/slave decision table.

use nodesocket::node::{Arbiter, ListenAction, Role};
use nodesocket::protocol::ExecutionCode;

const REQUEST_MASTER: u8 = ExecutionCode::RequestMaster as u8;
const REQUEST_SLAVE: u8 = ExecutionCode::RequestSlave as u8;
const EXEC_FUNCTION: u8 = ExecutionCode::ExecFunction as u8;

fn master(deny_master_request: bool) -> Arbiter {
    let mut arbiter = Arbiter::new(deny_master_request);
    arbiter.set_role(Role::Master);
    arbiter
}

// =============================================================================
// Master Tests
// =============================================================================

#[test]
fn test_master_yields_on_request() {
    assert_eq!(master(false).decide(REQUEST_MASTER), ListenAction::Yield);
}

#[test]
fn test_master_retains_when_denying() {
    assert_eq!(master(true).decide(REQUEST_MASTER), ListenAction::Retain);
}

#[test]
fn test_master_ends_cycle_on_request_slave() {
    assert_eq!(master(false).decide(REQUEST_SLAVE), ListenAction::EndCycle);
}

#[test]
fn test_master_rejects_calls() {
    assert_eq!(
        master(false).decide(EXEC_FUNCTION),
        ListenAction::RejectNotAllowed { drain: true }
    );
    assert_eq!(
        master(true).decide(EXEC_FUNCTION),
        ListenAction::RejectNotAllowed { drain: true }
    );
}

#[test]
fn test_master_rejects_invalid_bytes() {
    for byte in [ExecutionCode::MAX, 0x7F, 0xFF] {
        assert_eq!(
            master(false).decide(byte),
            ListenAction::RejectNotAllowed { drain: false }
        );
    }
}

// =============================================================================
// Slave Tests
// =============================================================================

#[test]
fn test_slave_dispatches_calls() {
    assert_eq!(Arbiter::new(false).decide(EXEC_FUNCTION), ListenAction::Dispatch);
}

#[test]
fn test_slave_claims_master_on_request_slave() {
    assert_eq!(Arbiter::new(false).decide(REQUEST_SLAVE), ListenAction::ClaimMaster);
}

#[test]
fn test_slave_ignores_request_master() {
    assert_eq!(Arbiter::new(true).decide(REQUEST_MASTER), ListenAction::Ignore);
}

#[test]
fn test_slave_rejects_invalid_bytes() {
    for byte in [ExecutionCode::MAX, 0x10, 0xFF] {
        assert_eq!(Arbiter::new(false).decide(byte), ListenAction::RejectInvalid);
    }
}

// =============================================================================
// Loop Continuation Tests
// =============================================================================

#[test]
fn test_actions_that_end_the_cycle() {
    assert!(!ListenAction::EndCycle.continues());
    assert!(!ListenAction::ClaimMaster.continues());
    assert!(!ListenAction::RejectNotAllowed { drain: true }.continues());
    assert!(!ListenAction::RejectNotAllowed { drain: false }.continues());
}

#[test]
fn test_actions_that_keep_listening() {
    for action in [
        ListenAction::Yield,
        ListenAction::Retain,
        ListenAction::Dispatch,
        ListenAction::Ignore,
        ListenAction::RejectInvalid,
    ] {
        assert!(action.continues(), "{:?} should keep listening", action);
    }
}

#[test]
fn test_role_defaults_to_slave() {
    let arbiter = Arbiter::new(false);
    assert_eq!(arbiter.role(), Role::Slave);
    assert!(!arbiter.is_master());
    assert_eq!(Role::default(), Role::Slave);
    assert_eq!(Role::Master.to_string(), "master");
}

#[test]
fn test_decide_does_not_change_role() {
    let arbiter = master(false);
    arbiter.decide(REQUEST_MASTER);
    assert!(arbiter.is_master());
}
