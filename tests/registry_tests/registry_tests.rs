//! Registry Tests
//!
//! Tests for function definition and call dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use nodesocket::protocol::{CallFrame, ResponseCode, ResponseFrame, WireValue, MAX_PAYLOAD_SIZE};
use nodesocket::registry::{HandlerError, Invocation, ListenControl, Registry};

fn call(identifier: &str, args: Vec<WireValue>) -> CallFrame {
    CallFrame {
        identifier: identifier.to_string(),
        args,
    }
}

fn double_registry() -> Registry {
    let registry = Registry::new();
    registry.define("double", |call: &Invocation<'_>| {
        let value: i32 = call.arg(0)?;
        Ok(Some(WireValue::Int(value * 2)))
    });
    registry
}

// =============================================================================
// Definition Tests
// =============================================================================

#[test]
fn test_define_and_lookup() {
    let registry = double_registry();

    assert!(registry.contains("double"));
    assert!(!registry.contains("triple"));
    assert_eq!(registry.len(), 1);
    assert!(registry.get("double").is_some());
}

#[test]
fn test_empty_registry() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert!(registry.identifiers().is_empty());
}

#[test]
fn test_redefinition_replaces_handler() {
    let registry = Registry::new();
    registry.define("f", |_| Ok(Some(WireValue::Int(1))));
    registry.define("f", |_| Ok(Some(WireValue::Int(2))));

    assert_eq!(registry.len(), 1);

    let response = registry.dispatch(&call("f", vec![]), &ListenControl::new());
    assert_eq!(response, ResponseFrame::okay(WireValue::Int(2)));
}

#[test]
fn test_undefine() {
    let registry = double_registry();

    assert!(registry.undefine("double"));
    assert!(!registry.undefine("double"));
    assert!(registry.is_empty());
}

#[test]
fn test_identifiers_sorted() {
    let registry = Registry::new();
    for name in ["zeta", "alpha", "mid"] {
        registry.define(name, |_| Ok(None));
    }

    assert_eq!(registry.identifiers(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_clones_share_functions() {
    let registry = Registry::new();
    let clone = registry.clone();

    clone.define("shared", |_| Ok(None));
    assert!(registry.contains("shared"));
}

#[test]
fn test_define_from_many_threads() {
    let registry = Registry::new();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                registry.define(format!("fn_{}", i), move |_| Ok(Some(WireValue::Int(i))));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.len(), 8);
    let response = registry.dispatch(&call("fn_5", vec![]), &ListenControl::new());
    assert_eq!(response, ResponseFrame::okay(WireValue::Int(5)));
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_dispatch_okay() {
    let registry = double_registry();
    let response = registry.dispatch(&call("double", vec![WireValue::Int(3)]), &ListenControl::new());

    assert_eq!(response.code, ResponseCode::Okay);
    assert_eq!(response.value, Some(WireValue::Int(6)));
}

#[test]
fn test_dispatch_oversized_result_is_node_error() {
    let registry = Registry::new();
    registry.define("huge", |_| {
        Ok(Some(WireValue::String("x".repeat(MAX_PAYLOAD_SIZE as usize + 1))))
    });

    let response = registry.dispatch(&call("huge", vec![]), &ListenControl::new());
    assert_eq!(response, ResponseFrame::code(ResponseCode::NodeError));
}

#[test]
fn test_dispatch_undefined_function() {
    let registry = double_registry();
    let response = registry.dispatch(&call("missing", vec![]), &ListenControl::new());

    assert_eq!(response, ResponseFrame::code(ResponseCode::InvalidFunction));
}

#[test]
fn test_dispatch_no_result() {
    let registry = Registry::new();
    registry.define("ping", |_| Ok(None));

    let response = registry.dispatch(&call("ping", vec![]), &ListenControl::new());
    assert_eq!(response, ResponseFrame::no_result());
}

#[test]
fn test_dispatch_handler_failure_is_node_error() {
    let registry = Registry::new();
    registry.define("broken", |_| Err(HandlerError::failed("boom")));
    registry.define("odd_type", |_| Err(HandlerError::unsupported("Vec<u64>")));

    for identifier in ["broken", "odd_type"] {
        let response = registry.dispatch(&call(identifier, vec![]), &ListenControl::new());
        assert_eq!(response, ResponseFrame::code(ResponseCode::NodeError));
    }
}

#[test]
fn test_dispatch_bad_argument_is_node_error() {
    let registry = double_registry();
    let control = ListenControl::new();

    // Missing argument
    let response = registry.dispatch(&call("double", vec![]), &control);
    assert_eq!(response.code, ResponseCode::NodeError);

    // Wrong argument type
    let response = registry.dispatch(&call("double", vec![WireValue::from("3")]), &control);
    assert_eq!(response.code, ResponseCode::NodeError);
}

#[test]
fn test_dispatch_passes_identifier_and_args() {
    let registry = Registry::new();
    registry.define("inspect", |call| {
        Ok(Some(WireValue::String(format!(
            "{}:{}",
            call.identifier(),
            call.args().len()
        ))))
    });

    let args = vec![WireValue::Boolean(true), WireValue::UByte(1)];
    let response = registry.dispatch(&call("inspect", args), &ListenControl::new());
    assert_eq!(response.value, Some(WireValue::from("inspect:2")));
}

#[test]
fn test_handler_runs_once_per_dispatch() {
    let counter = Arc::new(AtomicUsize::new(0));
    let registry = Registry::new();
    let seen = Arc::clone(&counter);
    registry.define("count", move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    });

    let control = ListenControl::new();
    for _ in 0..3 {
        registry.dispatch(&call("count", vec![]), &control);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

// =============================================================================
// Listen Control Tests
// =============================================================================

#[test]
fn test_handler_can_stop_listening() {
    let registry = Registry::new();
    registry.define("stop", |call| {
        call.stop_listening();
        Ok(None)
    });

    let control = ListenControl::new();
    assert!(!control.is_stopped());

    registry.dispatch(&call("stop", vec![]), &control);
    assert!(control.is_stopped());

    control.reset();
    assert!(!control.is_stopped());
}

#[test]
fn test_listen_control_clones_share_flag() {
    let control = ListenControl::new();
    let other = control.clone();

    other.stop_listening();
    assert!(control.is_stopped());
}

#[test]
fn test_invocation_typed_args() {
    let control = ListenControl::new();
    let args = vec![WireValue::Int(7), WireValue::from("seven")];
    let invocation = Invocation::new("f", &args, &control);

    assert_eq!(invocation.arg::<i32>(0).unwrap(), 7);
    assert_eq!(invocation.arg::<String>(1).unwrap(), "seven");
    assert!(matches!(
        invocation.arg::<i32>(1),
        Err(HandlerError::BadArgument { index: 1, .. })
    ));
    assert!(matches!(
        invocation.arg::<i32>(5),
        Err(HandlerError::BadArgument { index: 5, .. })
    ));
}
