// crates/mockgate-core/tests/model_serde.rs
// ============================================================================
// Module: Model Serialization Tests
// Description: JSON shape tests for actions, bodies, and delays.
// Purpose: Keep the persisted expectation format stable.
// ============================================================================

//! JSON wire-shape tests for the Mockgate domain model.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::time::Duration;

use mockgate_core::Action;
use mockgate_core::ActionKind;
use mockgate_core::Body;
use mockgate_core::Delay;
use mockgate_core::Expectation;
use mockgate_core::HttpForward;
use mockgate_core::Scheme;
use mockgate_core::TimeUnit;
use serde_json::json;

/// Tests a forward action parses from its persisted JSON shape.
#[test]
fn forward_action_parses_from_json() {
    let value = json!({
        "id": "exp-1",
        "action": {
            "httpForward": {
                "host": "127.0.0.1",
                "port": 8080,
                "scheme": "HTTPS",
                "delay": { "timeUnit": "SECONDS", "value": 2 }
            }
        }
    });
    let expectation: Expectation = serde_json::from_value(value).unwrap();
    let action = expectation.action.unwrap();

    assert_eq!(action.kind(), ActionKind::Forward);
    assert_eq!(action.delay(), Some(Delay::seconds(2)));
    let Action::Forward(forward) = action else {
        panic!("expected forward action");
    };
    assert_eq!(forward.scheme, Scheme::Https);
    assert_eq!(forward.port_or_default(), 8080);
}

/// Tests a forward without a port falls back to the scheme port.
#[test]
fn forward_port_defaults_to_scheme() {
    let forward = HttpForward {
        port: None,
        ..HttpForward::new("example.com", 1, Scheme::Https)
    };
    assert_eq!(forward.port_or_default(), 443);
}

/// Tests static responses never report a scheduling delay.
#[test]
fn response_delay_is_not_a_scheduling_delay() {
    let value = json!({
        "httpResponse": { "statusCode": 201, "delay": { "timeUnit": "MILLISECONDS", "value": 50 } }
    });
    let action: Action = serde_json::from_value(value).unwrap();
    assert_eq!(action.delay(), None);
    let Action::Response(response) = action else {
        panic!("expected response action");
    };
    assert_eq!(response.delay, Some(Delay::millis(50)));
}

/// Tests binary bodies serialize as base64.
#[test]
fn binary_body_serializes_as_base64() {
    let value = serde_json::to_value(Body::binary(vec![0xde, 0xad])).unwrap();
    assert_eq!(value, json!({ "type": "BINARY", "base64Bytes": "3q0=" }));
    let parsed: Body = serde_json::from_value(value).unwrap();
    assert_eq!(parsed.as_bytes(), &[0xde, 0xad]);
}

/// Tests textual content types produce string bodies.
#[test]
fn from_bytes_detects_text() {
    let body = Body::from_bytes(b"{}".to_vec(), Some("application/json; charset=utf-8".to_string()));
    assert!(matches!(body, Body::String { .. }));
    let body = Body::from_bytes(vec![0xff, 0xfe], Some("text/plain".to_string()));
    assert!(matches!(body, Body::Binary { .. }));
}

/// Tests large delay units saturate instead of overflowing.
#[test]
fn delay_conversion_saturates() {
    assert_eq!(Delay::new(TimeUnit::Minutes, 2).to_duration(), Duration::from_secs(120));
    assert_eq!(
        Delay::new(TimeUnit::Days, u64::MAX).to_duration(),
        Duration::from_secs(u64::MAX)
    );
}
