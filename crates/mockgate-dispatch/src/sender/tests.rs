// crates/mockgate-dispatch/src/sender/tests.rs
// ============================================================================
// Module: Request Sender Tests
// Description: Unit tests for target resolution and error classification.
// Purpose: Validate how outbound targets are chosen and failures are mapped.
// Dependencies: mockgate-dispatch
// ============================================================================

//! ## Overview
//! Covers the pieces of the sender that do not need a live upstream.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::net::SocketAddr;

use mockgate_core::HttpRequest;
use mockgate_core::Scheme;
use mockgate_core::SocketAddress;

use super::Target;
use super::build_request;
use super::classify_io;
use super::split_host_port;
use crate::error::ForwardError;

// ============================================================================
// SECTION: Host Parsing
// ============================================================================

#[test]
fn split_host_port_reads_explicit_port() {
    assert_eq!(split_host_port("example.com:8080", 80), ("example.com".to_string(), 8080));
}

#[test]
fn split_host_port_uses_default_port() {
    assert_eq!(split_host_port("example.com", 443), ("example.com".to_string(), 443));
}

#[test]
fn split_host_port_handles_bracketed_ipv6() {
    assert_eq!(split_host_port("[::1]:9000", 80), ("::1".to_string(), 9000));
    assert_eq!(split_host_port("[::1]", 80), ("::1".to_string(), 80));
}

#[test]
fn split_host_port_keeps_bad_port_in_host() {
    assert_eq!(split_host_port("example.com:http", 80), ("example.com:http".to_string(), 80));
}

// ============================================================================
// SECTION: Target Resolution
// ============================================================================

#[test]
fn target_prefers_remote_address() {
    let remote: SocketAddr = "127.0.0.1:7000".parse().unwrap();
    let request = HttpRequest::new()
        .with_header("Host", "upstream.test:9000")
        .with_socket_address(SocketAddress::new("declared.test", 8000, Scheme::Http));
    let target = Target::resolve(&request, Some(remote)).unwrap();
    assert_eq!(target.address, Some(remote));
    assert_eq!(target.host, "declared.test");
    assert_eq!(target.port, 7000);
}

#[test]
fn target_names_declared_host_over_inbound_host_header() {
    let remote: SocketAddr = "127.0.0.1:8443".parse().unwrap();
    let request = HttpRequest::new()
        .with_header("Host", "mock.local:1080")
        .with_secure(true)
        .with_socket_address(SocketAddress::new("localhost", 8443, Scheme::Https));
    let target = Target::resolve(&request, Some(remote)).unwrap();
    assert_eq!(target.host, "localhost");
    assert_eq!(target.address, Some(remote));
}

#[test]
fn target_with_remote_address_uses_host_header_when_nothing_is_declared() {
    let remote: SocketAddr = "127.0.0.1:7000".parse().unwrap();
    let request = HttpRequest::new().with_header("Host", "upstream.test:9000");
    let target = Target::resolve(&request, Some(remote)).unwrap();
    assert_eq!(target.host, "upstream.test");
    assert_eq!(target.port, 7000);
}

#[test]
fn target_falls_back_to_declared_address() {
    let request = HttpRequest::new()
        .with_header("Host", "upstream.test:9000")
        .with_socket_address(SocketAddress::new("declared.test", 8000, Scheme::Http));
    let target = Target::resolve(&request, None).unwrap();
    assert_eq!(target.host, "declared.test");
    assert_eq!(target.port, 8000);
    assert_eq!(target.address, None);
}

#[test]
fn target_uses_host_header_with_scheme_port() {
    let request = HttpRequest::new().with_header("Host", "secure.test").with_secure(true);
    let target = Target::resolve(&request, None).unwrap();
    assert_eq!(target.host, "secure.test");
    assert_eq!(target.port, 443);
    assert_eq!(target.authority(), "secure.test:443");
}

#[test]
fn target_without_any_address_is_a_resolve_error() {
    let err = Target::resolve(&HttpRequest::new(), None).unwrap_err();
    assert!(matches!(err, ForwardError::Resolve(_)));
    assert!(err.is_connection_failure());
}

// ============================================================================
// SECTION: Request Encoding
// ============================================================================

#[test]
fn build_request_adds_host_and_cookie_and_drops_length() {
    let remote: SocketAddr = "127.0.0.1:7000".parse().unwrap();
    let request = HttpRequest::new()
        .with_method("POST")
        .with_path("/items")
        .with_query("page=2")
        .with_header("Content-Length", "999")
        .with_cookie("session", "abc")
        .with_cookie("theme", "dark");
    let target = Target::resolve(&request, Some(remote)).unwrap();
    let built = build_request(&request, &target).unwrap();
    assert_eq!(*built.method(), hyper::Method::POST);
    assert_eq!(built.uri(), "/items?page=2");
    assert_eq!(built.headers().get("host").unwrap(), "127.0.0.1:7000");
    assert_eq!(built.headers().get("cookie").unwrap(), "session=abc; theme=dark");
    assert!(built.headers().get("content-length").is_none());
}

#[test]
fn build_request_rejects_invalid_method() {
    let remote: SocketAddr = "127.0.0.1:7000".parse().unwrap();
    let request = HttpRequest::new().with_method("BAD METHOD");
    let target = Target::resolve(&request, Some(remote)).unwrap();
    let err = build_request(&request, &target).unwrap_err();
    assert!(matches!(err, ForwardError::InvalidRequest(_)));
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

#[test]
fn refused_connections_are_connection_failures() {
    let err = classify_io(&io::Error::from(io::ErrorKind::ConnectionRefused), "127.0.0.1:1");
    assert!(err.is_connection_failure());
}

#[test]
fn resets_are_connection_closed() {
    let err = classify_io(&io::Error::from(io::ErrorKind::ConnectionReset), "127.0.0.1:1");
    assert!(err.is_connection_closed());
}

#[test]
fn other_io_errors_are_socket_communication() {
    let err = classify_io(&io::Error::from(io::ErrorKind::InvalidData), "127.0.0.1:1");
    assert!(err.is_socket_communication());
}
