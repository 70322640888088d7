// crates/mockgate-dispatch/src/proxy_auth/tests.rs
// ============================================================================
// Module: Proxy Authentication Tests
// Description: Unit tests for credential checks and challenge rendering.
// Purpose: Validate Basic credential matching and realm escaping.
// Dependencies: mockgate-dispatch
// ============================================================================

//! ## Overview
//! Exercises the authenticator against hand-built `Proxy-Authorization` headers.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use mockgate_config::ProxyConfig;
use mockgate_core::HttpRequest;

use super::PROXY_AUTHENTICATE_HEADER;
use super::PROXY_AUTHENTICATION_REQUIRED;
use super::ProxyAuthenticator;
use super::escape_realm;

#[test]
fn accepts_matching_basic_credentials() {
    let auth = ProxyAuthenticator::new("user", "secret", "realm");
    let request = HttpRequest::new().with_header("proxy-authorization", "Basic dXNlcjpzZWNyZXQ=");
    assert!(auth.is_authorized(&request));
}

#[test]
fn rejects_missing_or_wrong_credentials() {
    let auth = ProxyAuthenticator::new("user", "secret", "realm");
    assert!(!auth.is_authorized(&HttpRequest::new()));
    let wrong = HttpRequest::new().with_header("Proxy-Authorization", "Basic d3Jvbmc6d3Jvbmc=");
    assert!(!auth.is_authorized(&wrong));
}

#[test]
fn challenge_carries_quoted_realm() {
    let auth = ProxyAuthenticator::new("user", "secret", "Mockgate HTTP Proxy");
    let challenge = auth.challenge();
    assert_eq!(challenge.status(), PROXY_AUTHENTICATION_REQUIRED);
    assert_eq!(
        challenge.headers.first(PROXY_AUTHENTICATE_HEADER),
        Some("Basic realm=\"Mockgate HTTP Proxy\", charset=\"UTF-8\"")
    );
}

#[test]
fn realm_quotes_and_backslashes_are_escaped() {
    assert_eq!(escape_realm(r#"a "quoted" \ realm"#), r#"a \"quoted\" \\ realm"#);
    assert_eq!(escape_realm("line\nbreak"), "line\\nbreak");
    assert_eq!(escape_realm("bell\u{7}"), "bell\\u0007");
}

#[test]
fn from_config_requires_both_credentials() {
    let mut config = ProxyConfig::default();
    assert!(ProxyAuthenticator::from_config(&config).is_none());
    config.authentication_username = Some("user".to_string());
    assert!(ProxyAuthenticator::from_config(&config).is_none());
    config.authentication_password = Some("secret".to_string());
    assert!(ProxyAuthenticator::from_config(&config).is_some());
}
