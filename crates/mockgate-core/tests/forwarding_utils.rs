// crates/mockgate-core/tests/forwarding_utils.rs
// ============================================================================
// Module: Forwarding Utility Tests
// Description: Tests for the hop-by-hop filter, loop tag, and curl rendering.
// Purpose: Pin the header handling applied to every forwarded request.
// ============================================================================

//! Unit tests for forwarding helpers in `mockgate-core`.

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

use std::net::SocketAddr;

use mockgate_core::Body;
use mockgate_core::HopByHopFilter;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;
use mockgate_core::LoopPreventionTag;
use mockgate_core::core::curl::NO_HOST_RENDERING;
use mockgate_core::core::hop_by_hop::HOP_BY_HOP_HEADERS;
use mockgate_core::to_curl;

// ============================================================================
// SECTION: Hop-By-Hop Filter
// ============================================================================

/// Tests every hop-by-hop header is removed regardless of case.
#[test]
fn hop_by_hop_filter_strips_connection_headers() {
    let mut request = HttpRequest::new().with_path("/").with_header("x-test", "abc");
    for name in HOP_BY_HOP_HEADERS {
        request = request.with_header(name.to_ascii_uppercase(), "value");
    }

    let filtered = HopByHopFilter.on_request(&request);

    assert_eq!(filtered.headers.len(), 1);
    assert_eq!(filtered.headers.first("x-test"), Some("abc"));
    assert_eq!(request.headers.len(), HOP_BY_HOP_HEADERS.len() + 1);
}

/// Tests response filtering keeps end-to-end headers.
#[test]
fn hop_by_hop_filter_keeps_end_to_end_response_headers() {
    let response = HttpResponse::ok()
        .with_header("Transfer-Encoding", "chunked")
        .with_header("Content-Type", "text/plain");
    let filtered = HopByHopFilter.on_response(&response);
    assert!(!filtered.headers.contains("transfer-encoding"));
    assert_eq!(filtered.headers.first("content-type"), Some("text/plain"));
}

// ============================================================================
// SECTION: Loop Prevention Tag
// ============================================================================

/// Tests only the exact tag value counts as present.
#[test]
fn loop_tag_requires_exact_value() {
    let tag = LoopPreventionTag::new("x-forwarded-by", "mockgate-1");
    let tagged = HttpRequest::new().with_header("X-Forwarded-By", "mockgate-1");
    let foreign = HttpRequest::new().with_header("x-forwarded-by", "someone-else");

    assert!(tag.is_on_request(&tagged));
    assert!(!tag.is_on_request(&foreign));
}

/// Tests stamping replaces a foreign value and strip removes the header.
#[test]
fn loop_tag_stamp_and_strip() {
    let tag = LoopPreventionTag::new("x-forwarded-by", "mockgate-1");
    let mut response = HttpResponse::ok().with_header("x-forwarded-by", "other");

    tag.stamp(&mut response.headers);
    assert!(tag.is_on_response(&response));
    assert_eq!(response.headers.get("x-forwarded-by").map(|h| h.values.len()), Some(1));

    tag.strip(&mut response.headers);
    assert!(!response.headers.contains("x-forwarded-by"));
}

/// Tests generated tags are unique per call.
#[test]
fn generated_loop_tags_differ() {
    let first = LoopPreventionTag::generate();
    let second = LoopPreventionTag::generate();
    assert_eq!(first.name(), second.name());
    assert_ne!(first.value(), second.value());
}

// ============================================================================
// SECTION: Curl Rendering
// ============================================================================

/// Tests a full request renders method, headers, cookies, and body.
#[test]
fn curl_renders_full_request() {
    let request = HttpRequest::new()
        .with_method("POST")
        .with_path("/orders")
        .with_query("id=1")
        .with_header("Host", "api.example.com:8080")
        .with_header("x-note", "it's")
        .with_cookie("session", "abc")
        .with_body(Body::string("{\"a\":1}"));

    let curl = to_curl(&request, None);

    assert_eq!(
        curl,
        "curl -v 'http://api.example.com:8080/orders?id=1' -X POST \
         -H 'Host: api.example.com:8080' -H 'x-note: it'\\''s' -b 'session=abc' \
         --data '{\"a\":1}'"
    );
}

/// Tests the remote address is used when no Host header is present.
#[test]
fn curl_falls_back_to_remote_address() {
    let request = HttpRequest::new().with_path("/health").with_secure(true);
    let remote: SocketAddr = "127.0.0.1:8443".parse().unwrap();
    assert_eq!(to_curl(&request, Some(remote)), "curl -v 'https://127.0.0.1:8443/health'");
}

/// Tests rendering without any target.
#[test]
fn curl_without_target() {
    assert_eq!(to_curl(&HttpRequest::new(), None), NO_HOST_RENDERING);
}
