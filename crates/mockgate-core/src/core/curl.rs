// crates/mockgate-core/src/core/curl.rs
// ============================================================================
// Module: Mockgate Curl Rendering
// Description: Shell command rendering of outbound requests.
// Purpose: Give forwarded-request log events a reproducible command line.
// Dependencies: none
// ============================================================================

//! ## Overview
//! [`to_curl`] renders a request as a single `curl` invocation. Every
//! argument is single-quoted, so the output is safe to paste into a POSIX
//! shell.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::net::SocketAddr;

use crate::core::request::HttpRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rendering used when the target cannot be determined.
pub const NO_HOST_RENDERING: &str = "no host header or remote address specified";

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders `request` as a `curl` command.
///
/// The target host is taken from the `Host` header, else from `remote_address`.
#[must_use]
pub fn to_curl(request: &HttpRequest, remote_address: Option<SocketAddr>) -> String {
    let authority = match (request.host(), remote_address) {
        (Some(host), _) => host.to_string(),
        (None, Some(address)) => address.to_string(),
        (None, None) => return NO_HOST_RENDERING.to_string(),
    };
    let scheme = if request.is_secure() { "https" } else { "http" };
    let mut command = String::from("curl -v ");
    command.push_str(&quote(&format!("{scheme}://{authority}{}", request.path_and_query())));
    let method = request.method_or_default();
    if !method.eq_ignore_ascii_case("GET") {
        let _ = write!(command, " -X {method}");
    }
    for header in request.headers.iter() {
        for value in &header.values {
            command.push_str(" -H ");
            command.push_str(&quote(&format!("{}: {value}", header.name)));
        }
    }
    if !request.cookies.is_empty() {
        let cookies = request
            .cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        command.push_str(" -b ");
        command.push_str(&quote(&cookies));
    }
    if let Some(body) = request.body.as_ref().filter(|body| !body.is_empty()) {
        command.push_str(" --data ");
        command.push_str(&quote(&body.to_text()));
    }
    command
}

/// Wraps `value` in single quotes, escaping embedded quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
