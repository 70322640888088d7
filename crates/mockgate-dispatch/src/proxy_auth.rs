// crates/mockgate-dispatch/src/proxy_auth.rs
// ============================================================================
// Module: Proxy Authentication
// Description: Basic proxy authentication for opportunistic proxying.
// Purpose: Challenge unauthenticated clients with `407 Proxy Authentication Required`.
// Dependencies: base64, mockgate-config, mockgate-core
// ============================================================================

//! ## Overview
//! When proxy credentials are configured, opportunistically proxied requests
//! must present `Proxy-Authorization: Basic base64(username:password)`.
//! Invariants:
//! - The realm is escaped before it is embedded in the quoted challenge.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use mockgate_config::ProxyConfig;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status code of the authentication challenge.
pub const PROXY_AUTHENTICATION_REQUIRED: u16 = 407;
/// Request header carrying proxy credentials.
pub const PROXY_AUTHORIZATION_HEADER: &str = "Proxy-Authorization";
/// Response header carrying the challenge.
pub const PROXY_AUTHENTICATE_HEADER: &str = "Proxy-Authenticate";

// ============================================================================
// SECTION: Authenticator
// ============================================================================

/// Checks proxy credentials and builds challenges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAuthenticator {
    /// Expected `Proxy-Authorization` value.
    expected: String,
    /// Prebuilt `Proxy-Authenticate` value.
    challenge: String,
}

impl ProxyAuthenticator {
    /// Creates an authenticator.
    #[must_use]
    pub fn new(username: &str, password: &str, realm: &str) -> Self {
        Self {
            expected: format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))),
            challenge: format!("Basic realm=\"{}\", charset=\"UTF-8\"", escape_realm(realm)),
        }
    }

    /// Creates an authenticator when both credentials are configured.
    #[must_use]
    pub fn from_config(config: &ProxyConfig) -> Option<Self> {
        config
            .credentials()
            .map(|(username, password)| Self::new(username, password, &config.authentication_realm))
    }

    /// Returns true when `request` carries the expected credentials.
    #[must_use]
    pub fn is_authorized(&self, request: &HttpRequest) -> bool {
        request.headers.contains_entry(PROXY_AUTHORIZATION_HEADER, &self.expected)
    }

    /// Returns the `407` challenge response.
    #[must_use]
    pub fn challenge(&self) -> HttpResponse {
        HttpResponse::new()
            .with_status_code(PROXY_AUTHENTICATION_REQUIRED)
            .with_header(PROXY_AUTHENTICATE_HEADER, self.challenge.as_str())
    }
}

/// Escapes backslashes, quotes, and control characters in a realm.
fn escape_realm(realm: &str) -> String {
    let mut escaped = String::with_capacity(realm.len());
    for ch in realm.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            ch if ch.is_control() => {
                let _ = write!(escaped, "\\u{:04X}", u32::from(ch));
            }
            ch => escaped.push(ch),
        }
    }
    escaped
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
