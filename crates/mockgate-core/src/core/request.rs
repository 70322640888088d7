// crates/mockgate-core/src/core/request.rs
// ============================================================================
// Module: Mockgate Requests
// Description: Inbound and outbound HTTP request model.
// Purpose: Represent requests received, matched, rewritten, and forwarded.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`HttpRequest`] is the transport-neutral request shape used by every action
//! resolver. Requests are cloned before any rewrite so an inbound request is
//! never mutated by forwarding logic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::body::Body;
use crate::core::headers::Cookie;
use crate::core::headers::Headers;
use crate::core::headers::merge_cookies;
use crate::core::headers::merge_headers;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the `Host` header.
pub const HOST_HEADER: &str = "Host";

// ============================================================================
// SECTION: Socket Address
// ============================================================================

/// URL scheme of a forward target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scheme {
    /// Cleartext HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Returns the lowercase URL scheme label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Returns the conventional port for the scheme.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

/// Declared target address of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketAddress {
    /// Host name or IP literal.
    pub host: String,
    /// Target port.
    pub port: u16,
    /// Target scheme.
    #[serde(default)]
    pub scheme: Scheme,
}

impl SocketAddress {
    /// Creates a socket address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, scheme: Scheme) -> Self {
        Self {
            host: host.into(),
            port,
            scheme,
        }
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ============================================================================
// SECTION: Request
// ============================================================================

/// HTTP request handled by the dispatcher.
///
/// # Invariants
/// - An empty `method` is treated as `GET` when sent.
/// - An empty `path` is treated as `/` when sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    /// Request method.
    #[serde(default)]
    pub method: String,
    /// Request path without the query string.
    #[serde(default)]
    pub path: String,
    /// Raw query string without the leading `?`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Request headers.
    #[serde(default, skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,
    /// Request cookies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<Cookie>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    /// Whether the request travels over TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// Whether the connection should be kept alive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
    /// Declared target address, overriding the `Host` header when forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_address: Option<SocketAddress>,
    /// Correlation identifier shared by every event logged for this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_correlation_id: Option<String>,
}

impl HttpRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the raw query string.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Appends a header value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Appends a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push(Cookie::new(name, value));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the secure flag.
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Sets the keep-alive flag.
    #[must_use]
    pub const fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    /// Sets the declared target address.
    #[must_use]
    pub fn with_socket_address(mut self, socket_address: SocketAddress) -> Self {
        self.socket_address = Some(socket_address);
        self
    }

    /// Sets the log correlation identifier.
    #[must_use]
    pub fn with_log_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.log_correlation_id = Some(id.into());
        self
    }

    /// Returns true when the request is marked secure.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.secure.unwrap_or(false)
    }

    /// Returns the method, defaulting to `GET`.
    #[must_use]
    pub fn method_or_default(&self) -> &str {
        if self.method.is_empty() { "GET" } else { &self.method }
    }

    /// Returns the non-empty `Host` header value.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.headers.first(HOST_HEADER).filter(|host| !host.trim().is_empty())
    }

    /// Returns the origin-form target (`/path?query`).
    #[must_use]
    pub fn path_and_query(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        match self.query.as_deref() {
            Some(query) if !query.is_empty() => format!("{path}?{query}"),
            _ => path.to_string(),
        }
    }

    /// Applies `patch` onto this request.
    ///
    /// Non-empty method and path, and every present optional field of `patch`, replace the
    /// current values; headers and cookies are merged by name.
    pub fn merge_from(&mut self, patch: &Self) {
        if !patch.method.is_empty() {
            self.method.clone_from(&patch.method);
        }
        if !patch.path.is_empty() {
            self.path.clone_from(&patch.path);
        }
        if patch.query.is_some() {
            self.query.clone_from(&patch.query);
        }
        merge_headers(&mut self.headers, &patch.headers);
        merge_cookies(&mut self.cookies, &patch.cookies);
        if patch.body.is_some() {
            self.body.clone_from(&patch.body);
        }
        if patch.secure.is_some() {
            self.secure = patch.secure;
        }
        if patch.keep_alive.is_some() {
            self.keep_alive = patch.keep_alive;
        }
        if patch.socket_address.is_some() {
            self.socket_address.clone_from(&patch.socket_address);
        }
    }
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method_or_default(), self.path_and_query())
    }
}
