// crates/mockgate-core/src/core/response.rs
// ============================================================================
// Module: Mockgate Responses
// Description: HTTP response model returned by actions and forwarded upstreams.
// Purpose: Represent configured, rendered, and received responses uniformly.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`HttpResponse`] doubles as the static `Response` action payload and as the
//! shape of every response written back to a caller. Its optional `delay` is
//! applied when the response is written, not when the action is scheduled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::body::Body;
use crate::core::delay::Delay;
use crate::core::headers::Cookie;
use crate::core::headers::Headers;
use crate::core::headers::merge_cookies;
use crate::core::headers::merge_headers;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status code used when a response does not declare one.
pub const DEFAULT_STATUS_CODE: u16 = 200;
/// Status code of the synthetic "not found" response.
pub const NOT_FOUND_STATUS_CODE: u16 = 404;

// ============================================================================
// SECTION: Response
// ============================================================================

/// HTTP response produced by an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    /// Status code; `None` means [`DEFAULT_STATUS_CODE`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Optional reason phrase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_phrase: Option<String>,
    /// Response headers.
    #[serde(default, skip_serializing_if = "Headers::is_empty")]
    pub headers: Headers,
    /// Response cookies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<Cookie>,
    /// Response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    /// Delay applied before the response is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
}

impl HttpResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the synthetic "not found" response.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new().with_status_code(NOT_FOUND_STATUS_CODE)
    }

    /// Returns a bare `200 OK` response.
    #[must_use]
    pub fn ok() -> Self {
        Self::new().with_status_code(DEFAULT_STATUS_CODE)
    }

    /// Sets the status code.
    #[must_use]
    pub const fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Sets the reason phrase.
    #[must_use]
    pub fn with_reason_phrase(mut self, reason_phrase: impl Into<String>) -> Self {
        self.reason_phrase = Some(reason_phrase.into());
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

    /// Sets the write delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the effective status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status_code.unwrap_or(DEFAULT_STATUS_CODE)
    }

    /// Applies `overrides` onto this response.
    ///
    /// Present fields of `overrides` win; headers and cookies replace same-named entries and
    /// every field absent from `overrides` is preserved.
    pub fn merge_from(&mut self, overrides: &Self) {
        if overrides.status_code.is_some() {
            self.status_code = overrides.status_code;
        }
        if overrides.reason_phrase.is_some() {
            self.reason_phrase.clone_from(&overrides.reason_phrase);
        }
        merge_headers(&mut self.headers, &overrides.headers);
        merge_cookies(&mut self.cookies, &overrides.cookies);
        if overrides.body.is_some() {
            self.body.clone_from(&overrides.body);
        }
        if overrides.delay.is_some() {
            self.delay = overrides.delay;
        }
    }
}

impl fmt::Display for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason_phrase {
            Some(reason) => write!(f, "{} {reason}", self.status()),
            None => write!(f, "{}", self.status()),
        }
    }
}
