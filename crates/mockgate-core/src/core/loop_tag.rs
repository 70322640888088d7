// crates/mockgate-core/src/core/loop_tag.rs
// ============================================================================
// Module: Mockgate Loop Prevention
// Description: Process-wide header pair stamped on forwarded requests.
// Purpose: Detect requests this process already forwarded and break proxy loops.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! A [`LoopPreventionTag`] is generated once per process (or injected for
//! deterministic tests) and shared by every dispatcher component.
//! Invariants:
//! - Every request forwarded by the process carries the tag.
//! - A received request carrying the tag is never proxied again.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::headers::Header;
use crate::core::headers::Headers;
use crate::core::request::HttpRequest;
use crate::core::response::HttpResponse;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header name used by generated tags.
pub const DEFAULT_LOOP_PREVENTION_HEADER: &str = "x-forwarded-by";

// ============================================================================
// SECTION: Loop Prevention Tag
// ============================================================================

/// Unique header name/value pair identifying this process as a forwarder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoopPreventionTag {
    /// Header name.
    name: String,
    /// Header value unique to the process.
    value: String,
}

impl LoopPreventionTag {
    /// Creates a tag from a fixed pair.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Generates a tag with a random 128-bit hex value.
    #[must_use]
    pub fn generate() -> Self {
        let value: u128 = rand::random();
        Self::new(DEFAULT_LOOP_PREVENTION_HEADER, format!("mockgate-{value:032x}"))
    }

    /// Returns the header name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the header value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true when `headers` carry this exact tag.
    #[must_use]
    pub fn is_present(&self, headers: &Headers) -> bool {
        headers.contains_entry(&self.name, &self.value)
    }

    /// Returns true when the request carries the tag.
    #[must_use]
    pub fn is_on_request(&self, request: &HttpRequest) -> bool {
        self.is_present(&request.headers)
    }

    /// Returns true when the response carries the tag.
    #[must_use]
    pub fn is_on_response(&self, response: &HttpResponse) -> bool {
        self.is_present(&response.headers)
    }

    /// Stamps the tag onto `headers`, replacing any previous value under the same name.
    pub fn stamp(&self, headers: &mut Headers) {
        headers.replace(Header::new(self.name.clone(), self.value.clone()));
    }

    /// Removes the tag header from `headers`.
    pub fn strip(&self, headers: &mut Headers) {
        headers.remove(&self.name);
    }
}
