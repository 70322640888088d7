// crates/mockgate-core/src/core/hop_by_hop.rs
// ============================================================================
// Module: Mockgate Hop-By-Hop Filter
// Description: Removal of connection-scoped headers before forwarding.
// Purpose: Keep single-hop headers from leaking across a proxy hop.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The filter is stateless; both operations return filtered clones and leave
//! their input untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::headers::Headers;
use crate::core::request::HttpRequest;
use crate::core::response::HttpResponse;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Headers that apply to a single connection hop (lowercase).
pub const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "proxy-connection",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "trailer",
    "proxy-authorization",
    "proxy-authenticate",
    "upgrade",
];

// ============================================================================
// SECTION: Filter
// ============================================================================

/// Returns true when `name` is a hop-by-hop header.
#[must_use]
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS.iter().any(|candidate| candidate.eq_ignore_ascii_case(name))
}

/// Removes hop-by-hop headers in place.
pub fn strip_hop_by_hop(headers: &mut Headers) {
    headers.retain(|header| !is_hop_by_hop(&header.name));
}

/// Stateless hop-by-hop header filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HopByHopFilter;

impl HopByHopFilter {
    /// Returns a clone of `request` without hop-by-hop headers.
    #[must_use]
    pub fn on_request(self, request: &HttpRequest) -> HttpRequest {
        let mut filtered = request.clone();
        strip_hop_by_hop(&mut filtered.headers);
        filtered
    }

    /// Returns a clone of `response` without hop-by-hop headers.
    #[must_use]
    pub fn on_response(self, response: &HttpResponse) -> HttpResponse {
        let mut filtered = response.clone();
        strip_hop_by_hop(&mut filtered.headers);
        filtered
    }
}
