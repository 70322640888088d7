// crates/mockgate-dispatch/src/resolver/response.rs
// ============================================================================
// Module: Static Response Resolver
// Description: Resolves `httpResponse` actions.
// Purpose: Hand out an independent copy of the configured response.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! Returns a clone of the stored response so repeated matches never share it.

use mockgate_core::HttpResponse;

/// Resolver for static responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseResolver;

impl ResponseResolver {
    /// Returns a clone of `response`; the response's own delay is applied at write time.
    #[must_use]
    pub fn resolve(self, response: &HttpResponse) -> HttpResponse {
        response.clone()
    }
}
