// crates/mockgate-dispatch/src/resolver/forward_replace.rs
// ============================================================================
// Module: Forward Override Resolver
// Description: Resolves `httpOverrideForwardedRequest` actions.
// Purpose: Forward a patched copy of the request and patch the upstream response.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! Clones the inbound request, applies the request override, and forwards the
//! copy. The response override is applied when the upstream answer arrives.

use std::sync::Arc;

use mockgate_core::HttpOverrideForwardedRequest;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;

use crate::forward_result::ForwardResult;
use crate::forward_result::ResponseOverride;
use crate::resolver::forward::Forwarder;

/// Resolver for override forwards.
pub struct ForwardReplaceResolver {
    /// Base forwarding logic.
    forwarder: Arc<Forwarder>,
}

impl ForwardReplaceResolver {
    /// Creates the resolver.
    #[must_use]
    pub const fn new(forwarder: Arc<Forwarder>) -> Self {
        Self {
            forwarder,
        }
    }

    /// Forwards `request` patched with the request override.
    ///
    /// The upstream response is replaced by the response override when nothing arrived,
    /// passed through when no override is configured, and merged otherwise.
    #[must_use]
    pub fn resolve(&self, replace: &HttpOverrideForwardedRequest, request: &HttpRequest) -> ForwardResult {
        let mut outbound = request.clone();
        if let Some(patch) = &replace.request_override {
            outbound.merge_from(patch);
        }
        let response_override = replace.response_override.clone();
        let apply: ResponseOverride = Box::new(move |_, upstream| override_response(upstream, response_override));
        self.forwarder.send_request(&outbound, None, Some(apply))
    }
}

/// Combines the upstream response with the configured override.
fn override_response(upstream: Option<HttpResponse>, response_override: Option<HttpResponse>) -> HttpResponse {
    match (upstream, response_override) {
        (None, Some(response_override)) => response_override,
        (None, None) => HttpResponse::not_found(),
        (Some(upstream), None) => upstream,
        (Some(mut upstream), Some(response_override)) => {
            upstream.merge_from(&response_override);
            upstream
        }
    }
}
