// crates/mockgate-dispatch/src/resolver/forward_class_callback.rs
// ============================================================================
// Module: Forward Class Callback Resolver
// Description: Resolves `httpForwardClassCallback` actions.
// Purpose: Rewrite the request and response of a forward with a named callback.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! The request rewrite runs before sending and its output becomes the
//! outbound request. The response rewrite becomes the forward result's
//! override.
//! Invariants:
//! - Lookup failures degrade to forwarding the unmodified request.
//! - A failing response rewrite falls back to the upstream response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;

use mockgate_core::ExpectationForwardAndResponseCallback;
use mockgate_core::HttpClassCallback;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;

use crate::callback::CallbackRegistry;
use crate::callback::invoke_guarded;
use crate::error::ResolveError;
use crate::forward_result::ForwardResult;
use crate::forward_result::ResponseOverride;
use crate::resolver::forward::Forwarder;
use crate::scheduler::panic_message;
use crate::telemetry::ActionEvent;
use crate::telemetry::EventKind;
use crate::telemetry::EventLevel;
use crate::telemetry::EventSink;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolver for class-callback forwards.
pub struct ForwardClassCallbackResolver {
    /// Base forwarding logic.
    forwarder: Arc<Forwarder>,
    /// Callback registry.
    registry: Arc<CallbackRegistry>,
    /// Event sink.
    sink: Arc<dyn EventSink>,
}

impl ForwardClassCallbackResolver {
    /// Creates the resolver.
    #[must_use]
    pub fn new(forwarder: Arc<Forwarder>, registry: Arc<CallbackRegistry>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            forwarder,
            registry,
            sink,
        }
    }

    /// Rewrites and forwards `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Callback`] when the request rewrite fails or panics.
    pub fn resolve(&self, callback: &HttpClassCallback, request: &HttpRequest) -> Result<ForwardResult, ResolveError> {
        let callbacks = match self.registry.forward_callbacks(&callback.callback_class) {
            Ok(callbacks) => callbacks,
            Err(err) => {
                self.sink.record(
                    &ActionEvent::new(
                        EventKind::Exception,
                        EventLevel::Error,
                        format!("failed to load forward callback {}", callback.callback_class),
                    )
                    .with_request(request)
                    .with_error(err.to_string()),
                );
                return Ok(self.forwarder.send_request(request, None, None));
            }
        };
        let outbound = match &callbacks.forward {
            Some(rewrite) => invoke_guarded(|| rewrite.handle(request))?,
            None => request.clone(),
        };
        let response_override = callbacks
            .forward_and_response
            .map(|rewrite| response_rewrite(rewrite, Arc::clone(&self.sink)));
        Ok(self.forwarder.send_request(&outbound, None, response_override))
    }
}

// ============================================================================
// SECTION: Response Overrides
// ============================================================================

/// Wraps a response rewrite callback as an override that keeps the upstream response on failure.
fn response_rewrite(
    rewrite: Arc<dyn ExpectationForwardAndResponseCallback>,
    sink: Arc<dyn EventSink>,
) -> ResponseOverride {
    Box::new(move |request, upstream| {
        let upstream = upstream.unwrap_or_else(HttpResponse::not_found);
        match invoke_guarded(|| rewrite.handle(request, &upstream)) {
            Ok(response) => response,
            Err(err) => {
                record_override_failure(sink.as_ref(), request, &err.to_string());
                upstream
            }
        }
    })
}

/// Wraps an arbitrary override so a panic falls back to the upstream response.
pub(crate) fn guarded_override(apply: ResponseOverride, sink: Arc<dyn EventSink>) -> ResponseOverride {
    Box::new(move |request, upstream| {
        let fallback = upstream.clone();
        match catch_unwind(AssertUnwindSafe(|| apply(request, upstream))) {
            Ok(response) => response,
            Err(payload) => {
                record_override_failure(sink.as_ref(), request, &panic_message(payload.as_ref()));
                fallback.unwrap_or_else(HttpResponse::not_found)
            }
        }
    })
}

/// Records a failed response override.
fn record_override_failure(sink: &dyn EventSink, request: &HttpRequest, error: &str) {
    sink.record(
        &ActionEvent::new(
            EventKind::Exception,
            EventLevel::Error,
            "exception overriding forwarded response, returning original response",
        )
        .with_request(request)
        .with_error(error),
    );
}
