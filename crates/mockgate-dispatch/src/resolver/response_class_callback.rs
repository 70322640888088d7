// crates/mockgate-dispatch/src/resolver/response_class_callback.rs
// ============================================================================
// Module: Response Class Callback Resolver
// Description: Resolves `httpResponseClassCallback` actions.
// Purpose: Produce a response from a callback registered by name.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! Lookup failures (unknown name, missing capability, failed construction)
//! are logged and answered with not-found. A failure raised by the callback
//! itself is returned to the dispatcher.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use mockgate_core::HttpClassCallback;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;

use crate::callback::CallbackRegistry;
use crate::callback::invoke_guarded;
use crate::error::ResolveError;
use crate::telemetry::ActionEvent;
use crate::telemetry::EventKind;
use crate::telemetry::EventLevel;
use crate::telemetry::EventSink;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolver for class-callback responses.
pub struct ResponseClassCallbackResolver {
    /// Callback registry.
    registry: Arc<CallbackRegistry>,
    /// Event sink.
    sink: Arc<dyn EventSink>,
}

impl ResponseClassCallbackResolver {
    /// Creates the resolver.
    #[must_use]
    pub fn new(registry: Arc<CallbackRegistry>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            registry,
            sink,
        }
    }

    /// Invokes the named callback for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Callback`] when the callback fails or panics.
    pub fn resolve(&self, callback: &HttpClassCallback, request: &HttpRequest) -> Result<HttpResponse, ResolveError> {
        let handler = match self.registry.response_callback(&callback.callback_class) {
            Ok(handler) => handler,
            Err(err) => {
                self.sink.record(
                    &ActionEvent::new(
                        EventKind::Exception,
                        EventLevel::Error,
                        format!("failed to load response callback {}", callback.callback_class),
                    )
                    .with_request(request)
                    .with_error(err.to_string()),
                );
                return Ok(HttpResponse::not_found());
            }
        };
        Ok(invoke_guarded(|| handler.handle(request))?)
    }
}
