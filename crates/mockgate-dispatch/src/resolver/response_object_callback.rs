// crates/mockgate-dispatch/src/resolver/response_object_callback.rs
// ============================================================================
// Module: Response Object Callback Resolver
// Description: Resolves `httpResponseObjectCallback` actions.
// Purpose: Hand the request to a remote client that writes the response itself.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! The resolver sends a message and returns immediately. Writing the response
//! and running the post-processing hook belong to the [`CallbackReply`] from
//! then on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use mockgate_core::CallbackError;
use mockgate_core::HttpObjectCallback;
use mockgate_core::HttpRequest;

use crate::object_callback::CallbackReply;
use crate::object_callback::ObjectCallbackChannel;
use crate::object_callback::ObjectCallbackKind;
use crate::object_callback::ObjectCallbackMessage;
use crate::telemetry::ActionEvent;
use crate::telemetry::EventKind;
use crate::telemetry::EventLevel;
use crate::telemetry::EventSink;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolver for object-callback responses.
pub struct ResponseObjectCallbackResolver {
    /// Remote callback transport.
    channel: Option<Arc<dyn ObjectCallbackChannel>>,
    /// Event sink.
    sink: Arc<dyn EventSink>,
}

impl ResponseObjectCallbackResolver {
    /// Creates the resolver.
    #[must_use]
    pub fn new(channel: Option<Arc<dyn ObjectCallbackChannel>>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            channel,
            sink,
        }
    }

    /// Routes `request` to the callback client; `reply` completes it.
    pub fn resolve(&self, callback: &HttpObjectCallback, request: &HttpRequest, reply: CallbackReply) {
        hand_off(
            self.channel.as_deref(),
            self.sink.as_ref(),
            &callback.client_id,
            ObjectCallbackKind::Response,
            request,
            reply,
        );
    }
}

// ============================================================================
// SECTION: Hand-Off
// ============================================================================

/// Sends an object-callback message, answering not-found when no client can take it.
pub(crate) fn hand_off(
    channel: Option<&dyn ObjectCallbackChannel>,
    sink: &dyn EventSink,
    client_id: &str,
    kind: ObjectCallbackKind,
    request: &HttpRequest,
    reply: CallbackReply,
) {
    let Some(channel) = channel else {
        let err = CallbackError::ChannelUnavailable(client_id.to_string());
        record_unavailable(sink, request, &err);
        reply.not_found(Some(err.to_string()));
        return;
    };
    let message = ObjectCallbackMessage {
        client_id: client_id.to_string(),
        kind,
        request: request.clone(),
        reply,
    };
    if let Err(err) = channel.send(message) {
        record_unavailable(sink, request, &err);
    }
}

/// Records that no callback client accepted the request.
fn record_unavailable(sink: &dyn EventSink, request: &HttpRequest, err: &CallbackError) {
    sink.record(
        &ActionEvent::new(EventKind::Warn, EventLevel::Warn, "no callback client available for request")
            .with_request(request)
            .with_error(err.to_string()),
    );
}
