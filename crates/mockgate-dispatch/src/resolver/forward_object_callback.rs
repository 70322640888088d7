// crates/mockgate-dispatch/src/resolver/forward_object_callback.rs
// ============================================================================
// Module: Forward Object Callback Resolver
// Description: Resolves `httpForwardObjectCallback` actions.
// Purpose: Let a remote client rewrite a request (and its response) before forwarding.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! Hands the request to a remote client over the object-callback channel.
//! The client's reply, not this resolver, decides what is forwarded.

use std::sync::Arc;

use mockgate_core::HttpObjectCallback;
use mockgate_core::HttpRequest;

use crate::object_callback::CallbackReply;
use crate::object_callback::ObjectCallbackChannel;
use crate::object_callback::ObjectCallbackKind;
use crate::resolver::response_object_callback::hand_off;
use crate::telemetry::EventSink;

/// Resolver for object-callback forwards.
pub struct ForwardObjectCallbackResolver {
    /// Remote callback transport.
    channel: Option<Arc<dyn ObjectCallbackChannel>>,
    /// Event sink.
    sink: Arc<dyn EventSink>,
}

impl ForwardObjectCallbackResolver {
    /// Creates the resolver.
    #[must_use]
    pub fn new(channel: Option<Arc<dyn ObjectCallbackChannel>>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            channel,
            sink,
        }
    }

    /// Routes `request` to the callback client; the client answers via `reply.forward`.
    pub fn resolve(&self, callback: &HttpObjectCallback, request: &HttpRequest, reply: CallbackReply) {
        let kind = ObjectCallbackKind::Forward {
            response_callback: callback.response_callback.unwrap_or(false),
        };
        hand_off(self.channel.as_deref(), self.sink.as_ref(), &callback.client_id, kind, request, reply);
    }
}
