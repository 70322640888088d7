// crates/mockgate-dispatch/src/object_callback.rs
// ============================================================================
// Module: Object Callback Channel
// Description: Message-passing hand-off to remote callback clients.
// Purpose: Let a remote client finish a request without blocking a worker.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! Object-callback actions transfer ownership of the final write to a remote
//! client. The dispatcher sends an [`ObjectCallbackMessage`] over an
//! [`ObjectCallbackChannel`] and returns; the client answers later through the
//! message's [`CallbackReply`].
//! Invariants:
//! - Every reply produces exactly one terminal write, even when it is dropped
//!   unanswered.
//! - The expectation post-processing hook runs only when the client responds
//!   or forwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use mockgate_core::CallbackError;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;

use crate::forward_result::ResponseOverride;

// ============================================================================
// SECTION: Messages
// ============================================================================

/// What the remote client is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectCallbackKind {
    /// Produce a response.
    Response,
    /// Rewrite the request before it is forwarded.
    Forward {
        /// Whether the client also wants to rewrite the upstream response.
        response_callback: bool,
    },
}

/// Request handed to a remote callback client.
pub struct ObjectCallbackMessage {
    /// Client the message is routed to.
    pub client_id: String,
    /// Requested behavior.
    pub kind: ObjectCallbackKind,
    /// Inbound request.
    pub request: HttpRequest,
    /// One-shot handle used to answer.
    pub reply: CallbackReply,
}

impl fmt::Debug for ObjectCallbackMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCallbackMessage")
            .field("client_id", &self.client_id)
            .field("kind", &self.kind)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Transport to remote callback clients.
pub trait ObjectCallbackChannel: Send + Sync {
    /// Routes `message` to its client.
    ///
    /// A rejected message is dropped, which answers it with not-found.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::ChannelUnavailable`] when the client is not connected.
    fn send(&self, message: ObjectCallbackMessage) -> Result<(), CallbackError>;
}

// ============================================================================
// SECTION: Reply
// ============================================================================

/// Dispatcher-side completion of an object-callback request.
pub(crate) trait ReplyTarget: Send {
    /// Writes a client-produced response.
    fn respond(&self, response: HttpResponse);

    /// Forwards a client-rewritten request.
    fn forward(&self, outbound: HttpRequest, response_override: Option<ResponseOverride>);

    /// Writes the synthetic not-found response.
    fn not_found(&self, reason: Option<String>);

    /// Runs the expectation post-processing hook.
    fn post_process(&self);
}

/// One-shot answer handle for an [`ObjectCallbackMessage`].
///
/// # Invariants
/// - Consumed by the first answer; dropping it unanswered writes not-found.
pub struct CallbackReply {
    /// Completion target; `None` once answered.
    target: Option<Box<dyn ReplyTarget>>,
}

impl CallbackReply {
    /// Creates a reply bound to `target`.
    pub(crate) fn new(target: Box<dyn ReplyTarget>) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// Answers with a response.
    pub fn respond(mut self, response: HttpResponse) {
        if let Some(target) = self.target.take() {
            target.respond(response);
            target.post_process();
        }
    }

    /// Answers by forwarding `outbound`, optionally rewriting the upstream response.
    pub fn forward(mut self, outbound: HttpRequest, response_override: Option<ResponseOverride>) {
        if let Some(target) = self.target.take() {
            target.forward(outbound, response_override);
            target.post_process();
        }
    }

    /// Answers with the synthetic not-found response.
    pub fn not_found(mut self, reason: Option<String>) {
        if let Some(target) = self.target.take() {
            target.not_found(reason);
        }
    }
}

impl Drop for CallbackReply {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            target.not_found(Some("object callback was not answered".to_string()));
        }
    }
}
