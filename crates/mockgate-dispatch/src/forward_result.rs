// crates/mockgate-dispatch/src/forward_result.rs
// ============================================================================
// Module: Forward Results
// Description: In-flight outcome of a forwarding attempt.
// Purpose: Pair the outbound request with its pending response and override.
// Dependencies: mockgate-core, tokio
// ============================================================================

//! ## Overview
//! A [`ForwardResult`] is created when a forward begins and consumed exactly
//! once when the dispatcher writes the final response. Its
//! [`ResponseFuture`] has three terminal states: a response (possibly
//! absent), a forwarding error, or a timeout raised by the bounded wait.
//! Invariants:
//! - Local setup failures are represented as an already-completed future so
//!   the dispatcher always awaits a uniform value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::time::Duration;

use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;
use tokio::sync::oneshot;

use crate::error::ForwardError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Terminal value of a forwarded exchange.
pub type ResponseOutcome = Result<Option<HttpResponse>, ForwardError>;

/// Function applied to the upstream response before it is written.
///
/// Receives the outbound request and the upstream response, if any.
pub type ResponseOverride = Box<dyn FnOnce(&HttpRequest, Option<HttpResponse>) -> HttpResponse + Send>;

// ============================================================================
// SECTION: Response Future
// ============================================================================

/// Pending or completed upstream response.
#[derive(Debug)]
pub struct ResponseFuture {
    /// Completion state.
    state: FutureState,
}

/// Internal completion state of a [`ResponseFuture`].
#[derive(Debug)]
enum FutureState {
    /// Already completed.
    Ready(ResponseOutcome),
    /// Completed later through a [`ResponseCompleter`].
    Pending(oneshot::Receiver<ResponseOutcome>),
}

impl ResponseFuture {
    /// Creates an already-completed future.
    #[must_use]
    pub const fn ready(outcome: ResponseOutcome) -> Self {
        Self {
            state: FutureState::Ready(outcome),
        }
    }

    /// Creates a future completed with `response`.
    #[must_use]
    pub const fn completed(response: HttpResponse) -> Self {
        Self::ready(Ok(Some(response)))
    }

    /// Creates a future completed with the synthetic not-found response.
    #[must_use]
    pub fn not_found() -> Self {
        Self::completed(HttpResponse::not_found())
    }

    /// Creates a pending future and the handle that completes it.
    #[must_use]
    pub fn pending() -> (ResponseCompleter, Self) {
        let (sender, receiver) = oneshot::channel();
        (
            ResponseCompleter {
                sender,
            },
            Self {
                state: FutureState::Pending(receiver),
            },
        )
    }

    /// Returns the outcome when it is already available, else the pending future.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the outcome is still pending.
    pub fn into_ready(self) -> Result<ResponseOutcome, Self> {
        match self.state {
            FutureState::Ready(outcome) => Ok(outcome),
            state @ FutureState::Pending(_) => Err(Self {
                state,
            }),
        }
    }

    /// Waits at most `max_wait` for the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError::ResponseTimeout`] when the wait expires and
    /// [`ForwardError::SenderUnavailable`] when the exchange was dropped without a result.
    pub async fn wait(self, max_wait: Duration) -> ResponseOutcome {
        match self.state {
            FutureState::Ready(outcome) => outcome,
            FutureState::Pending(receiver) => match tokio::time::timeout(max_wait, receiver).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(_)) => Err(ForwardError::SenderUnavailable(
                    "exchange dropped before completing".to_string(),
                )),
                Err(_) => Err(ForwardError::ResponseTimeout {
                    timeout_ms: max_wait.as_millis(),
                }),
            },
        }
    }
}

/// Completes a pending [`ResponseFuture`].
#[derive(Debug)]
pub struct ResponseCompleter {
    /// Channel to the waiting future.
    sender: oneshot::Sender<ResponseOutcome>,
}

impl ResponseCompleter {
    /// Delivers the outcome; it is discarded when nobody is waiting any more.
    pub fn complete(self, outcome: ResponseOutcome) {
        let _ = self.sender.send(outcome);
    }
}

// ============================================================================
// SECTION: Forward Result
// ============================================================================

/// Outcome of starting a forward.
pub struct ForwardResult {
    /// Outbound request as sent (possibly rewritten).
    pub request: HttpRequest,
    /// Pending upstream response.
    pub response: ResponseFuture,
    /// Override applied once the response resolves.
    pub response_override: Option<ResponseOverride>,
    /// Address the request was sent to, for diagnostics.
    pub remote_address: Option<SocketAddr>,
}

impl ForwardResult {
    /// Creates a forward result without an override.
    #[must_use]
    pub const fn new(
        request: HttpRequest,
        response: ResponseFuture,
        remote_address: Option<SocketAddr>,
    ) -> Self {
        Self {
            request,
            response,
            response_override: None,
            remote_address,
        }
    }

    /// Creates a result whose response is the synthetic not-found response.
    #[must_use]
    pub fn not_found(request: HttpRequest) -> Self {
        Self::new(request, ResponseFuture::not_found(), None)
    }

    /// Attaches a response override.
    #[must_use]
    pub fn with_override(mut self, response_override: ResponseOverride) -> Self {
        self.response_override = Some(response_override);
        self
    }
}

/// Produces the response to write from a resolved upstream response.
///
/// With an override the override decides; otherwise a missing response becomes not-found.
#[must_use]
pub fn finish_response(
    request: &HttpRequest,
    upstream: Option<HttpResponse>,
    response_override: Option<ResponseOverride>,
) -> HttpResponse {
    match response_override {
        Some(apply) => apply(request, upstream),
        None => upstream.unwrap_or_else(HttpResponse::not_found),
    }
}
