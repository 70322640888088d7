// crates/mockgate-dispatch/src/telemetry.rs
// ============================================================================
// Module: Dispatch Telemetry
// Description: Observability events emitted while dispatching requests.
// Purpose: Record received, returned, forwarded, and failed requests as data.
// Dependencies: mockgate-core, serde, tracing
// ============================================================================

//! ## Overview
//! Every observable side effect of dispatch is described by an
//! [`ActionEvent`] and handed to an [`EventSink`]. The default
//! [`TracingEventSink`] forwards events to `tracing` with structured fields;
//! deployments can plug in their own sink to feed a request log or UI.
//! Invariants:
//! - Sinks never fail; recording is fire-and-forget.
//! - Events carry the request correlation id when one is present.

// ============================================================================
// SECTION: Imports
// ============================================================================

use mockgate_core::ExpectationId;
use mockgate_core::HttpRequest;
use serde::Serialize;

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Event classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A request arrived.
    ReceivedRequest,
    /// A response was returned for a matched expectation.
    ExpectationResponse,
    /// A response was returned for a forwarded request.
    ForwardedRequest,
    /// A not-found response was returned.
    NoMatchResponse,
    /// A CORS preflight was answered.
    CorsResponse,
    /// Proxy authentication was challenged.
    AuthenticationFailed,
    /// A recoverable failure occurred.
    Warn,
    /// A failure was logged with error detail.
    Exception,
    /// Diagnostic detail.
    Trace,
}

impl EventKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReceivedRequest => "received_request",
            Self::ExpectationResponse => "expectation_response",
            Self::ForwardedRequest => "forwarded_request",
            Self::NoMatchResponse => "no_match_response",
            Self::CorsResponse => "cors_response",
            Self::AuthenticationFailed => "authentication_failed",
            Self::Warn => "warn",
            Self::Exception => "exception",
            Self::Trace => "trace",
        }
    }
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventLevel {
    /// Fine-grained diagnostics.
    Trace,
    /// Debug diagnostics.
    Debug,
    /// Normal request lifecycle.
    Info,
    /// Recoverable failures.
    Warn,
    /// Failures needing attention.
    Error,
}

/// Observability event emitted by the dispatcher.
///
/// # Invariants
/// - Optional fields are `None` when the metadata is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionEvent {
    /// Event classification.
    pub kind: EventKind,
    /// Event severity.
    pub level: EventLevel,
    /// Correlation id of the request being processed.
    pub correlation_id: Option<String>,
    /// Expectation that produced the outcome.
    pub expectation_id: Option<ExpectationId>,
    /// Human-readable message.
    pub message: String,
    /// Request the event refers to.
    pub request: Option<HttpRequest>,
    /// Status code of the response returned.
    pub response_status: Option<u16>,
    /// Curl rendering of a forwarded request.
    pub curl: Option<String>,
    /// Error detail.
    pub error: Option<String>,
}

impl ActionEvent {
    /// Creates an event with only a kind, level, and message.
    #[must_use]
    pub fn new(kind: EventKind, level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            kind,
            level,
            correlation_id: None,
            expectation_id: None,
            message: message.into(),
            request: None,
            response_status: None,
            curl: None,
            error: None,
        }
    }

    /// Attaches the request and its correlation id.
    #[must_use]
    pub fn with_request(mut self, request: &HttpRequest) -> Self {
        self.correlation_id.clone_from(&request.log_correlation_id);
        self.request = Some(request.clone());
        self
    }

    /// Attaches only the correlation id of `request`.
    #[must_use]
    pub fn correlated(mut self, request: &HttpRequest) -> Self {
        self.correlation_id.clone_from(&request.log_correlation_id);
        self
    }

    /// Attaches the expectation id.
    #[must_use]
    pub fn with_expectation(mut self, expectation_id: &ExpectationId) -> Self {
        self.expectation_id = Some(expectation_id.clone());
        self
    }

    /// Attaches the response status.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.response_status = Some(status);
        self
    }

    /// Attaches a curl rendering.
    #[must_use]
    pub fn with_curl(mut self, curl: String) -> Self {
        self.curl = Some(curl);
        self
    }

    /// Attaches error detail.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Receiver of dispatch events.
pub trait EventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &ActionEvent);

    /// Returns true when events at `level` are recorded.
    ///
    /// Callers may skip building expensive events when this returns false.
    fn enabled(&self, _level: EventLevel) -> bool {
        true
    }
}

/// Event sink that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

/// Emits an event through a `tracing` macro with the shared field set.
macro_rules! emit {
    ($macro:ident, $event:expr) => {
        tracing::$macro!(
            event = $event.kind.as_str(),
            correlation_id = $event.correlation_id.as_deref(),
            expectation_id = $event.expectation_id.as_ref().map(ExpectationId::as_str),
            status = $event.response_status,
            curl = $event.curl.as_deref(),
            error = $event.error.as_deref(),
            "{}",
            $event.message
        )
    };
}

impl EventSink for TracingEventSink {
    fn record(&self, event: &ActionEvent) {
        match event.level {
            EventLevel::Trace => emit!(trace, event),
            EventLevel::Debug => emit!(debug, event),
            EventLevel::Info => emit!(info, event),
            EventLevel::Warn => emit!(warn, event),
            EventLevel::Error => emit!(error, event),
        }
    }

    fn enabled(&self, level: EventLevel) -> bool {
        match level {
            EventLevel::Trace => tracing::enabled!(tracing::Level::TRACE),
            EventLevel::Debug => tracing::enabled!(tracing::Level::DEBUG),
            EventLevel::Info => tracing::enabled!(tracing::Level::INFO),
            EventLevel::Warn => tracing::enabled!(tracing::Level::WARN),
            EventLevel::Error => tracing::enabled!(tracing::Level::ERROR),
        }
    }
}

/// No-op event sink.
///
/// # Invariants
/// - Events are intentionally discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &ActionEvent) {}

    fn enabled(&self, _level: EventLevel) -> bool {
        false
    }
}
