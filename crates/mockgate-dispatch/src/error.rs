// crates/mockgate-dispatch/src/error.rs
// ============================================================================
// Module: Dispatch Errors
// Description: Error taxonomy for forwarding, resolution, and dispatcher setup.
// Purpose: Let the dispatcher classify failures without string matching.
// Dependencies: mockgate-core, thiserror
// ============================================================================

//! ## Overview
//! Forwarding failures carry classification predicates that drive the
//! not-found fallback and the log level used for each failure. Resolver
//! errors separate configuration faults from per-request failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use mockgate_core::CallbackError;
use mockgate_core::TemplateError;
use thiserror::Error;

// ============================================================================
// SECTION: Forward Errors
// ============================================================================

/// Failures raised while sending a request upstream or awaiting its response.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    /// The upstream refused or could not be reached.
    #[error("failed to connect to {address}: {reason}")]
    Connect {
        /// Target address.
        address: String,
        /// Failure detail.
        reason: String,
    },
    /// The connect attempt exceeded its timeout.
    #[error("timed out connecting to {address} after {timeout_ms}ms")]
    ConnectTimeout {
        /// Target address.
        address: String,
        /// Connect timeout in milliseconds.
        timeout_ms: u128,
    },
    /// The target host could not be resolved.
    #[error("failed to resolve target: {0}")]
    Resolve(String),
    /// The TLS handshake with the upstream failed.
    #[error("TLS handshake with {address} failed: {reason}")]
    TlsHandshake {
        /// Target address.
        address: String,
        /// Failure detail.
        reason: String,
    },
    /// The upstream closed the connection before a full response arrived.
    #[error("connection closed by peer: {0}")]
    ConnectionClosed(String),
    /// A socket read or write failed mid-exchange.
    #[error("socket communication failure: {0}")]
    SocketCommunication(String),
    /// No response arrived within the bounded wait.
    #[error("response was not received after {timeout_ms} milliseconds")]
    ResponseTimeout {
        /// Wait bound in milliseconds.
        timeout_ms: u128,
    },
    /// The outbound request could not be encoded.
    #[error("invalid outbound request: {0}")]
    InvalidRequest(String),
    /// The sender dropped the exchange without a result.
    #[error("request sender unavailable: {0}")]
    SenderUnavailable(String),
}

impl ForwardError {
    /// Returns true for refused, unreachable, unresolvable, or timed-out connects.
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::ConnectTimeout { .. } | Self::Resolve(_))
    }

    /// Returns true for TLS handshake failures.
    #[must_use]
    pub const fn is_tls_handshake(&self) -> bool {
        matches!(self, Self::TlsHandshake { .. })
    }

    /// Returns true when the peer closed the connection.
    #[must_use]
    pub const fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed(_))
    }

    /// Returns true for mid-exchange socket failures, including the bounded-wait timeout.
    #[must_use]
    pub const fn is_socket_communication(&self) -> bool {
        matches!(self, Self::SocketCommunication(_) | Self::ResponseTimeout { .. })
    }
}

// ============================================================================
// SECTION: Resolve Errors
// ============================================================================

/// Failures raised by action resolvers.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The action names a template language that does not exist.
    #[error("unknown template type: {0}")]
    UnknownTemplateType(String),
    /// No template engine was configured.
    #[error("no template engine configured for {0} templates")]
    TemplateEngineMissing(String),
    /// The template failed to render.
    #[error("template render failed: {0}")]
    Template(String),
    /// A callback could not be loaded or failed.
    #[error(transparent)]
    Callback(#[from] CallbackError),
    /// An error action needs a connection but none was supplied.
    #[error("no connection available for error action")]
    MissingConnection,
    /// Writing raw bytes to the connection failed.
    #[error("failed to write error response bytes: {0}")]
    ConnectionWrite(String),
}

impl ResolveError {
    /// Returns true for faults in the expectation configuration itself.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownTemplateType(_) | Self::TemplateEngineMissing(_))
    }
}

impl From<TemplateError> for ResolveError {
    fn from(error: TemplateError) -> Self {
        match error {
            TemplateError::UnknownType(tag) => Self::UnknownTemplateType(tag),
            TemplateError::Render(reason) => Self::Template(reason),
        }
    }
}

// ============================================================================
// SECTION: Setup Errors
// ============================================================================

/// Failures building the scheduler runtime.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The worker pool size is zero.
    #[error("scheduler requires at least one worker thread")]
    NoWorkers,
    /// The runtime could not be started.
    #[error("failed to start scheduler runtime: {0}")]
    Runtime(String),
}

/// Failures building an [`crate::ActionDispatcher`].
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// The scheduler could not be created.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    /// The TLS client configuration could not be built.
    #[error("failed to build TLS client configuration: {0}")]
    Tls(String),
}
