// crates/mockgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Mockgate Interfaces
// Description: Collaborator contracts consumed by the action dispatcher.
// Purpose: Decouple dispatch from expectation storage, transport, templates, and plug-ins.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The dispatcher drives a request through these traits without knowing how
//! expectations are stored, how bytes reach the socket, or how templates are
//! evaluated. Every trait is object safe and `Send + Sync` so implementations
//! can be shared behind `Arc` across worker threads.
//!
//! Callback capability traits are implemented by user plug-ins registered by
//! name; each capability is optional and discovered independently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::core::Expectation;
use crate::core::HttpRequest;
use crate::core::HttpResponse;
use crate::core::LoopPreventionTag;

// ============================================================================
// SECTION: Expectation Directory
// ============================================================================

/// Source of matched expectations.
pub trait ExpectationDirectory: Send + Sync {
    /// Returns the first expectation matching `request`, if any.
    fn first_matching_expectation(&self, request: &HttpRequest) -> Option<Arc<Expectation>>;

    /// Runs bookkeeping after an action completed successfully.
    fn post_process(&self, expectation: &Expectation);

    /// Returns the process-wide loop-prevention tag.
    fn loop_prevention_tag(&self) -> &LoopPreventionTag;
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Writes responses back to the caller that sent a request.
pub trait ResponseWriter: Send + Sync {
    /// Writes `response` for `request`.
    ///
    /// `hop_by_hop_stripped` reports whether connection-scoped headers were already removed.
    fn write_response(&self, request: &HttpRequest, response: HttpResponse, hop_by_hop_stripped: bool);
}

/// Connection the inbound request arrived on.
pub trait ConnectionContext: Send + Sync {
    /// Returns the upstream address a proxied connection is bound to, if known.
    fn proxied_remote_address(&self) -> Option<SocketAddr>;

    /// Writes raw bytes to the connection, bypassing HTTP encoding.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the bytes cannot be written.
    fn write_raw(&self, bytes: &[u8]) -> io::Result<()>;

    /// Closes the connection.
    fn close(&self);
}

// ============================================================================
// SECTION: Templates
// ============================================================================

/// Template languages understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateType {
    /// JavaScript-like scripting templates.
    Javascript,
    /// Velocity-style logic templates.
    Velocity,
    /// Mustache-style string templates.
    Mustache,
}

impl TemplateType {
    /// Resolves a configured tag, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownType`] for unrecognized tags.
    pub fn from_tag(tag: &str) -> Result<Self, TemplateError> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "JAVASCRIPT" => Ok(Self::Javascript),
            "VELOCITY" => Ok(Self::Velocity),
            "MUSTACHE" => Ok(Self::Mustache),
            _ => Err(TemplateError::UnknownType(tag.to_string())),
        }
    }

    /// Returns the canonical tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Javascript => "JAVASCRIPT",
            Self::Velocity => "VELOCITY",
            Self::Mustache => "MUSTACHE",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template rendering errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template language tag is not recognized.
    #[error("unknown template type: {0}")]
    UnknownType(String),
    /// The template failed to evaluate.
    #[error("template render failed: {0}")]
    Render(String),
}

/// External template renderer.
pub trait TemplateEngine: Send + Sync {
    /// Renders a response template. `Ok(None)` means the template produced nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when evaluation fails.
    fn render_response(
        &self,
        template_type: TemplateType,
        template: &str,
        request: &HttpRequest,
    ) -> Result<Option<HttpResponse>, TemplateError>;

    /// Renders a request template. `Ok(None)` means the template produced nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when evaluation fails.
    fn render_request(
        &self,
        template_type: TemplateType,
        template: &str,
        request: &HttpRequest,
    ) -> Result<Option<HttpRequest>, TemplateError>;
}

// ============================================================================
// SECTION: Callback Capabilities
// ============================================================================

/// Callback lookup and invocation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// No callback is registered under the name.
    #[error("callback not found: {0}")]
    NotFound(String),
    /// The callback does not implement the requested capability.
    #[error("callback {name} does not implement {capability}")]
    WrongCapability {
        /// Registered callback name.
        name: String,
        /// Missing capability.
        capability: &'static str,
    },
    /// The callback factory failed to build an instance.
    #[error("callback {name} could not be constructed: {reason}")]
    Construction {
        /// Registered callback name.
        name: String,
        /// Failure detail.
        reason: String,
    },
    /// The callback reported an error.
    #[error("callback failed: {0}")]
    Failed(String),
    /// The callback panicked.
    #[error("callback panicked: {0}")]
    Panicked(String),
    /// No remote callback channel is available for the client.
    #[error("callback channel unavailable for client {0}")]
    ChannelUnavailable(String),
}

/// Produces a response for a matched request.
pub trait ExpectationResponseCallback: Send + Sync {
    /// Returns the response for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError`] when no response can be produced.
    fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, CallbackError>;
}

/// Rewrites a request before it is forwarded.
pub trait ExpectationForwardCallback: Send + Sync {
    /// Returns the request to forward in place of `request`.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError`] when the request cannot be rewritten.
    fn handle(&self, request: &HttpRequest) -> Result<HttpRequest, CallbackError>;
}

/// Rewrites the upstream response of a forwarded request.
pub trait ExpectationForwardAndResponseCallback: Send + Sync {
    /// Returns the response to write in place of `response`.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError`] when the response cannot be rewritten.
    fn handle(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> Result<HttpResponse, CallbackError>;
}
