// crates/mockgate-core/src/core/action.rs
// ============================================================================
// Module: Mockgate Actions
// Description: Tagged union of behaviors an expectation can trigger.
// Purpose: Describe responses, templates, callbacks, forwards, and error injection.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Action`] is immutable configuration owned by an expectation. The
//! dispatcher reads it per request and never mutates it.
//! Invariants:
//! - Every variant except [`Action::Response`] exposes its scheduling delay via
//!   [`Action::delay`]; response delays are applied at write time instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::delay::Delay;
use crate::core::request::HttpRequest;
use crate::core::request::Scheme;
use crate::core::response::HttpResponse;

// ============================================================================
// SECTION: Action Kinds
// ============================================================================

/// Discriminant of an [`Action`], used for logging and dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Static response.
    Response,
    /// Response rendered from a template.
    ResponseTemplate,
    /// Response produced by a registered callback.
    ResponseClassCallback,
    /// Response produced by a remote callback client.
    ResponseObjectCallback,
    /// Forward to a static host.
    Forward,
    /// Forward a request rendered from a template.
    ForwardTemplate,
    /// Forward rewritten by a registered callback.
    ForwardClassCallback,
    /// Forward rewritten by a remote callback client.
    ForwardObjectCallback,
    /// Forward with request and response overrides.
    ForwardReplace,
    /// Connection-level error injection.
    Error,
}

impl ActionKind {
    /// Returns the stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Response => "RESPONSE",
            Self::ResponseTemplate => "RESPONSE_TEMPLATE",
            Self::ResponseClassCallback => "RESPONSE_CLASS_CALLBACK",
            Self::ResponseObjectCallback => "RESPONSE_OBJECT_CALLBACK",
            Self::Forward => "FORWARD",
            Self::ForwardTemplate => "FORWARD_TEMPLATE",
            Self::ForwardClassCallback => "FORWARD_CLASS_CALLBACK",
            Self::ForwardObjectCallback => "FORWARD_OBJECT_CALLBACK",
            Self::ForwardReplace => "FORWARD_REPLACE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Action Payloads
// ============================================================================

/// Template-driven action payload.
///
/// # Invariants
/// - `template_type` is kept as configured; it is resolved to an engine per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpTemplate {
    /// Template language tag (for example `JAVASCRIPT`, `VELOCITY`, `MUSTACHE`).
    pub template_type: String,
    /// Template source.
    pub template: String,
    /// Scheduling delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
}

impl HttpTemplate {
    /// Creates a template payload without a delay.
    #[must_use]
    pub fn new(template_type: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            template_type: template_type.into(),
            template: template.into(),
            delay: None,
        }
    }
}

/// Registered-callback action payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpClassCallback {
    /// Name the callback factory is registered under.
    pub callback_class: String,
    /// Scheduling delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
}

impl HttpClassCallback {
    /// Creates a class-callback payload without a delay.
    #[must_use]
    pub fn new(callback_class: impl Into<String>) -> Self {
        Self {
            callback_class: callback_class.into(),
            delay: None,
        }
    }
}

/// Remote-callback action payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpObjectCallback {
    /// Identifier of the connected callback client.
    pub client_id: String,
    /// For forwards, whether the client also rewrites the upstream response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_callback: Option<bool>,
    /// Scheduling delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
}

impl HttpObjectCallback {
    /// Creates an object-callback payload without a delay.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            response_callback: None,
            delay: None,
        }
    }
}

/// Static forward target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpForward {
    /// Target host.
    pub host: String,
    /// Target port; defaults to the scheme's port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Target scheme.
    #[serde(default)]
    pub scheme: Scheme,
    /// Scheduling delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
}

impl HttpForward {
    /// Creates a forward payload.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, scheme: Scheme) -> Self {
        Self {
            host: host.into(),
            port: Some(port),
            scheme,
            delay: None,
        }
    }

    /// Returns the explicit port or the scheme default.
    #[must_use]
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or_else(|| self.scheme.default_port())
    }
}

/// Forward with static request and response overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpOverrideForwardedRequest {
    /// Patch merged onto a clone of the inbound request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_override: Option<HttpRequest>,
    /// Patch merged onto the upstream response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_override: Option<HttpResponse>,
    /// Scheduling delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
}

/// Connection-level error injection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// Scheduling delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
    /// Whether the connection is closed after any bytes are written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_connection: Option<bool>,
    /// Raw bytes written to the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_bytes: Option<Vec<u8>>,
}

// ============================================================================
// SECTION: Action
// ============================================================================

/// Behavior triggered by a matched expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Static response.
    #[serde(rename = "httpResponse")]
    Response(HttpResponse),
    /// Response rendered from a template.
    #[serde(rename = "httpResponseTemplate")]
    ResponseTemplate(HttpTemplate),
    /// Response produced by a registered callback.
    #[serde(rename = "httpResponseClassCallback")]
    ResponseClassCallback(HttpClassCallback),
    /// Response produced by a remote callback client.
    #[serde(rename = "httpResponseObjectCallback")]
    ResponseObjectCallback(HttpObjectCallback),
    /// Forward to a static host.
    #[serde(rename = "httpForward")]
    Forward(HttpForward),
    /// Forward a request rendered from a template.
    #[serde(rename = "httpForwardTemplate")]
    ForwardTemplate(HttpTemplate),
    /// Forward rewritten by a registered callback.
    #[serde(rename = "httpForwardClassCallback")]
    ForwardClassCallback(HttpClassCallback),
    /// Forward rewritten by a remote callback client.
    #[serde(rename = "httpForwardObjectCallback")]
    ForwardObjectCallback(HttpObjectCallback),
    /// Forward with request and response overrides.
    #[serde(rename = "httpOverrideForwardedRequest")]
    ForwardReplace(HttpOverrideForwardedRequest),
    /// Connection-level error injection.
    #[serde(rename = "httpError")]
    Error(HttpError),
}

impl Action {
    /// Returns the action discriminant.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Response(_) => ActionKind::Response,
            Self::ResponseTemplate(_) => ActionKind::ResponseTemplate,
            Self::ResponseClassCallback(_) => ActionKind::ResponseClassCallback,
            Self::ResponseObjectCallback(_) => ActionKind::ResponseObjectCallback,
            Self::Forward(_) => ActionKind::Forward,
            Self::ForwardTemplate(_) => ActionKind::ForwardTemplate,
            Self::ForwardClassCallback(_) => ActionKind::ForwardClassCallback,
            Self::ForwardObjectCallback(_) => ActionKind::ForwardObjectCallback,
            Self::ForwardReplace(_) => ActionKind::ForwardReplace,
            Self::Error(_) => ActionKind::Error,
        }
    }

    /// Returns the delay applied when scheduling the action.
    ///
    /// Static responses return `None`: their delay belongs to the response and is applied
    /// when it is written.
    #[must_use]
    pub const fn delay(&self) -> Option<Delay> {
        match self {
            Self::Response(_) => None,
            Self::ResponseTemplate(template) | Self::ForwardTemplate(template) => template.delay,
            Self::ResponseClassCallback(callback) | Self::ForwardClassCallback(callback) => {
                callback.delay
            }
            Self::ResponseObjectCallback(callback) | Self::ForwardObjectCallback(callback) => {
                callback.delay
            }
            Self::Forward(forward) => forward.delay,
            Self::ForwardReplace(replace) => replace.delay,
            Self::Error(error) => error.delay,
        }
    }
}
