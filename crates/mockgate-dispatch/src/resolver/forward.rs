// crates/mockgate-dispatch/src/resolver/forward.rs
// ============================================================================
// Module: Forward Resolver
// Description: Base forwarding logic and the static `httpForward` resolver.
// Purpose: Send outbound requests and wrap them in forward results.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! [`Forwarder`] is shared by every forward-* resolver: it strips hop-by-hop
//! headers, stamps the loop-prevention tag, and invokes the request sender.
//! Invariants:
//! - Every outbound request carries the loop-prevention tag.
//! - Setup failures never escape; they become a not-found forward result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;

use mockgate_core::HopByHopFilter;
use mockgate_core::HttpForward;
use mockgate_core::HttpRequest;
use mockgate_core::LoopPreventionTag;
use mockgate_core::Scheme;
use mockgate_core::SocketAddress;

use crate::error::ForwardError;
use crate::forward_result::ForwardResult;
use crate::forward_result::ResponseOverride;
use crate::sender::RequestSender;
use crate::telemetry::ActionEvent;
use crate::telemetry::EventKind;
use crate::telemetry::EventLevel;
use crate::telemetry::EventSink;

// ============================================================================
// SECTION: Forwarder
// ============================================================================

/// Shared send logic for forward actions.
pub struct Forwarder {
    /// Outbound transport.
    sender: Arc<dyn RequestSender>,
    /// Header filter applied before sending.
    hop_by_hop: HopByHopFilter,
    /// Tag stamped on every outbound request.
    loop_tag: LoopPreventionTag,
    /// Connect timeout for forward actions.
    connect_timeout: Duration,
    /// Event sink.
    sink: Arc<dyn EventSink>,
}

impl Forwarder {
    /// Creates a forwarder.
    #[must_use]
    pub fn new(
        sender: Arc<dyn RequestSender>,
        loop_tag: LoopPreventionTag,
        connect_timeout: Duration,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            sender,
            hop_by_hop: HopByHopFilter,
            loop_tag,
            connect_timeout,
            sink,
        }
    }

    /// Sends `request` and wraps the pending response with `response_override`.
    #[must_use]
    pub fn send_request(
        &self,
        request: &HttpRequest,
        remote_address: Option<SocketAddr>,
        response_override: Option<ResponseOverride>,
    ) -> ForwardResult {
        let mut outbound = self.hop_by_hop.on_request(request);
        self.loop_tag.stamp(&mut outbound.headers);
        match self.sender.send(&outbound, remote_address, self.connect_timeout) {
            Ok(response) => {
                let result = ForwardResult::new(outbound, response, remote_address);
                match response_override {
                    Some(apply) => result.with_override(apply),
                    None => result,
                }
            }
            Err(err) => {
                self.record_setup_failure(&outbound, &err);
                ForwardResult::not_found(outbound)
            }
        }
    }

    /// Records a failure that happened before the request was sent.
    fn record_setup_failure(&self, request: &HttpRequest, err: &ForwardError) {
        self.sink.record(
            &ActionEvent::new(EventKind::Exception, EventLevel::Error, "exception forwarding request")
                .with_request(request)
                .with_error(err.to_string()),
        );
    }
}

// ============================================================================
// SECTION: Static Forward
// ============================================================================

/// Resolver for static forwards.
pub struct ForwardResolver {
    /// Base forwarding logic.
    forwarder: Arc<Forwarder>,
    /// Event sink.
    sink: Arc<dyn EventSink>,
}

impl ForwardResolver {
    /// Creates the resolver.
    #[must_use]
    pub fn new(forwarder: Arc<Forwarder>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            forwarder,
            sink,
        }
    }

    /// Forwards `request` to the configured host and port.
    #[must_use]
    pub fn resolve(&self, forward: &HttpForward, request: &HttpRequest) -> ForwardResult {
        let port = forward.port_or_default();
        let outbound = request
            .clone()
            .with_secure(forward.scheme == Scheme::Https)
            .with_socket_address(SocketAddress::new(forward.host.clone(), port, forward.scheme));
        match resolve_address(&forward.host, port) {
            Ok(address) => self.forwarder.send_request(&outbound, Some(address), None),
            Err(err) => {
                self.sink.record(
                    &ActionEvent::new(EventKind::Exception, EventLevel::Error, "exception forwarding request")
                        .with_request(&outbound)
                        .with_error(err.to_string()),
                );
                ForwardResult::not_found(outbound)
            }
        }
    }
}

/// Resolves `host:port` to its first socket address.
fn resolve_address(host: &str, port: u16) -> Result<SocketAddr, ForwardError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|err| ForwardError::Resolve(format!("{host}:{port}: {err}")))?
        .next()
        .ok_or_else(|| ForwardError::Resolve(format!("{host}:{port}: no addresses")))
}
