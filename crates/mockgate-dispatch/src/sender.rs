// crates/mockgate-dispatch/src/sender.rs
// ============================================================================
// Module: Remote Request Sender
// Description: Outbound HTTP/1.1 client used by forward actions and proxying.
// Purpose: Send a request to a resolved address and expose the response as a future.
// Dependencies: bytes, http-body-util, hyper, hyper-util, mockgate-core, rustls,
//               tokio, tokio-rustls, tracing, webpki-roots
// ============================================================================

//! ## Overview
//! [`RequestSender`] is the seam between the dispatcher and the network.
//! [`HyperRequestSender`] opens one connection per request on the scheduler
//! runtime, optionally wraps it in TLS, and performs a single HTTP/1.1
//! exchange.
//! Invariants:
//! - Errors detected before the exchange starts are returned synchronously;
//!   everything after is delivered through the [`ResponseFuture`].
//! - An exchange keeps running after the caller stops waiting; its result is
//!   then discarded.
//! - Upstream responses never carry hop-by-hop headers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as StdError;
use std::io;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use mockgate_core::Body;
use mockgate_core::Cookie;
use mockgate_core::Headers;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;
use mockgate_core::core::hop_by_hop::strip_hop_by_hop;
use mockgate_core::core::request::HOST_HEADER;
use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error::DispatcherError;
use crate::error::ForwardError;
use crate::forward_result::ResponseFuture;
use crate::scheduler::SchedulerHandle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the `Content-Length` header.
const CONTENT_LENGTH_HEADER: &str = "Content-Length";
/// Name of the `Content-Type` header.
const CONTENT_TYPE_HEADER: &str = "Content-Type";
/// Name of the `Cookie` header.
const COOKIE_HEADER: &str = "Cookie";

// ============================================================================
// SECTION: Sender Trait
// ============================================================================

/// Sends outbound requests.
pub trait RequestSender: Send + Sync {
    /// Starts sending `request`.
    ///
    /// The target is `remote_address` when given, else the request's declared socket
    /// address, else its `Host` header.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError`] when the request cannot be prepared; failures after the
    /// exchange starts complete the returned future instead.
    fn send(
        &self,
        request: &HttpRequest,
        remote_address: Option<SocketAddr>,
        connect_timeout: Duration,
    ) -> Result<ResponseFuture, ForwardError>;
}

// ============================================================================
// SECTION: Hyper Sender
// ============================================================================

/// [`RequestSender`] backed by hyper's HTTP/1.1 client connection.
pub struct HyperRequestSender {
    /// Runtime that drives connections.
    scheduler: SchedulerHandle,
    /// TLS settings for secure requests.
    tls: TlsConnector,
}

impl HyperRequestSender {
    /// Creates a sender that trusts the bundled web PKI roots.
    ///
    /// # Errors
    ///
    /// Returns [`DispatcherError::Tls`] when the TLS configuration cannot be built.
    pub fn new(scheduler: SchedulerHandle) -> Result<Self, DispatcherError> {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::aws_lc_rs::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|err| DispatcherError::Tls(err.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
        Ok(Self::with_tls_config(scheduler, Arc::new(config)))
    }

    /// Creates a sender with a caller-provided TLS configuration.
    #[must_use]
    pub fn with_tls_config(scheduler: SchedulerHandle, config: Arc<ClientConfig>) -> Self {
        Self {
            scheduler,
            tls: TlsConnector::from(config),
        }
    }
}

impl RequestSender for HyperRequestSender {
    fn send(
        &self,
        request: &HttpRequest,
        remote_address: Option<SocketAddr>,
        connect_timeout: Duration,
    ) -> Result<ResponseFuture, ForwardError> {
        let target = Target::resolve(request, remote_address)?;
        let outbound = build_request(request, &target)?;
        let tls = request.is_secure().then(|| self.tls.clone());
        let (completer, future) = ResponseFuture::pending();
        self.scheduler.spawn(async move {
            let outcome = exchange(target, outbound, tls, connect_timeout).await.map(Some);
            completer.complete(outcome);
        });
        Ok(future)
    }
}

// ============================================================================
// SECTION: Target Resolution
// ============================================================================

/// Where an outbound request is sent.
#[derive(Debug, Clone)]
struct Target {
    /// Host used for DNS, SNI, and the `Host` header.
    host: String,
    /// Target port.
    port: u16,
    /// Pre-resolved address, skipping DNS.
    address: Option<SocketAddr>,
}

impl Target {
    /// Picks the target from the remote address, declared address, or `Host` header.
    ///
    /// With a remote address the connection goes there, but the host name
    /// (used for SNI and certificate checks) still comes from the declared
    /// address first, then the `Host` header.
    fn resolve(request: &HttpRequest, remote: Option<SocketAddr>) -> Result<Self, ForwardError> {
        let default_port = if request.is_secure() { 443 } else { 80 };
        let header_target = request.host().map(|host| split_host_port(host, default_port));
        if let Some(address) = remote {
            let host = match (&request.socket_address, header_target) {
                (Some(declared), _) => declared.host.clone(),
                (None, Some((host, _))) => host,
                (None, None) => address.ip().to_string(),
            };
            return Ok(Self {
                host,
                port: address.port(),
                address: Some(address),
            });
        }
        if let Some(declared) = &request.socket_address {
            return Ok(Self {
                host: declared.host.clone(),
                port: declared.port,
                address: None,
            });
        }
        match header_target {
            Some((host, port)) => Ok(Self {
                host,
                port,
                address: None,
            }),
            None => Err(ForwardError::Resolve(
                "request has no remote address, socket address, or Host header".to_string(),
            )),
        }
    }

    /// Returns `host:port` for diagnostics and the `Host` header.
    fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Resolves the socket address to connect to.
    async fn socket_address(&self) -> Result<SocketAddr, ForwardError> {
        if let Some(address) = self.address {
            return Ok(address);
        }
        if let Ok(ip) = self.host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|err| ForwardError::Resolve(format!("{}: {err}", self.host)))?
            .next()
            .ok_or_else(|| ForwardError::Resolve(format!("{}: no addresses", self.host)))
    }
}

/// Splits a `Host` header value into host and port.
fn split_host_port(value: &str, default_port: u16) -> (String, u16) {
    let value = value.trim();
    if let Some((host, tail)) = value.strip_prefix('[').and_then(|rest| rest.split_once(']')) {
        let port = tail.strip_prefix(':').and_then(|port| port.parse().ok());
        return (host.to_string(), port.unwrap_or(default_port));
    }
    match value.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (value.to_string(), default_port),
        },
        _ => (value.to_string(), default_port),
    }
}

// ============================================================================
// SECTION: Exchange
// ============================================================================

/// Converts a domain request into a hyper request.
fn build_request(
    request: &HttpRequest,
    target: &Target,
) -> Result<hyper::Request<Full<Bytes>>, ForwardError> {
    let method = hyper::Method::from_bytes(request.method_or_default().as_bytes())
        .map_err(|err| ForwardError::InvalidRequest(err.to_string()))?;
    let mut builder = hyper::Request::builder().method(method).uri(request.path_and_query());
    let mut headers = request.headers.clone();
    headers.remove(CONTENT_LENGTH_HEADER);
    if request.host().is_none() {
        headers.remove(HOST_HEADER);
        headers.append(HOST_HEADER, target.authority());
    }
    if !request.cookies.is_empty() && !headers.contains(COOKIE_HEADER) {
        headers.append(COOKIE_HEADER, render_cookies(&request.cookies));
    }
    for header in headers.iter() {
        for value in &header.values {
            builder = builder.header(header.name.as_str(), value.as_str());
        }
    }
    let body = request.body.as_ref().map_or_else(Bytes::new, |body| Bytes::copy_from_slice(body.as_bytes()));
    builder.body(Full::new(body)).map_err(|err| ForwardError::InvalidRequest(err.to_string()))
}

/// Renders cookies as a `Cookie` header value.
fn render_cookies(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|cookie| format!("{}={}", cookie.name, cookie.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Connects, optionally negotiates TLS, and performs the exchange.
async fn exchange(
    target: Target,
    request: hyper::Request<Full<Bytes>>,
    tls: Option<TlsConnector>,
    connect_timeout: Duration,
) -> Result<HttpResponse, ForwardError> {
    let address = target.socket_address().await?;
    let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => return Err(classify_io(&err, &address.to_string())),
        Err(_) => {
            return Err(ForwardError::ConnectTimeout {
                address: address.to_string(),
                timeout_ms: connect_timeout.as_millis(),
            });
        }
    };
    match tls {
        None => send_over(stream, request).await,
        Some(connector) => {
            let server_name = ServerName::try_from(target.host.clone()).map_err(|err| {
                ForwardError::TlsHandshake {
                    address: address.to_string(),
                    reason: err.to_string(),
                }
            })?;
            let stream = connector.connect(server_name, stream).await.map_err(|err| {
                ForwardError::TlsHandshake {
                    address: address.to_string(),
                    reason: err.to_string(),
                }
            })?;
            send_over(stream, request).await
        }
    }
}

/// Runs one HTTP/1.1 exchange over an established stream.
async fn send_over<S>(stream: S, request: hyper::Request<Full<Bytes>>) -> Result<HttpResponse, ForwardError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) =
        http1::handshake(TokioIo::new(stream)).await.map_err(|err| classify_hyper(&err))?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            tracing::debug!(error = %err, "upstream connection closed with error");
        }
    });
    let response = sender.send_request(request).await.map_err(|err| classify_hyper(&err))?;
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.map_err(|err| classify_hyper(&err))?.to_bytes();
    Ok(convert_response(&parts, bytes))
}

/// Converts hyper response parts into the domain response.
fn convert_response(parts: &hyper::http::response::Parts, bytes: Bytes) -> HttpResponse {
    let mut headers = Headers::new();
    for (name, value) in &parts.headers {
        headers.append(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    strip_hop_by_hop(&mut headers);
    let reason_phrase = parts
        .extensions
        .get::<hyper::ext::ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
        .or_else(|| parts.status.canonical_reason().map(str::to_string));
    let content_type = headers.first(CONTENT_TYPE_HEADER).map(str::to_string);
    let body = (!bytes.is_empty()).then(|| Body::from_bytes(bytes.to_vec(), content_type));
    HttpResponse {
        status_code: Some(parts.status.as_u16()),
        reason_phrase,
        headers,
        cookies: Vec::new(),
        body,
        delay: None,
    }
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

/// Maps an I/O error to a forwarding failure.
fn classify_io(err: &io::Error, address: &str) -> ForwardError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::AddrNotAvailable => ForwardError::Connect {
            address: address.to_string(),
            reason: err.to_string(),
        },
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => ForwardError::ConnectionClosed(err.to_string()),
        _ => ForwardError::SocketCommunication(err.to_string()),
    }
}

/// Maps a hyper error to a forwarding failure.
fn classify_hyper(err: &hyper::Error) -> ForwardError {
    if err.is_incomplete_message() || err.is_closed() || err.is_canceled() {
        return ForwardError::ConnectionClosed(err.to_string());
    }
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return classify_io(io_err, "upstream");
        }
        source = cause.source();
    }
    ForwardError::SocketCommunication(err.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
