// crates/mockgate-dispatch/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Recording collaborators and local upstream servers for dispatch tests.
// Purpose: Observe dispatcher side effects without a real transport.
// Dependencies: mockgate-config, mockgate-core, mockgate-dispatch, tiny_http
// ============================================================================

//! ## Overview
//! Provides recording implementations of every collaborator trait the
//! dispatcher consumes, plus `tiny_http` and raw TCP upstreams bound to
//! `127.0.0.1:0`.

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::HashSet;
use std::io;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use mockgate_config::MockgateConfig;
use mockgate_core::Action;
use mockgate_core::ConnectionContext;
use mockgate_core::Expectation;
use mockgate_core::ExpectationDirectory;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;
use mockgate_core::LoopPreventionTag;
use mockgate_core::ResponseWriter;
use mockgate_dispatch::ActionDispatcher;
use mockgate_dispatch::ActionDispatcherBuilder;
use mockgate_dispatch::ActionEvent;
use mockgate_dispatch::EventKind;
use mockgate_dispatch::EventLevel;
use mockgate_dispatch::EventSink;
use mockgate_dispatch::ForwardError;
use mockgate_dispatch::RequestSender;
use mockgate_dispatch::ResponseFuture;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Loop-prevention header used by every test directory.
pub const LOOP_HEADER: &str = "x-forwarded-by";
/// Loop-prevention value used by every test directory.
pub const LOOP_VALUE: &str = "mockgate-test-instance";
/// Default wait for asynchronous outcomes.
pub const WAIT: Duration = Duration::from_secs(5);

/// Returns the tag used by test directories.
pub fn loop_tag() -> LoopPreventionTag {
    LoopPreventionTag::new(LOOP_HEADER, LOOP_VALUE)
}

// ============================================================================
// SECTION: Expectation Directory
// ============================================================================

/// Directory that returns one fixed expectation.
pub struct StaticDirectory {
    /// Expectation returned for every request.
    expectation: Option<Arc<Expectation>>,
    /// Loop-prevention tag of this instance.
    tag: LoopPreventionTag,
    /// Number of post-process calls.
    post_processed: AtomicUsize,
}

impl StaticDirectory {
    /// Creates a directory matching every request with `action`.
    pub fn with_action(action: Action) -> Arc<Self> {
        Arc::new(Self {
            expectation: Some(Arc::new(Expectation::new("expectation-1", action))),
            tag: loop_tag(),
            post_processed: AtomicUsize::new(0),
        })
    }

    /// Creates a directory that matches nothing.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            expectation: None,
            tag: loop_tag(),
            post_processed: AtomicUsize::new(0),
        })
    }

    /// Returns the number of post-process calls.
    pub fn post_processed(&self) -> usize {
        self.post_processed.load(Ordering::SeqCst)
    }
}

impl ExpectationDirectory for StaticDirectory {
    fn first_matching_expectation(&self, _request: &HttpRequest) -> Option<Arc<Expectation>> {
        self.expectation.clone()
    }

    fn post_process(&self, _expectation: &Expectation) {
        self.post_processed.fetch_add(1, Ordering::SeqCst);
    }

    fn loop_prevention_tag(&self) -> &LoopPreventionTag {
        &self.tag
    }
}

// ============================================================================
// SECTION: Response Writer
// ============================================================================

/// One recorded write.
#[derive(Debug, Clone)]
pub struct Written {
    /// Request being answered.
    pub request: HttpRequest,
    /// Response written.
    pub response: HttpResponse,
    /// Hop-by-hop flag passed by the dispatcher.
    pub hop_by_hop_stripped: bool,
    /// Write time.
    pub at: Instant,
}

/// Writer that records every response.
#[derive(Default)]
pub struct RecordingWriter {
    /// Writes in arrival order.
    written: Mutex<Vec<Written>>,
    /// Notified on every write.
    signal: Condvar,
}

impl RecordingWriter {
    /// Creates an empty writer.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a snapshot of the writes.
    pub fn written(&self) -> Vec<Written> {
        self.written.lock().unwrap().clone()
    }

    /// Waits until at least `count` responses were written.
    pub fn wait_for(&self, count: usize) -> Vec<Written> {
        let guard = self.written.lock().unwrap();
        let (guard, timeout) = self
            .signal
            .wait_timeout_while(guard, WAIT, |written| written.len() < count)
            .unwrap();
        assert!(!timeout.timed_out(), "expected {count} writes, saw {}", guard.len());
        guard.clone()
    }

    /// Waits for exactly one response and returns it.
    pub fn single(&self) -> HttpResponse {
        let written = self.wait_for(1);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(self.written().len(), 1, "expected exactly one write");
        written[0].response.clone()
    }
}

impl ResponseWriter for RecordingWriter {
    fn write_response(&self, request: &HttpRequest, response: HttpResponse, hop_by_hop_stripped: bool) {
        self.written.lock().unwrap().push(Written {
            request: request.clone(),
            response,
            hop_by_hop_stripped,
            at: Instant::now(),
        });
        self.signal.notify_all();
    }
}

// ============================================================================
// SECTION: Event Sink
// ============================================================================

/// Sink that records every event it is handed.
#[derive(Default)]
pub struct RecordingSink {
    /// Events in arrival order.
    events: Mutex<Vec<ActionEvent>>,
    /// Lowest level reported as enabled; every level when unset.
    minimum: Option<EventLevel>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a sink that reports levels below `minimum` as disabled.
    pub fn at_least(minimum: EventLevel) -> Arc<Self> {
        Arc::new(Self {
            minimum: Some(minimum),
            ..Self::default()
        })
    }

    /// Returns a snapshot of the events.
    pub fn events(&self) -> Vec<ActionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the events of `kind`.
    pub fn of_kind(&self, kind: EventKind) -> Vec<ActionEvent> {
        self.events().into_iter().filter(|event| event.kind == kind).collect()
    }

    /// Returns the events at `level`.
    pub fn at_level(&self, level: EventLevel) -> Vec<ActionEvent> {
        self.events().into_iter().filter(|event| event.level == level).collect()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &ActionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn enabled(&self, level: EventLevel) -> bool {
        self.minimum.is_none_or(|minimum| level >= minimum)
    }
}

// ============================================================================
// SECTION: Connection Context
// ============================================================================

/// Connection that records raw writes and closes.
#[derive(Default)]
pub struct RecordingConnection {
    /// Address reported as the proxied remote.
    proxied: Option<SocketAddr>,
    /// Raw bytes written.
    raw: Mutex<Vec<u8>>,
    /// Set once the connection is closed.
    closed: AtomicBool,
}

impl RecordingConnection {
    /// Creates a connection without a proxied remote.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a connection proxying to `address`.
    pub fn proxied_to(address: SocketAddr) -> Arc<Self> {
        Arc::new(Self {
            proxied: Some(address),
            ..Self::default()
        })
    }

    /// Returns the raw bytes written.
    pub fn raw(&self) -> Vec<u8> {
        self.raw.lock().unwrap().clone()
    }

    /// Returns true once the connection was closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ConnectionContext for RecordingConnection {
    fn proxied_remote_address(&self) -> Option<SocketAddr> {
        self.proxied
    }

    fn write_raw(&self, bytes: &[u8]) -> io::Result<()> {
        self.raw.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// SECTION: Request Sender
// ============================================================================

/// Sender that never touches the network and records what it was asked to send.
pub struct ScriptedSender {
    /// Outcome of the first send; later sends complete empty.
    outcome: Mutex<Option<Result<Option<HttpResponse>, ForwardError>>>,
    /// Requests, remotes, and connect timeouts seen.
    sent: Mutex<Vec<(HttpRequest, Option<SocketAddr>, Duration)>>,
}

impl ScriptedSender {
    /// Creates a sender completing its first send with `outcome`.
    pub fn answering(outcome: Result<Option<HttpResponse>, ForwardError>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(Some(outcome)),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Returns the sends observed.
    pub fn sent(&self) -> Vec<(HttpRequest, Option<SocketAddr>, Duration)> {
        self.sent.lock().unwrap().clone()
    }
}

impl RequestSender for ScriptedSender {
    fn send(
        &self,
        request: &HttpRequest,
        remote_address: Option<SocketAddr>,
        connect_timeout: Duration,
    ) -> Result<ResponseFuture, ForwardError> {
        self.sent.lock().unwrap().push((request.clone(), remote_address, connect_timeout));
        let outcome = self.outcome.lock().unwrap().take().unwrap_or(Ok(None));
        Ok(ResponseFuture::ready(outcome))
    }
}

// ============================================================================
// SECTION: Dispatcher Helpers
// ============================================================================

/// Starts a builder with a recording sink attached.
pub fn builder(directory: Arc<StaticDirectory>, sink: &Arc<RecordingSink>) -> ActionDispatcherBuilder {
    ActionDispatcher::builder(directory).event_sink(Arc::clone(sink) as Arc<dyn EventSink>)
}

/// Builds a dispatcher with default configuration.
pub fn dispatcher(directory: Arc<StaticDirectory>, sink: &Arc<RecordingSink>) -> ActionDispatcher {
    builder(directory, sink).build().unwrap()
}

/// Builds a dispatcher from a TOML configuration snippet.
pub fn dispatcher_with_config(
    directory: Arc<StaticDirectory>,
    sink: &Arc<RecordingSink>,
    toml: &str,
) -> ActionDispatcher {
    let config = MockgateConfig::from_toml_str(toml).unwrap();
    builder(directory, sink).config(config).build().unwrap()
}

/// Polls `check` until it holds or the default wait elapses.
pub fn eventually(check: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    check()
}

/// Host values that name this process.
pub fn local_addresses() -> HashSet<String> {
    ["localhost:1080".to_string(), "127.0.0.1:1080".to_string()].into_iter().collect()
}

/// Runs a request through the dispatcher synchronously.
pub fn process_sync(dispatcher: &ActionDispatcher, request: HttpRequest, writer: &Arc<RecordingWriter>) {
    dispatcher.process_action(
        request,
        Arc::clone(writer) as Arc<dyn ResponseWriter>,
        None,
        &local_addresses(),
        false,
        true,
    );
}

// ============================================================================
// SECTION: Upstream Servers
// ============================================================================

/// Request observed by a test upstream.
#[derive(Debug, Clone)]
pub struct Received {
    /// Request method.
    pub method: String,
    /// Request target.
    pub url: String,
    /// Headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Body as text.
    pub body: String,
}

impl Received {
    /// Returns the first value of header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Running `tiny_http` upstream.
pub struct Upstream {
    /// Listening address.
    pub address: SocketAddr,
    /// Requests served so far.
    pub received: Arc<Mutex<Vec<Received>>>,
    /// Server thread.
    handle: Option<JoinHandle<()>>,
}

impl Upstream {
    /// Returns the requests served so far.
    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    /// Returns `ip:port` for use as a `Host` value.
    pub fn host(&self) -> String {
        self.address.to_string()
    }

    /// Waits for the server thread to finish its request budget.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("upstream thread");
        }
    }
}

/// Serves `count` requests, echoing `x-test*` headers and the body with status 200.
pub fn echo_upstream(count: usize) -> Upstream {
    upstream(count, |received| {
        let headers = received
            .headers
            .iter()
            .filter(|(name, _)| name.to_ascii_lowercase().starts_with("x-test"))
            .cloned()
            .collect();
        (200, headers, received.body.clone())
    })
}

/// Serves `count` requests with responses produced by `respond`.
pub fn upstream<F>(count: usize, respond: F) -> Upstream
where
    F: Fn(&Received) -> (u16, Vec<(String, String)>, String) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("http server");
    let address = server.server_addr().to_ip().expect("ip listener");
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);
    let handle = std::thread::spawn(move || {
        for mut request in server.incoming_requests().take(count) {
            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let observed = Received {
                method: request.method().to_string(),
                url: request.url().to_string(),
                headers: request
                    .headers()
                    .iter()
                    .map(|header| (header.field.as_str().to_string(), header.value.as_str().to_string()))
                    .collect(),
                body,
            };
            let (status, headers, body) = respond(&observed);
            log.lock().unwrap().push(observed);
            let mut response = Response::from_string(body).with_status_code(status);
            for (name, value) in headers {
                response = response.with_header(Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap());
            }
            let _ = request.respond(response);
        }
    });
    Upstream {
        address,
        received,
        handle: Some(handle),
    }
}

/// Raw TCP upstream that accepts one connection and hands it to `behave`.
pub fn raw_upstream<F>(behave: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(std::net::TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("tcp listener");
    let address = listener.local_addr().expect("local addr");
    let handle = std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            behave(stream);
        }
    });
    (address, handle)
}

/// Upstream that reads the request head and closes without answering.
pub fn closing_upstream() -> (SocketAddr, JoinHandle<()>) {
    raw_upstream(|mut stream| {
        let mut buffer = [0_u8; 4096];
        let _ = stream.read(&mut buffer);
    })
}

/// Upstream that answers every connection with plaintext garbage.
pub fn plaintext_upstream() -> (SocketAddr, JoinHandle<()>) {
    raw_upstream(|mut stream| {
        let mut buffer = [0_u8; 4096];
        let _ = stream.read(&mut buffer);
        let _ = stream.write_all(b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\n\r\n");
    })
}

/// Upstream that reads the request and stays silent for `hold`.
pub fn silent_upstream(hold: Duration) -> (SocketAddr, JoinHandle<()>) {
    raw_upstream(move |mut stream| {
        let mut buffer = [0_u8; 4096];
        let _ = stream.read(&mut buffer);
        std::thread::sleep(hold);
    })
}

/// Returns a local address with nothing listening on it.
pub fn unused_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("tcp listener");
    listener.local_addr().expect("local addr")
}
