// crates/mockgate-dispatch/src/dispatcher.rs
// ============================================================================
// Module: Action Dispatcher
// Description: Orchestrates expectation actions, transparent proxying, and fallbacks.
// Purpose: Guarantee exactly one outcome for every inbound request.
// Dependencies: mockgate-config, mockgate-core, tokio
// ============================================================================

//! ## Overview
//! [`ActionDispatcher::process_action`] looks up the matching expectation,
//! schedules the resolver for its action, and writes the result through the
//! caller's [`ResponseWriter`]. Unmatched requests are answered as CORS
//! preflights, proxied upstream, or given the synthetic not-found response.
//! Invariants:
//! - Exactly one response write happens per request, except for error actions,
//!   which act on the connection instead.
//! - The expectation post-processing hook runs at most once, only after the
//!   action succeeded, and never on a fallback path.
//! - Requests carrying this process's loop-prevention tag are never proxied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::time::Duration;

use mockgate_config::MockgateConfig;
use mockgate_core::Action;
use mockgate_core::ActionKind;
use mockgate_core::ConnectionContext;
use mockgate_core::Expectation;
use mockgate_core::ExpectationDirectory;
use mockgate_core::ExpectationId;
use mockgate_core::HopByHopFilter;
use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;
use mockgate_core::ResponseWriter;
use mockgate_core::TemplateEngine;
use mockgate_core::to_curl;
use tokio::runtime::Handle;

use crate::callback::CallbackRegistry;
use crate::error::DispatcherError;
use crate::error::ForwardError;
use crate::error::ResolveError;
use crate::forward_result::ForwardResult;
use crate::forward_result::ResponseFuture;
use crate::forward_result::ResponseOverride;
use crate::forward_result::finish_response;
use crate::object_callback::CallbackReply;
use crate::object_callback::ObjectCallbackChannel;
use crate::object_callback::ReplyTarget;
use crate::proxy_auth::ProxyAuthenticator;
use crate::resolver::Forwarder;
use crate::resolver::ResolverContext;
use crate::resolver::Resolvers;
use crate::resolver::forward_class_callback::guarded_override;
use crate::scheduler::Scheduler;
use crate::scheduler::SchedulerHandle;
use crate::scheduler::panic_message;
use crate::sender::HyperRequestSender;
use crate::sender::RequestSender;
use crate::telemetry::ActionEvent;
use crate::telemetry::EventKind;
use crate::telemetry::EventLevel;
use crate::telemetry::EventSink;
use crate::telemetry::TracingEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header naming the origin of a CORS request.
const ORIGIN_HEADER: &str = "Origin";
/// Header naming the method of a CORS preflight.
const ACCESS_CONTROL_REQUEST_METHOD_HEADER: &str = "Access-Control-Request-Method";
/// Diagnostic for connect failures during forward actions.
const FORWARD_CONNECT_FAILURE: &str = "failed to connect to remote socket while forwarding request";
/// Diagnostic for TLS failures during forward actions.
const FORWARD_TLS_FAILURE: &str = "TLS handshake exception while forwarding request";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Configuration values read on every request.
#[derive(Debug, Clone, Copy)]
struct DispatchSettings {
    /// CORS preflights are answered.
    cors_enabled: bool,
    /// Unmatched third-party requests are proxied.
    attempt_to_proxy: bool,
    /// Connect timeout for explicit proxying.
    socket_connection_timeout: Duration,
    /// Connect timeout for opportunistic proxying.
    opportunistic_connect_timeout: Duration,
    /// Bound on waiting for a forwarded response.
    max_future_timeout: Duration,
}

impl DispatchSettings {
    /// Extracts the settings from the configuration.
    fn from_config(config: &MockgateConfig) -> Self {
        Self {
            cors_enabled: config.cors.enabled(),
            attempt_to_proxy: config.proxy.attempt_to_proxy_if_no_matching_expectation,
            socket_connection_timeout: config.timeouts.socket_connection_timeout(),
            opportunistic_connect_timeout: config.timeouts.opportunistic_proxy_connect_timeout(),
            max_future_timeout: config.timeouts.max_future_timeout(),
        }
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`ActionDispatcher`].
pub struct ActionDispatcherBuilder {
    /// Expectation source.
    directory: Arc<dyn ExpectationDirectory>,
    /// Dispatcher configuration.
    config: MockgateConfig,
    /// Template renderer.
    templates: Option<Arc<dyn TemplateEngine>>,
    /// Class-callback registry.
    callbacks: Arc<CallbackRegistry>,
    /// Remote callback transport.
    channel: Option<Arc<dyn ObjectCallbackChannel>>,
    /// Event sink.
    sink: Arc<dyn EventSink>,
    /// Outbound transport override.
    sender: Option<Arc<dyn RequestSender>>,
    /// Existing runtime to run on instead of a dedicated one.
    runtime: Option<Handle>,
}

impl ActionDispatcherBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: MockgateConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the template renderer.
    #[must_use]
    pub fn template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(engine);
        self
    }

    /// Sets the class-callback registry.
    #[must_use]
    pub fn callback_registry(mut self, registry: CallbackRegistry) -> Self {
        self.callbacks = Arc::new(registry);
        self
    }

    /// Sets the remote callback transport.
    #[must_use]
    pub fn object_callback_channel(mut self, channel: Arc<dyn ObjectCallbackChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the outbound transport.
    #[must_use]
    pub fn request_sender(mut self, sender: Arc<dyn RequestSender>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Runs dispatch work on an existing runtime.
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the dispatcher and every resolver.
    ///
    /// # Errors
    ///
    /// Returns [`DispatcherError`] when the scheduler or the TLS client cannot be created.
    pub fn build(self) -> Result<ActionDispatcher, DispatcherError> {
        let scheduler = match self.runtime {
            Some(runtime) => Scheduler::from_handle(runtime, Arc::clone(&self.sink)),
            None => Scheduler::new(self.config.scheduler.action_handler_thread_count, Arc::clone(&self.sink))?,
        };
        let handle = scheduler.handle().clone();
        let sender: Arc<dyn RequestSender> = match self.sender {
            Some(sender) => sender,
            None => Arc::new(HyperRequestSender::new(handle.clone())?),
        };
        let forwarder = Arc::new(Forwarder::new(
            Arc::clone(&sender),
            self.directory.loop_prevention_tag().clone(),
            self.config.timeouts.socket_connection_timeout(),
            Arc::clone(&self.sink),
        ));
        let resolvers = Resolvers::new(&ResolverContext {
            forwarder,
            templates: self.templates,
            callbacks: self.callbacks,
            channel: self.channel,
            sink: Arc::clone(&self.sink),
        });
        let inner = DispatcherInner {
            settings: DispatchSettings::from_config(&self.config),
            proxy_auth: ProxyAuthenticator::from_config(&self.config.proxy),
            directory: self.directory,
            scheduler: handle,
            sink: self.sink,
            resolvers,
            sender,
            hop_by_hop: HopByHopFilter,
        };
        Ok(ActionDispatcher {
            inner: Arc::new(inner),
            _scheduler: scheduler,
        })
    }
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Entry point that turns inbound requests into exactly one outcome each.
pub struct ActionDispatcher {
    /// State shared with scheduled work.
    inner: Arc<DispatcherInner>,
    /// Owner of the dispatch runtime; shut down on drop.
    _scheduler: Scheduler,
}

impl ActionDispatcher {
    /// Starts building a dispatcher over `directory` with default configuration.
    #[must_use]
    pub fn builder(directory: Arc<dyn ExpectationDirectory>) -> ActionDispatcherBuilder {
        ActionDispatcherBuilder {
            directory,
            config: MockgateConfig::default(),
            templates: None,
            callbacks: Arc::new(CallbackRegistry::new()),
            channel: None,
            sink: Arc::new(TracingEventSink),
            sender: None,
            runtime: None,
        }
    }

    /// Handles one inbound request.
    ///
    /// `local_addresses` lists the `Host` values that name this process. `proxying` marks
    /// requests received on an explicit proxy connection. With `synchronous` the calling
    /// thread blocks until the outcome has been written.
    pub fn process_action(
        &self,
        request: HttpRequest,
        writer: Arc<dyn ResponseWriter>,
        connection: Option<Arc<dyn ConnectionContext>>,
        local_addresses: &HashSet<String>,
        proxying: bool,
        synchronous: bool,
    ) {
        let inner = &self.inner;
        let loop_tagged = inner.directory.loop_prevention_tag().is_on_request(&request);
        if !loop_tagged {
            inner.record_lazily(EventLevel::Info, || {
                ActionEvent::new(EventKind::ReceivedRequest, EventLevel::Info, "received request")
                    .with_request(&request)
            });
        }
        let expectation = inner.directory.first_matching_expectation(&request);
        let potentially_http_proxy = !proxying
            && inner.settings.attempt_to_proxy
            && request.host().is_some_and(|host| !local_addresses.contains(host));

        if let Some((expectation, action)) =
            expectation.and_then(|expectation| expectation.action.clone().map(|action| (expectation, action)))
        {
            let exchange = Exchange {
                expectation_id: Some(expectation.id.clone()),
                request,
                writer,
                synchronous,
            };
            inner.dispatch(expectation, action, exchange, connection);
        } else if inner.settings.cors_enabled && is_cors_preflight(&request) {
            writer.write_response(&request, HttpResponse::ok(), false);
            inner.record_lazily(EventLevel::Info, || {
                ActionEvent::new(EventKind::CorsResponse, EventLevel::Info, "returning CORS response for OPTIONS request")
                    .with_request(&request)
                    .with_status(HttpResponse::ok().status())
            });
        } else if proxying || potentially_http_proxy {
            if loop_tagged {
                inner.record_lazily(EventLevel::Trace, || {
                    ActionEvent::new(
                        EventKind::Trace,
                        EventLevel::Trace,
                        "received loop-prevention header, caused by exploratory proxy or proxy loop, falling back to not found",
                    )
                    .correlated(&request)
                });
                inner.return_not_found(writer.as_ref(), &request, None);
                return;
            }
            let unauthorized = inner
                .proxy_auth
                .as_ref()
                .filter(|auth| potentially_http_proxy && !auth.is_authorized(&request));
            if let Some(auth) = unauthorized {
                let challenge = auth.challenge();
                inner.record_lazily(EventLevel::Info, || {
                    ActionEvent::new(
                        EventKind::AuthenticationFailed,
                        EventLevel::Info,
                        "proxy authentication failed, returning authentication challenge",
                    )
                    .with_request(&request)
                    .with_status(challenge.status())
                });
                writer.write_response(&request, challenge, false);
                return;
            }
            let exchange = Exchange {
                request,
                writer,
                expectation_id: None,
                synchronous,
            };
            inner.proxy(exchange, connection.as_deref(), potentially_http_proxy);
        } else {
            inner.return_not_found(writer.as_ref(), &request, None);
        }
    }

    /// Writes the synthetic not-found response, optionally with a diagnostic.
    pub fn return_not_found(&self, writer: &dyn ResponseWriter, request: &HttpRequest, error: Option<&str>) {
        self.inner.return_not_found(writer, request, error);
    }

    /// Writes a resolved response after the response's own delay.
    pub fn write_response_action_response(
        &self,
        response: HttpResponse,
        writer: Arc<dyn ResponseWriter>,
        request: HttpRequest,
        action: &Action,
        synchronous: bool,
    ) {
        let exchange = Exchange {
            request,
            writer,
            expectation_id: None,
            synchronous,
        };
        self.inner.write_response_action_response(response, exchange, action.kind());
    }

    /// Writes the response of a forward once it resolves or the bounded wait expires.
    pub fn write_forward_action_response(
        &self,
        result: ForwardResult,
        writer: Arc<dyn ResponseWriter>,
        request: HttpRequest,
        synchronous: bool,
    ) {
        let exchange = Exchange {
            request,
            writer,
            expectation_id: None,
            synchronous,
        };
        self.inner.write_forward_action_response(result, exchange);
    }

    /// Returns the scheduler handle used for dispatch work.
    #[must_use]
    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.inner.scheduler
    }
}

// ============================================================================
// SECTION: Exchange
// ============================================================================

/// Per-request values carried through scheduled work.
#[derive(Clone)]
struct Exchange {
    /// Inbound request.
    request: HttpRequest,
    /// Writer answering the inbound request.
    writer: Arc<dyn ResponseWriter>,
    /// Matched expectation, for diagnostics.
    expectation_id: Option<ExpectationId>,
    /// Whether work runs on the calling thread.
    synchronous: bool,
}

impl Exchange {
    /// Starts an event about this exchange.
    fn event(&self, kind: EventKind, level: EventLevel, message: impl Into<String>) -> ActionEvent {
        let event = ActionEvent::new(kind, level, message).with_request(&self.request);
        match &self.expectation_id {
            Some(id) => event.with_expectation(id),
            None => event,
        }
    }
}

/// Whether the post-processing hook runs after an action succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostProcess {
    /// The dispatcher runs the hook.
    Run,
    /// A callback reply owns the hook.
    Delegated,
}

// ============================================================================
// SECTION: Shared State
// ============================================================================

/// State shared between the dispatcher and scheduled work.
struct DispatcherInner {
    /// Expectation source.
    directory: Arc<dyn ExpectationDirectory>,
    /// Configuration values.
    settings: DispatchSettings,
    /// Proxy credential check, when configured.
    proxy_auth: Option<ProxyAuthenticator>,
    /// Scheduler handle.
    scheduler: SchedulerHandle,
    /// Event sink.
    sink: Arc<dyn EventSink>,
    /// One resolver per action kind.
    resolvers: Resolvers,
    /// Outbound transport for proxying.
    sender: Arc<dyn RequestSender>,
    /// Header filter for proxying.
    hop_by_hop: HopByHopFilter,
}

impl DispatcherInner {
    /// Records an event.
    fn record(&self, event: ActionEvent) {
        self.sink.record(&event);
    }

    /// Builds and records an event only when the sink accepts `level`.
    fn record_lazily(&self, level: EventLevel, build: impl FnOnce() -> ActionEvent) {
        if self.sink.enabled(level) {
            self.sink.record(&build());
        }
    }

    /// Schedules the action of a matched expectation.
    fn dispatch(
        self: &Arc<Self>,
        expectation: Arc<Expectation>,
        action: Action,
        exchange: Exchange,
        connection: Option<Arc<dyn ConnectionContext>>,
    ) {
        let delay = action.delay();
        let synchronous = exchange.synchronous;
        let inner = Arc::clone(self);
        self.scheduler.schedule(
            move || inner.run_action(&expectation, &action, &exchange, connection.as_deref()),
            synchronous,
            delay,
        );
    }

    /// Runs an action, falling back to not-found on failure.
    fn run_action(
        self: &Arc<Self>,
        expectation: &Arc<Expectation>,
        action: &Action,
        exchange: &Exchange,
        connection: Option<&dyn ConnectionContext>,
    ) {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.execute(expectation, action, exchange, connection)));
        match outcome {
            Ok(Ok(PostProcess::Run)) => self.directory.post_process(expectation),
            Ok(Ok(PostProcess::Delegated)) => {}
            Ok(Err(err)) => self.action_failed(exchange, action.kind(), &err.to_string(), err.is_configuration()),
            Err(payload) => self.action_failed(exchange, action.kind(), &panic_message(payload.as_ref()), false),
        }
    }

    /// Records an action failure and writes not-found.
    fn action_failed(&self, exchange: &Exchange, kind: ActionKind, error: &str, configuration: bool) {
        let (event_kind, level) = if configuration {
            (EventKind::Exception, EventLevel::Error)
        } else {
            (EventKind::Warn, EventLevel::Warn)
        };
        self.record(
            exchange
                .event(event_kind, level, format!("exception processing {kind} action"))
                .with_error(error),
        );
        self.return_not_found(exchange.writer.as_ref(), &exchange.request, None);
    }

    /// Resolves an action and writes its outcome.
    fn execute(
        self: &Arc<Self>,
        expectation: &Arc<Expectation>,
        action: &Action,
        exchange: &Exchange,
        connection: Option<&dyn ConnectionContext>,
    ) -> Result<PostProcess, ResolveError> {
        let request = &exchange.request;
        let resolvers = &self.resolvers;
        match action {
            Action::Response(response) => {
                let response = resolvers.response.resolve(response);
                self.write_response_action_response(response, exchange.clone(), action.kind());
            }
            Action::ResponseTemplate(template) => {
                let response = resolvers.response_template.resolve(template, request)?;
                self.write_response_action_response(response, exchange.clone(), action.kind());
            }
            Action::ResponseClassCallback(callback) => {
                let response = resolvers.response_class_callback.resolve(callback, request)?;
                self.write_response_action_response(response, exchange.clone(), action.kind());
            }
            Action::ResponseObjectCallback(callback) => {
                let reply = self.reply(expectation, exchange, action.kind());
                resolvers.response_object_callback.resolve(callback, request, reply);
                return Ok(PostProcess::Delegated);
            }
            Action::Forward(forward) => {
                let result = resolvers.forward.resolve(forward, request);
                self.write_forward_action_response(result, exchange.clone());
            }
            Action::ForwardTemplate(template) => {
                let result = resolvers.forward_template.resolve(template, request)?;
                self.write_forward_action_response(result, exchange.clone());
            }
            Action::ForwardClassCallback(callback) => {
                let result = resolvers.forward_class_callback.resolve(callback, request)?;
                self.write_forward_action_response(result, exchange.clone());
            }
            Action::ForwardObjectCallback(callback) => {
                let reply = self.reply(expectation, exchange, action.kind());
                resolvers.forward_object_callback.resolve(callback, request, reply);
                return Ok(PostProcess::Delegated);
            }
            Action::ForwardReplace(replace) => {
                let result = resolvers.forward_replace.resolve(replace, request);
                self.write_forward_action_response(result, exchange.clone());
            }
            Action::Error(error) => {
                resolvers.error.resolve(error, connection)?;
                self.record(exchange.event(EventKind::ExpectationResponse, EventLevel::Info, "returning error"));
            }
        }
        Ok(PostProcess::Run)
    }

    /// Creates the reply handle for an object-callback action.
    fn reply(self: &Arc<Self>, expectation: &Arc<Expectation>, exchange: &Exchange, kind: ActionKind) -> CallbackReply {
        CallbackReply::new(Box::new(DispatcherReply {
            inner: Arc::clone(self),
            expectation: Arc::clone(expectation),
            exchange: exchange.clone(),
            kind,
        }))
    }

    /// Writes a resolved response after the response's own delay.
    fn write_response_action_response(self: &Arc<Self>, response: HttpResponse, exchange: Exchange, kind: ActionKind) {
        let delay = response.delay;
        let synchronous = exchange.synchronous;
        let inner = Arc::clone(self);
        self.scheduler.schedule(
            move || {
                inner.record_lazily(EventLevel::Info, || {
                    exchange
                        .event(
                            EventKind::ExpectationResponse,
                            EventLevel::Info,
                            format!("returning response for request for action {kind}"),
                        )
                        .with_status(response.status())
                });
                exchange.writer.write_response(&exchange.request, response, false);
            },
            synchronous,
            delay,
        );
    }

    /// Writes a forwarded response once it resolves.
    fn write_forward_action_response(self: &Arc<Self>, result: ForwardResult, exchange: Exchange) {
        let ForwardResult {
            request: outbound,
            response,
            response_override,
            remote_address,
        } = result;
        let synchronous = exchange.synchronous;
        let inner = Arc::clone(self);
        self.scheduler.on_completion(
            response,
            self.settings.max_future_timeout,
            move |outcome| match outcome {
                Ok(upstream) => {
                    let response = finish_response(&outbound, upstream, response_override);
                    inner.record_lazily(EventLevel::Info, || {
                        exchange
                            .event(EventKind::ForwardedRequest, EventLevel::Info, "returning response for forwarded request")
                            .with_status(response.status())
                            .with_curl(to_curl(&outbound, remote_address))
                    });
                    exchange.writer.write_response(&exchange.request, response, false);
                }
                Err(err) => inner.forward_failed(&exchange, remote_address, &err),
            },
            synchronous,
        );
    }

    /// Classifies a failed forward action and writes not-found.
    fn forward_failed(&self, exchange: &Exchange, remote_address: Option<SocketAddr>, err: &ForwardError) {
        let address = describe_address(&exchange.request, remote_address);
        let diagnostic = if err.is_connection_failure() {
            self.record(exchange.event(EventKind::Exception, EventLevel::Error, FORWARD_CONNECT_FAILURE).with_error(err.to_string()));
            FORWARD_CONNECT_FAILURE.to_string()
        } else if err.is_tls_handshake() {
            self.record(
                exchange
                    .event(
                        EventKind::Exception,
                        EventLevel::Error,
                        format!("TLS handshake exception while forwarding request to remote address {address}"),
                    )
                    .with_error(err.to_string()),
            );
            FORWARD_TLS_FAILURE.to_string()
        } else {
            self.record(exchange.event(EventKind::Exception, EventLevel::Error, "exception forwarding request").with_error(err.to_string()));
            err.to_string()
        };
        self.return_not_found(exchange.writer.as_ref(), &exchange.request, Some(&diagnostic));
    }

    /// Proxies an unmatched request upstream.
    fn proxy(self: &Arc<Self>, exchange: Exchange, connection: Option<&dyn ConnectionContext>, opportunistic: bool) {
        let mut outbound = self.hop_by_hop.on_request(&exchange.request);
        self.directory.loop_prevention_tag().stamp(&mut outbound.headers);
        let remote_address = connection.and_then(|connection| connection.proxied_remote_address());
        let connect_timeout = if opportunistic {
            self.settings.opportunistic_connect_timeout
        } else {
            self.settings.socket_connection_timeout
        };
        let response = self
            .sender
            .send(&outbound, remote_address, connect_timeout)
            .unwrap_or_else(|err| ResponseFuture::ready(Err(err)));
        let synchronous = exchange.synchronous;
        let inner = Arc::clone(self);
        self.scheduler.on_completion(
            response,
            self.settings.max_future_timeout,
            move |outcome| match outcome {
                Ok(upstream) => inner.proxied_response(&exchange, &outbound, remote_address, upstream),
                Err(err) => inner.proxy_failed(&exchange, remote_address, opportunistic, &err),
            },
            synchronous,
        );
    }

    /// Writes the upstream response of a proxied request.
    fn proxied_response(
        &self,
        exchange: &Exchange,
        outbound: &HttpRequest,
        remote_address: Option<SocketAddr>,
        upstream: Option<HttpResponse>,
    ) {
        let mut response = upstream.unwrap_or_else(HttpResponse::not_found);
        let loop_tag = self.directory.loop_prevention_tag();
        if loop_tag.is_on_response(&response) {
            loop_tag.strip(&mut response.headers);
            self.record_lazily(EventLevel::Trace, || {
                ActionEvent::new(
                    EventKind::Trace,
                    EventLevel::Trace,
                    format!("no expectation for {} upstream, returning response {}", exchange.request, response.status()),
                )
                .correlated(&exchange.request)
            });
        } else {
            self.record_lazily(EventLevel::Info, || {
                exchange
                    .event(EventKind::ForwardedRequest, EventLevel::Info, "returning response for forwarded request")
                    .with_status(response.status())
                    .with_curl(to_curl(outbound, remote_address))
            });
        }
        exchange.writer.write_response(&exchange.request, response, false);
    }

    /// Classifies a failed proxy attempt and writes not-found.
    fn proxy_failed(&self, exchange: &Exchange, remote_address: Option<SocketAddr>, opportunistic: bool, err: &ForwardError) {
        let request = &exchange.request;
        let writer = exchange.writer.as_ref();
        let address = describe_address(request, remote_address);
        if err.is_socket_communication() {
            self.record(exchange.event(EventKind::Exception, EventLevel::Error, "exception while proxying request").with_error(err.to_string()));
            self.return_not_found(writer, request, Some(&err.to_string()));
        } else if opportunistic && err.is_connection_failure() {
            self.record_lazily(EventLevel::Trace, || {
                ActionEvent::new(
                    EventKind::Trace,
                    EventLevel::Trace,
                    format!("failed to connect to proxied socket {address} due to exploratory proxy attempt"),
                )
                .correlated(request)
                .with_error(err.to_string())
            });
            self.return_not_found(writer, request, None);
        } else if err.is_tls_handshake() {
            let diagnostic = format!("TLS handshake exception while proxying request to remote address {address}");
            self.record(exchange.event(EventKind::Exception, EventLevel::Error, diagnostic.as_str()).with_error(err.to_string()));
            self.return_not_found(writer, request, Some(&diagnostic));
        } else if err.is_connection_closed() {
            if opportunistic {
                self.return_not_found(writer, request, Some(&err.to_string()));
            } else {
                let diagnostic = format!("connection closed while proxying request to remote address {address}");
                self.record(exchange.event(EventKind::Exception, EventLevel::Error, diagnostic.as_str()).with_error(err.to_string()));
                self.return_not_found(writer, request, Some(&diagnostic));
            }
        } else {
            self.record(exchange.event(EventKind::Exception, EventLevel::Error, "exception while proxying request").with_error(err.to_string()));
            self.return_not_found(writer, request, Some(&err.to_string()));
        }
    }

    /// Writes the synthetic not-found response.
    fn return_not_found(&self, writer: &dyn ResponseWriter, request: &HttpRequest, error: Option<&str>) {
        let mut response = HttpResponse::not_found();
        let loop_tag = self.directory.loop_prevention_tag();
        if loop_tag.is_on_request(request) {
            loop_tag.stamp(&mut response.headers);
            self.record_lazily(EventLevel::Trace, || {
                ActionEvent::new(
                    EventKind::Trace,
                    EventLevel::Trace,
                    format!("no expectation for {request}, returning response {}", response.status()),
                )
                .correlated(request)
            });
        } else {
            self.record_lazily(EventLevel::Info, || {
                let event = ActionEvent::new(
                    EventKind::NoMatchResponse,
                    EventLevel::Info,
                    format!("no expectation for request, returning response {}", response.status()),
                )
                .with_request(request)
                .with_status(response.status());
                match error {
                    Some(error) => event.with_error(error),
                    None => event,
                }
            });
        }
        writer.write_response(request, response, false);
    }
}

// ============================================================================
// SECTION: Object Callback Replies
// ============================================================================

/// Completes an object-callback request on behalf of the remote client.
struct DispatcherReply {
    /// Dispatcher state.
    inner: Arc<DispatcherInner>,
    /// Matched expectation.
    expectation: Arc<Expectation>,
    /// Request being answered.
    exchange: Exchange,
    /// Action kind, for diagnostics.
    kind: ActionKind,
}

impl ReplyTarget for DispatcherReply {
    fn respond(&self, response: HttpResponse) {
        self.inner.write_response_action_response(response, self.exchange.clone(), self.kind);
    }

    fn forward(&self, outbound: HttpRequest, response_override: Option<ResponseOverride>) {
        let response_override =
            response_override.map(|apply| guarded_override(apply, Arc::clone(&self.inner.sink)));
        let result = self.inner.resolvers.forwarder.send_request(&outbound, None, response_override);
        self.inner.write_forward_action_response(result, self.exchange.clone());
    }

    fn not_found(&self, reason: Option<String>) {
        self.inner.return_not_found(self.exchange.writer.as_ref(), &self.exchange.request, reason.as_deref());
    }

    fn post_process(&self) {
        self.inner.directory.post_process(&self.expectation);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true for CORS preflight requests.
#[must_use]
pub fn is_cors_preflight(request: &HttpRequest) -> bool {
    request.method_or_default().eq_ignore_ascii_case("OPTIONS")
        && request.headers.contains(ORIGIN_HEADER)
        && request.headers.contains(ACCESS_CONTROL_REQUEST_METHOD_HEADER)
}

/// Describes the upstream address for diagnostics.
fn describe_address(request: &HttpRequest, remote_address: Option<SocketAddr>) -> String {
    remote_address.map_or_else(|| request.host().unwrap_or("unknown").to_string(), |address| address.to_string())
}
