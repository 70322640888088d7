// crates/mockgate-dispatch/src/lib.rs
// ============================================================================
// Module: Mockgate Dispatch Library
// Description: Action dispatcher, resolvers, scheduler, and forwarding client.
// Purpose: Turn matched expectations and proxied traffic into exactly one outcome per request.
// Dependencies: mockgate-config, mockgate-core, hyper, rustls, tokio, tracing
// ============================================================================

//! ## Overview
//! Mockgate Dispatch executes expectation actions. The [`ActionDispatcher`]
//! schedules the resolver for each action on a bounded worker pool, forwards
//! requests through a [`RequestSender`], and falls back to a synthetic
//! not-found response whenever anything downstream fails.
//! Invariants:
//! - Every processed request receives exactly one terminal outcome.
//! - Requests forwarded by this process carry its loop-prevention tag.
//! - Observability events are data handed to an [`EventSink`]; recording never fails.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod callback;
pub mod dispatcher;
pub mod error;
pub mod forward_result;
pub mod object_callback;
pub mod proxy_auth;
pub mod resolver;
pub mod scheduler;
pub mod sender;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use callback::CallbackFactory;
pub use callback::CallbackInstance;
pub use callback::CallbackRegistry;
pub use dispatcher::ActionDispatcher;
pub use dispatcher::ActionDispatcherBuilder;
pub use dispatcher::is_cors_preflight;
pub use error::DispatcherError;
pub use error::ForwardError;
pub use error::ResolveError;
pub use error::SchedulerError;
pub use forward_result::ForwardResult;
pub use forward_result::ResponseCompleter;
pub use forward_result::ResponseFuture;
pub use forward_result::ResponseOutcome;
pub use forward_result::ResponseOverride;
pub use object_callback::CallbackReply;
pub use object_callback::ObjectCallbackChannel;
pub use object_callback::ObjectCallbackKind;
pub use object_callback::ObjectCallbackMessage;
pub use proxy_auth::ProxyAuthenticator;
pub use scheduler::Scheduler;
pub use scheduler::SchedulerHandle;
pub use sender::HyperRequestSender;
pub use sender::RequestSender;
pub use telemetry::ActionEvent;
pub use telemetry::EventKind;
pub use telemetry::EventLevel;
pub use telemetry::EventSink;
pub use telemetry::NoopEventSink;
pub use telemetry::TracingEventSink;
