// crates/mockgate-dispatch/src/resolver/mod.rs
// ============================================================================
// Module: Action Resolvers
// Description: One resolver per action kind, built once per dispatcher.
// Purpose: Turn an action plus an inbound request into a response or a forward.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! Resolvers are constructed eagerly when the dispatcher is built and shared
//! across every request. They hold only immutable collaborators, so they are
//! safe to call concurrently from worker threads.
//! Invariants:
//! - Response resolvers never mutate the configured action; they work on clones.
//! - Forward resolvers always return a [`crate::ForwardResult`]; send setup
//!   failures produce an already-completed not-found future.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error_action;
pub mod forward;
pub mod forward_class_callback;
pub mod forward_object_callback;
pub mod forward_replace;
pub mod forward_template;
pub mod response;
pub mod response_class_callback;
pub mod response_object_callback;
pub mod response_template;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use mockgate_core::TemplateEngine;

pub use error_action::ErrorActionResolver;
pub use forward::ForwardResolver;
pub use forward::Forwarder;
pub use forward_class_callback::ForwardClassCallbackResolver;
pub use forward_object_callback::ForwardObjectCallbackResolver;
pub use forward_replace::ForwardReplaceResolver;
pub use forward_template::ForwardTemplateResolver;
pub use response::ResponseResolver;
pub use response_class_callback::ResponseClassCallbackResolver;
pub use response_object_callback::ResponseObjectCallbackResolver;
pub use response_template::ResponseTemplateResolver;

use crate::callback::CallbackRegistry;
use crate::object_callback::ObjectCallbackChannel;
use crate::telemetry::EventSink;

// ============================================================================
// SECTION: Resolver Set
// ============================================================================

/// Collaborators shared by the resolvers.
pub struct ResolverContext {
    /// Base forwarding logic.
    pub forwarder: Arc<Forwarder>,
    /// Template renderer, when configured.
    pub templates: Option<Arc<dyn TemplateEngine>>,
    /// Class-callback registry.
    pub callbacks: Arc<CallbackRegistry>,
    /// Remote callback transport, when configured.
    pub channel: Option<Arc<dyn ObjectCallbackChannel>>,
    /// Event sink.
    pub sink: Arc<dyn EventSink>,
}

/// One resolver per action kind.
pub struct Resolvers {
    /// Static responses.
    pub response: ResponseResolver,
    /// Template responses.
    pub response_template: ResponseTemplateResolver,
    /// Class-callback responses.
    pub response_class_callback: ResponseClassCallbackResolver,
    /// Object-callback responses.
    pub response_object_callback: ResponseObjectCallbackResolver,
    /// Static forwards.
    pub forward: ForwardResolver,
    /// Template forwards.
    pub forward_template: ForwardTemplateResolver,
    /// Class-callback forwards.
    pub forward_class_callback: ForwardClassCallbackResolver,
    /// Object-callback forwards.
    pub forward_object_callback: ForwardObjectCallbackResolver,
    /// Override forwards.
    pub forward_replace: ForwardReplaceResolver,
    /// Error injection.
    pub error: ErrorActionResolver,
    /// Base forwarding logic, also used by object-callback replies.
    pub forwarder: Arc<Forwarder>,
}

impl Resolvers {
    /// Builds every resolver from the shared collaborators.
    #[must_use]
    pub fn new(context: &ResolverContext) -> Self {
        let sink = &context.sink;
        Self {
            response: ResponseResolver,
            response_template: ResponseTemplateResolver::new(context.templates.clone(), Arc::clone(sink)),
            response_class_callback: ResponseClassCallbackResolver::new(
                Arc::clone(&context.callbacks),
                Arc::clone(sink),
            ),
            response_object_callback: ResponseObjectCallbackResolver::new(
                context.channel.clone(),
                Arc::clone(sink),
            ),
            forward: ForwardResolver::new(Arc::clone(&context.forwarder), Arc::clone(sink)),
            forward_template: ForwardTemplateResolver::new(
                Arc::clone(&context.forwarder),
                context.templates.clone(),
                Arc::clone(sink),
            ),
            forward_class_callback: ForwardClassCallbackResolver::new(
                Arc::clone(&context.forwarder),
                Arc::clone(&context.callbacks),
                Arc::clone(sink),
            ),
            forward_object_callback: ForwardObjectCallbackResolver::new(
                context.channel.clone(),
                Arc::clone(sink),
            ),
            forward_replace: ForwardReplaceResolver::new(Arc::clone(&context.forwarder)),
            error: ErrorActionResolver,
            forwarder: Arc::clone(&context.forwarder),
        }
    }
}
