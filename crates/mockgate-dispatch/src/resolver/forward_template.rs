// crates/mockgate-dispatch/src/resolver/forward_template.rs
// ============================================================================
// Module: Forward Template Resolver
// Description: Resolves `httpForwardTemplate` actions.
// Purpose: Render the outbound request through the template engine and forward it.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! A failed or empty render short-circuits to a not-found forward result
//! without touching the network.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use mockgate_core::HttpRequest;
use mockgate_core::HttpTemplate;
use mockgate_core::TemplateEngine;
use mockgate_core::TemplateType;

use crate::error::ResolveError;
use crate::forward_result::ForwardResult;
use crate::resolver::forward::Forwarder;
use crate::telemetry::ActionEvent;
use crate::telemetry::EventKind;
use crate::telemetry::EventLevel;
use crate::telemetry::EventSink;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolver for template forwards.
pub struct ForwardTemplateResolver {
    /// Base forwarding logic.
    forwarder: Arc<Forwarder>,
    /// Template renderer.
    engine: Option<Arc<dyn TemplateEngine>>,
    /// Event sink.
    sink: Arc<dyn EventSink>,
}

impl ForwardTemplateResolver {
    /// Creates the resolver.
    #[must_use]
    pub fn new(
        forwarder: Arc<Forwarder>,
        engine: Option<Arc<dyn TemplateEngine>>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            forwarder,
            engine,
            sink,
        }
    }

    /// Renders the outbound request and forwards it.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownTemplateType`] or
    /// [`ResolveError::TemplateEngineMissing`] when the action cannot be rendered at all.
    pub fn resolve(&self, template: &HttpTemplate, request: &HttpRequest) -> Result<ForwardResult, ResolveError> {
        let template_type = TemplateType::from_tag(&template.template_type)?;
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| ResolveError::TemplateEngineMissing(template_type.to_string()))?;
        let rendered = match engine.render_request(template_type, &template.template, request) {
            Ok(rendered) => rendered,
            Err(err) => {
                self.sink.record(
                    &ActionEvent::new(
                        EventKind::Exception,
                        EventLevel::Error,
                        format!("exception rendering {template_type} forward template"),
                    )
                    .with_request(request)
                    .with_error(err.to_string()),
                );
                None
            }
        };
        Ok(match rendered {
            Some(outbound) => self.forwarder.send_request(&outbound, None, None),
            None => ForwardResult::not_found(request.clone()),
        })
    }
}
