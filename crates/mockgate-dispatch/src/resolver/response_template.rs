// crates/mockgate-dispatch/src/resolver/response_template.rs
// ============================================================================
// Module: Response Template Resolver
// Description: Resolves `httpResponseTemplate` actions.
// Purpose: Render a response through the external template engine.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! The template tag is looked up first; an unknown tag or a missing engine is
//! a configuration error returned to the dispatcher. Render failures and empty
//! renders are per-request outcomes answered with not-found.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use mockgate_core::HttpRequest;
use mockgate_core::HttpResponse;
use mockgate_core::HttpTemplate;
use mockgate_core::TemplateEngine;
use mockgate_core::TemplateType;

use crate::error::ResolveError;
use crate::telemetry::ActionEvent;
use crate::telemetry::EventKind;
use crate::telemetry::EventLevel;
use crate::telemetry::EventSink;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolver for template responses.
pub struct ResponseTemplateResolver {
    /// Template renderer.
    engine: Option<Arc<dyn TemplateEngine>>,
    /// Event sink.
    sink: Arc<dyn EventSink>,
}

impl ResponseTemplateResolver {
    /// Creates the resolver.
    #[must_use]
    pub fn new(engine: Option<Arc<dyn TemplateEngine>>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            engine,
            sink,
        }
    }

    /// Renders the response for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownTemplateType`] or
    /// [`ResolveError::TemplateEngineMissing`] when the action cannot be rendered at all.
    pub fn resolve(&self, template: &HttpTemplate, request: &HttpRequest) -> Result<HttpResponse, ResolveError> {
        let template_type = TemplateType::from_tag(&template.template_type)?;
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| ResolveError::TemplateEngineMissing(template_type.to_string()))?;
        match engine.render_response(template_type, &template.template, request) {
            Ok(Some(response)) => Ok(response),
            Ok(None) => {
                self.sink.record(
                    &ActionEvent::new(
                        EventKind::Warn,
                        EventLevel::Warn,
                        format!("{template_type} template returned no response"),
                    )
                    .with_request(request),
                );
                Ok(HttpResponse::not_found())
            }
            Err(err) => {
                self.sink.record(
                    &ActionEvent::new(
                        EventKind::Exception,
                        EventLevel::Error,
                        format!("exception rendering {template_type} response template"),
                    )
                    .with_request(request)
                    .with_error(err.to_string()),
                );
                Ok(HttpResponse::not_found())
            }
        }
    }
}
