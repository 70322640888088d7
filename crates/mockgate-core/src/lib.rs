// crates/mockgate-core/src/lib.rs
// ============================================================================
// Module: Mockgate Core Library
// Description: Domain model and collaborator interfaces for the Mockgate dispatch core.
// Purpose: Share request, response, and action types across Mockgate crates.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Mockgate Core defines the HTTP message model, the expectation and action
//! types, and the traits the dispatcher consumes from its collaborators.
//! Invariants:
//! - Domain values are immutable once handed to the dispatcher; rewrites work on clones.
//! - Header names compare ASCII case-insensitively.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;
pub use interfaces::CallbackError;
pub use interfaces::ConnectionContext;
pub use interfaces::ExpectationDirectory;
pub use interfaces::ExpectationForwardAndResponseCallback;
pub use interfaces::ExpectationForwardCallback;
pub use interfaces::ExpectationResponseCallback;
pub use interfaces::ResponseWriter;
pub use interfaces::TemplateEngine;
pub use interfaces::TemplateError;
pub use interfaces::TemplateType;
