// crates/mockgate-core/src/core/expectation.rs
// ============================================================================
// Module: Mockgate Expectations
// Description: Matched expectation snapshot handed to the dispatcher.
// Purpose: Pair a stable identifier with the action a request triggers.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Expectations are owned by the external expectation directory. The
//! dispatcher receives an immutable snapshot per request; hit counts and
//! time-to-live bookkeeping stay with the directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::action::Action;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Expectation identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectationId(String);

impl ExpectationId {
    /// Creates a new expectation identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpectationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Expectation
// ============================================================================

/// Rule snapshot selected for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    /// Stable identifier used in logs and post-processing.
    pub id: ExpectationId,
    /// Action to run; expectations without an action are treated as unmatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl Expectation {
    /// Creates an expectation with an action.
    #[must_use]
    pub fn new(id: impl Into<String>, action: Action) -> Self {
        Self {
            id: ExpectationId::new(id),
            action: Some(action),
        }
    }
}
