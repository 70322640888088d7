// crates/mockgate-dispatch/src/resolver/error_action.rs
// ============================================================================
// Module: Error Action Resolver
// Description: Resolves `httpError` actions.
// Purpose: Inject raw bytes and connection drops instead of an HTTP response.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! Writes the configured raw bytes to the client connection and optionally
//! closes it. No HTTP response is produced for this action.

use mockgate_core::ConnectionContext;
use mockgate_core::HttpError;

use crate::error::ResolveError;

/// Resolver for error injection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorActionResolver;

impl ErrorActionResolver {
    /// Writes the configured bytes, then closes the connection when asked to.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingConnection`] without a connection and
    /// [`ResolveError::ConnectionWrite`] when the bytes cannot be written.
    pub fn resolve(self, error: &HttpError, connection: Option<&dyn ConnectionContext>) -> Result<(), ResolveError> {
        let connection = connection.ok_or(ResolveError::MissingConnection)?;
        if let Some(bytes) = error.response_bytes.as_deref().filter(|bytes| !bytes.is_empty()) {
            connection.write_raw(bytes).map_err(|err| ResolveError::ConnectionWrite(err.to_string()))?;
        }
        if error.drop_connection.unwrap_or(false) {
            connection.close();
        }
        Ok(())
    }
}
