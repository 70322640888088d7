// crates/mockgate-dispatch/src/callback.rs
// ============================================================================
// Module: Callback Registry
// Description: Named plug-in factories for class-callback actions.
// Purpose: Resolve callback capabilities by name without runtime reflection.
// Dependencies: mockgate-core
// ============================================================================

//! ## Overview
//! Class-callback actions name a callback; the [`CallbackRegistry`] maps that
//! name to a factory closure producing a [`CallbackInstance`]. An instance
//! exposes up to three independent capabilities. Instances are built on first
//! use and reused for every later request.
//! Invariants:
//! - A factory runs at most once per name unless it fails.
//! - Panics raised by factories or callbacks surface as
//!   [`CallbackError::Panicked`] and never unwind into the dispatcher.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use mockgate_core::CallbackError;
use mockgate_core::ExpectationForwardAndResponseCallback;
use mockgate_core::ExpectationForwardCallback;
use mockgate_core::ExpectationResponseCallback;

use crate::scheduler::panic_message;

// ============================================================================
// SECTION: Capability Names
// ============================================================================

/// Label of the response capability in diagnostics.
const RESPONSE_CAPABILITY: &str = "ExpectationResponseCallback";
/// Label of the forward capabilities in diagnostics.
const FORWARD_CAPABILITY: &str = "ExpectationForwardCallback or ExpectationForwardAndResponseCallback";

// ============================================================================
// SECTION: Instances
// ============================================================================

/// Factory building a callback instance.
///
/// An `Err` carries the construction failure reason.
pub type CallbackFactory = Arc<dyn Fn() -> Result<CallbackInstance, String> + Send + Sync>;

/// Capabilities exposed by one registered callback.
#[derive(Clone, Default)]
pub struct CallbackInstance {
    /// Produces responses.
    response: Option<Arc<dyn ExpectationResponseCallback>>,
    /// Rewrites forwarded requests.
    forward: Option<Arc<dyn ExpectationForwardCallback>>,
    /// Rewrites upstream responses.
    forward_and_response: Option<Arc<dyn ExpectationForwardAndResponseCallback>>,
}

impl CallbackInstance {
    /// Creates an instance with no capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the response capability.
    #[must_use]
    pub fn with_response(mut self, callback: impl ExpectationResponseCallback + 'static) -> Self {
        self.response = Some(Arc::new(callback));
        self
    }

    /// Adds the request rewrite capability.
    #[must_use]
    pub fn with_forward(mut self, callback: impl ExpectationForwardCallback + 'static) -> Self {
        self.forward = Some(Arc::new(callback));
        self
    }

    /// Adds the response rewrite capability.
    #[must_use]
    pub fn with_forward_and_response(
        mut self,
        callback: impl ExpectationForwardAndResponseCallback + 'static,
    ) -> Self {
        self.forward_and_response = Some(Arc::new(callback));
        self
    }
}

/// Forward capabilities of a callback; at least one is present.
#[derive(Clone)]
pub struct ForwardCallbacks {
    /// Request rewrite, run before sending.
    pub forward: Option<Arc<dyn ExpectationForwardCallback>>,
    /// Response rewrite, run when the upstream response arrives.
    pub forward_and_response: Option<Arc<dyn ExpectationForwardAndResponseCallback>>,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Name-keyed registry of callback factories.
///
/// # Invariants
/// - Registration happens before the registry is shared; lookups only read factories.
#[derive(Default)]
pub struct CallbackRegistry {
    /// Factories keyed by callback name.
    factories: HashMap<String, CallbackFactory>,
    /// Instances built so far.
    instances: Mutex<HashMap<String, CallbackInstance>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<CallbackInstance, String> + Send + Sync + 'static,
    {
        let name = name.into();
        self.instances.get_mut().unwrap_or_else(PoisonError::into_inner).remove(&name);
        self.factories.insert(name, Arc::new(factory));
        self
    }

    /// Registers a ready-made instance under `name`.
    pub fn register_instance(&mut self, name: impl Into<String>, instance: CallbackInstance) -> &mut Self {
        self.register(name, move || Ok(instance.clone()))
    }

    /// Returns the instance for `name`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::NotFound`] for unknown names and
    /// [`CallbackError::Construction`] or [`CallbackError::Panicked`] when the factory fails.
    pub fn instance(&self, name: &str) -> Result<CallbackInstance, CallbackError> {
        if let Some(instance) = self.instances.lock().unwrap_or_else(PoisonError::into_inner).get(name) {
            return Ok(instance.clone());
        }
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| CallbackError::NotFound(name.to_string()))?;
        let instance = match catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(Ok(instance)) => instance,
            Ok(Err(reason)) => {
                return Err(CallbackError::Construction {
                    name: name.to_string(),
                    reason,
                });
            }
            Err(payload) => return Err(CallbackError::Panicked(panic_message(payload.as_ref()))),
        };
        let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(instances.entry(name.to_string()).or_insert(instance).clone())
    }

    /// Returns the response capability of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::WrongCapability`] when the callback cannot produce responses,
    /// plus the lookup errors of [`Self::instance`].
    pub fn response_callback(&self, name: &str) -> Result<Arc<dyn ExpectationResponseCallback>, CallbackError> {
        self.instance(name)?.response.ok_or_else(|| CallbackError::WrongCapability {
            name: name.to_string(),
            capability: RESPONSE_CAPABILITY,
        })
    }

    /// Returns the forward capabilities of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::WrongCapability`] when neither forward capability is present,
    /// plus the lookup errors of [`Self::instance`].
    pub fn forward_callbacks(&self, name: &str) -> Result<ForwardCallbacks, CallbackError> {
        let instance = self.instance(name)?;
        if instance.forward.is_none() && instance.forward_and_response.is_none() {
            return Err(CallbackError::WrongCapability {
                name: name.to_string(),
                capability: FORWARD_CAPABILITY,
            });
        }
        Ok(ForwardCallbacks {
            forward: instance.forward,
            forward_and_response: instance.forward_and_response,
        })
    }
}

// ============================================================================
// SECTION: Guarded Invocation
// ============================================================================

/// Runs callback code, converting a panic into [`CallbackError::Panicked`].
///
/// # Errors
///
/// Returns the callback's own error or the converted panic.
pub fn invoke_guarded<T>(call: impl FnOnce() -> Result<T, CallbackError>) -> Result<T, CallbackError> {
    catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(CallbackError::Panicked(panic_message(payload.as_ref()))))
}
