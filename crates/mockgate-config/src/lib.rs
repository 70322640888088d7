// crates/mockgate-config/src/lib.rs
// ============================================================================
// Module: Mockgate Config Library
// Description: Canonical configuration model and validation for Mockgate.
// Purpose: Single source of truth for mockgate.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `mockgate-config` defines the settings the dispatch core reads: CORS
//! flags, transparent proxying, proxy authentication, timeouts, and the
//! worker pool size. Loading is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
