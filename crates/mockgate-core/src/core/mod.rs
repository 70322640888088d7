// crates/mockgate-core/src/core/mod.rs
// ============================================================================
// Module: Mockgate Core Model
// Description: HTTP message model, actions, expectations, and forwarding utilities.
// Purpose: Group the domain types shared by configuration and dispatch.
// Dependencies: base64, rand, serde
// ============================================================================

//! ## Overview
//! Domain types are plain data: cloneable, comparable, and serde-ready so the
//! surrounding server can persist and exchange them unchanged.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod action;
pub mod body;
pub mod curl;
pub mod delay;
pub mod expectation;
pub mod headers;
pub mod hop_by_hop;
pub mod loop_tag;
pub mod request;
pub mod response;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use action::Action;
pub use action::ActionKind;
pub use action::HttpClassCallback;
pub use action::HttpError;
pub use action::HttpForward;
pub use action::HttpObjectCallback;
pub use action::HttpOverrideForwardedRequest;
pub use action::HttpTemplate;
pub use body::Body;
pub use curl::to_curl;
pub use delay::Delay;
pub use delay::TimeUnit;
pub use expectation::Expectation;
pub use expectation::ExpectationId;
pub use headers::Cookie;
pub use headers::Header;
pub use headers::Headers;
pub use hop_by_hop::HopByHopFilter;
pub use loop_tag::LoopPreventionTag;
pub use request::HttpRequest;
pub use request::Scheme;
pub use request::SocketAddress;
pub use response::HttpResponse;
