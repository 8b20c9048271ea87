//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Gate requests on a license and its daily quota
//! - Guard the admin API with a bearer token
//! - Short-circuit requests (reject unauthorized)

/// Admin bearer token middleware
pub mod admin;
/// License and quota middleware
pub mod license;
