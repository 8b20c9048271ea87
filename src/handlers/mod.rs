//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, query string, URL params)
//! 2. Calls the license store or the upstream client
//! 3. Returns HTTP response (JSON, status code)

/// Service health probe
pub mod health;
/// License management endpoints
pub mod licenses;
/// Licensed chat proxy endpoints
pub mod proxy;
