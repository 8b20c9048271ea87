//! Data models.
//!
//! This module contains the license record and its API request/response shapes.

/// License model
pub mod license;
