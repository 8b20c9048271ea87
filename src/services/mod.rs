//! Business logic services.
//!
//! Services contain the logic separated from HTTP handlers: quota accounting
//! and the upstream chat client.

pub mod quota_service;
pub mod upstream_service;
