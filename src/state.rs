//! Shared application context.
//!
//! Built once in `main` and handed to every handler through `State`, so no
//! part of the service reaches for a global connection or client.

use std::sync::Arc;

use crate::{
    calendar::Clock,
    services::upstream_service::UpstreamClient,
    store::LicenseStore,
};

/// Identity echoed in every proxy response.
#[derive(Debug, Clone)]
pub struct DeveloperInfo {
    pub name: String,
    pub id: String,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LicenseStore>,
    pub clock: Arc<dyn Clock>,
    pub upstream: UpstreamClient,

    /// SHA-256 hex digest of the admin token, `None` leaves `/api/*` open.
    pub admin_token_digest: Option<String>,

    pub developer: DeveloperInfo,
}
