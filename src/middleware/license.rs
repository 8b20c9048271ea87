//! License gate for the proxy routes.
//!
//! Every proxied request goes through the same linear sequence:
//! 1. Read the license key from the `license` query parameter or JSON body field
//! 2. Look the license up in the store
//! 3. Reject unknown and disabled licenses with HTTP 403
//! 4. Run the quota accountant for limited licenses, rejecting with HTTP 429
//! 5. Inject the admitted `License` into the request and call the handler

use crate::{
    calendar::{self, Clock},
    error::AppError,
    models::license::{License, LicenseType},
    services::quota_service::{self, QuotaDecision},
    state::AppState,
    store::{LicenseStore, StoreError},
};
use axum::{
    body::{Body, to_bytes},
    extract::{Query, Request, State},
    http::{HeaderMap, Uri, header},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

/// Largest request body buffered while looking for the license key.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingKey,
    InvalidKey,
    Disabled,
    QuotaExceeded,
}

impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::MissingKey => AppError::MissingLicenseKey,
            DenyReason::InvalidKey => AppError::InvalidLicenseKey,
            DenyReason::Disabled => AppError::LicenseDisabled,
            DenyReason::QuotaExceeded => AppError::QuotaExceeded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    /// The license as stored after this request was counted.
    Admit(License),
    Deny(DenyReason),
}

/// Decide whether a request carrying `license_key` may proceed.
///
/// An admitted request on a limited license has already been counted
/// against today's quota when this returns.
///
/// # Errors
///
/// - `StoreError`: the lookup or the usage update failed
pub async fn authorize(
    license_key: Option<&str>,
    store: &dyn LicenseStore,
    clock: &dyn Clock,
) -> Result<AuthDecision, StoreError> {
    let Some(key) = license_key.filter(|key| !key.is_empty()) else {
        return Ok(AuthDecision::Deny(DenyReason::MissingKey));
    };

    let Some(mut license) = store.find_by_key(key).await? else {
        return Ok(AuthDecision::Deny(DenyReason::InvalidKey));
    };

    if !license.enabled {
        return Ok(AuthDecision::Deny(DenyReason::Disabled));
    }

    if license.license_type == LicenseType::Limited {
        let today = calendar::today(clock);
        let decision = quota_service::check_and_consume(store, &mut license, &today).await?;
        if decision == QuotaDecision::Denied {
            return Ok(AuthDecision::Deny(DenyReason::QuotaExceeded));
        }
    }

    Ok(AuthDecision::Admit(license))
}

/// First non-empty `license` value of the query string. Repeated keys are
/// tolerated.
fn license_from_query(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find(|(name, value)| name == "license" && !value.is_empty())
        .map(|(_, value)| value)
}

/// Same rule as the `Json` extractor: `application/json` or any
/// `application/*+json` type.
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.split_once('/') {
        Some((kind, subtype)) => {
            kind == "application" && (subtype == "json" || subtype.ends_with("+json"))
        }
        None => false,
    }
}

/// `license` field of a JSON object body. Numeric keys are read as their
/// decimal text.
fn license_from_json(bytes: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(bytes).ok()?;
    let key = match body.get("license")? {
        Value::String(key) => key.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!key.is_empty()).then_some(key)
}

/// License gate middleware function.
///
/// The body is buffered so the `license` field of a JSON body can be read,
/// then re-attached for the handler. The body is only consulted when the
/// request declares a JSON content type, so a body the handler would reject
/// as non-JSON never supplies the key.
///
/// # Returns
///
/// - `Ok(Response)` from the next handler when the license is admitted
/// - `Err(AppError)` with 403, 429 or 500 otherwise
pub async fn license_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::InvalidRequest("Failed to read request body".to_string()))?;

    let license_key = license_from_query(&parts.uri).or_else(|| {
        if has_json_content_type(&parts.headers) {
            license_from_json(&bytes)
        } else {
            None
        }
    });

    let decision = authorize(
        license_key.as_deref(),
        state.store.as_ref(),
        state.clock.as_ref(),
    )
    .await?;

    let license = match decision {
        AuthDecision::Admit(license) => license,
        AuthDecision::Deny(reason) => {
            tracing::info!(?reason, path = %parts.uri.path(), "request denied by license gate");
            return Err(reason.into());
        }
    };

    tracing::debug!(
        license_type = %license.license_type,
        usage = license.usage.count,
        "license admitted"
    );

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(license);
    Ok(next.run(request).await)
}
