//! License management HTTP handlers.
//!
//! This module implements the admin API used by the panel:
//! - GET /api/licenses - Dump every license keyed by license key
//! - POST /api/license - Create or update a license
//! - DELETE /api/license/{key} - Remove a license

use std::collections::BTreeMap;

use crate::{
    error::AppError,
    models::license::{LicenseView, UpsertLicenseRequest},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::{Value, json};

/// List all licenses.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "abc123": {
///     "type": "limited",
///     "enabled": true,
///     "dailyLimit": 50,
///     "usage": { "date": "1403-07-01", "count": 12 }
///   }
/// }
/// ```
pub async fn list_licenses(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, LicenseView>>, AppError> {
    let licenses = state.store.list_all().await?;

    let views = licenses
        .into_iter()
        .map(|license| (license.key.clone(), LicenseView::from(license)))
        .collect();

    Ok(Json(views))
}

/// Create a license or replace its settings.
///
/// # Request Body
///
/// ```json
/// { "key": "abc123", "type": "limited", "enabled": true, "dailyLimit": 50 }
/// ```
///
/// `enabled` defaults to `true` and `dailyLimit` to 50. The usage counter of
/// an existing license is kept.
///
/// # Response
///
/// - **Success (200 OK)**: `{"success": true, "message": "License saved"}`
/// - **Error (400)**: Empty key, unknown type, or malformed body
pub async fn upsert_license(
    State(state): State<AppState>,
    payload: Result<Json<UpsertLicenseRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let (key, settings) = request
        .validate()
        .ok_or_else(|| AppError::InvalidRequest("Invalid key or type".to_string()))?;

    let license = state.store.upsert(&key, settings).await?;
    tracing::info!(
        key = %license.key,
        license_type = %license.license_type,
        enabled = license.enabled,
        daily_limit = license.daily_limit,
        "license saved"
    );

    Ok(Json(json!({ "success": true, "message": "License saved" })))
}

/// Delete a license.
///
/// # Response
///
/// - **Success (200 OK)**: `{"success": true}`
/// - **Error (404)**: No license with this key
pub async fn delete_license(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_by_key(&key).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(%key, "license deleted");
    Ok(Json(json!({ "success": true })))
}
