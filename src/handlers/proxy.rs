//! Chat proxy HTTP handlers.
//!
//! This module implements the licensed endpoints:
//! - GET /proxy/query - Prompt and flags in the query string
//! - POST /proxy/query - Prompt and flags in a JSON body
//!
//! Both run behind the license gate, so by the time a handler executes the
//! request has been admitted and counted.

use crate::{
    error::AppError,
    models::license::License,
    services::upstream_service::{UpstreamRequest, generate_user_id},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prompt used when a GET request carries none.
const DEFAULT_PROMPT: &str = "Hello";

/// Query string of `GET /proxy/query`.
///
/// Flags are enabled only by the literal value `true`. When a parameter is
/// repeated, the first occurrence wins.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProxyQueryParams {
    pub q: Option<String>,
    pub user_id: Option<String>,
    pub network: Option<String>,
    pub without_context: Option<String>,
    pub stream: Option<String>,
}

impl ProxyQueryParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "q" => &mut params.q,
                "userId" => &mut params.user_id,
                "network" => &mut params.network,
                "withoutContext" => &mut params.without_context,
                "stream" => &mut params.stream,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

/// JSON body of `POST /proxy/query`.
///
/// # JSON Example
///
/// ```json
/// {
///   "license": "abc123",
///   "q": "What is Rust?",
///   "userId": "0123456789abcdef",
///   "network": true,
///   "withoutContext": false,
///   "stream": false
/// }
/// ```
///
/// `network` defaults to `true`, the other flags to `false`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyQueryBody {
    pub q: Option<String>,
    pub user_id: Option<String>,
    pub network: Option<bool>,
    pub without_context: Option<bool>,
    pub stream: Option<bool>,
}

/// Response of both proxy endpoints.
///
/// `response` is the upstream result, or an `{error, details}` object when
/// the upstream call failed. Callers have to inspect it: upstream failures
/// are still HTTP 200.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub developer: String,
    pub developer_id: String,
    pub response: Value,
}

fn flag(value: Option<&str>) -> bool {
    value == Some("true")
}

fn user_id_or_generate(user_id: Option<String>) -> String {
    user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(generate_user_id)
}

async fn forward(
    state: &AppState,
    license: &License,
    request: UpstreamRequest,
) -> Json<ProxyResponse> {
    tracing::info!(
        license_type = %license.license_type,
        user_id = %request.user_id,
        "forwarding prompt upstream"
    );

    let response = state.upstream.forward(&request).await;

    Json(ProxyResponse {
        developer: state.developer.name.clone(),
        developer_id: state.developer.id.clone(),
        response,
    })
}

/// Forward a prompt given in the query string.
///
/// # Endpoint
///
/// `GET /proxy/query?license=<key>&q=<prompt>`
///
/// A missing or empty `q` sends the default prompt.
pub async fn query_get(
    State(state): State<AppState>,
    Extension(license): Extension<License>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ProxyResponse>, AppError> {
    let Query(pairs) =
        query.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let params = ProxyQueryParams::from_pairs(pairs);

    let prompt = params
        .q
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

    let request = UpstreamRequest::new(
        prompt,
        user_id_or_generate(params.user_id),
        flag(params.network.as_deref()),
        flag(params.without_context.as_deref()),
        flag(params.stream.as_deref()),
    );

    Ok(forward(&state, &license, request).await)
}

/// Forward a prompt given in a JSON body.
///
/// # Endpoint
///
/// `POST /proxy/query`
///
/// # Response
///
/// - **Success (200 OK)**: `{developer, developerId, response}`
/// - **Error (400)**: Body is not valid JSON or `q` is missing/empty
pub async fn query_post(
    State(state): State<AppState>,
    Extension(license): Extension<License>,
    payload: Result<Json<ProxyQueryBody>, JsonRejection>,
) -> Result<Json<ProxyResponse>, AppError> {
    let Json(body) =
        payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let prompt = body
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Missing prompt".to_string()))?;

    let request = UpstreamRequest::new(
        prompt,
        user_id_or_generate(body.user_id),
        body.network.unwrap_or(true),
        body.without_context.unwrap_or(false),
        body.stream.unwrap_or(false),
    );

    Ok(forward(&state, &license, request).await)
}
