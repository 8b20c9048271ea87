//! HTTP router assembly.
//!
//! Three groups of routes with different guards:
//! - Licensed: `/proxy/query`, behind the license gate
//! - Admin: `/api/*`, behind the admin token gate (open when no token is set)
//! - Public: `/health` and the static `/panel`

use std::path::Path;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::{services::ServeFile, trace::TraceLayer};

use crate::{handlers, middleware, state::AppState};


/// Build the full application router around `state`.
pub fn build_router(state: AppState, panel_path: impl AsRef<Path>) -> Router {
    let licensed_routes = Router::new()
        .route(
            "/proxy/query",
            get(handlers::proxy::query_get).post(handlers::proxy::query_post),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::license::license_middleware,
        ));

    let admin_routes = Router::new()
        .route("/api/licenses", get(handlers::licenses::list_licenses))
        .route("/api/license", post(handlers::licenses::upsert_license))
        .route(
            "/api/license/{key}",
            delete(handlers::licenses::delete_license),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::admin::admin_middleware,
        ));

    Router::new()
        // Public routes (no license or admin token required)
        .route("/health", get(handlers::health::health_check))
        .route_service("/panel", ServeFile::new(panel_path))
        .merge(licensed_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
