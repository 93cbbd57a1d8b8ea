use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes: require Bearer token when API_TOKEN is set.
    // OPTIONS is routed too so a bare OPTIONS gets 204 instead of 405.
    let protected = Router::new()
        .route("/api/sweep", post(handlers::sweep::run).options(handlers::options))
        .route("/api/judge", post(handlers::judge::classify).options(handlers::options))
        .route("/api/win-loss", post(handlers::ledger::build).options(handlers::options))
        .route("/api/totals", post(handlers::totals::refresh).options(handlers::options))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Preflights are answered here, before auth runs
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
