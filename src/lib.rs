pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use routes::AppState;

/// The full HTTP application: API routes, liveness probe, and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(routes::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(DefaultBodyLimit::max(1024 * 1024)),
        )
}
