//! Router configuration for the HTTP API.

use std::path::Path;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::limits::MAX_BODY_BYTES;

/// Build the application router. `static_dir`, if given, is served for any
/// path no API route claims (the browser frontend).
pub fn create_router(state: AppState, static_dir: Option<&Path>) -> Router {
    // Browser frontends may be hosted anywhere.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let lecturer = Router::new()
        .route("/api/lecturer/lectures", post(handlers::schedule_lecture))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_lecturer,
        ));

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/venues", get(handlers::list_venues).post(handlers::create_venue))
        .route("/api/venues", get(handlers::venue_names))
        .route("/lectures", get(handlers::list_lectures))
        .route("/api/lecturer/verify", post(handlers::verify_token))
        .merge(lecturer)
        .route_layer(middleware::from_fn(handlers::track_metrics));

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
