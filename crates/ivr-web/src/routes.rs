//! Route table for the operator control plane.

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::operator_ws::operator_ws;
use crate::state::AppState;

#[must_use]
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(operator_ws))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
