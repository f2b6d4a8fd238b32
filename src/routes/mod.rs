//! Route assembly: health and readiness routes plus the GraphQL endpoint, behind CORS and a body limit.

mod common;
mod graphql;

pub use common::{common_routes, common_routes_with_ready};
pub use graphql::graphql_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

/// Full gateway router. CORS is permissive so the console and any frontend origin can call it.
pub fn gateway_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(graphql_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
}
