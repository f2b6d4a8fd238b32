//! The GraphQL endpoint, mounted at the configured path.

use crate::handlers::{execute, execute_get_or_console};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn graphql_routes(state: AppState) -> Router {
    let path = state.graphql_path.clone();
    Router::new()
        .route(&path, get(execute_get_or_console).post(execute))
        .with_state(state)
}
