//! Shared application state for all routes.

use crate::schema::GatewaySchema;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub schema: GatewaySchema,
    /// Path the GraphQL endpoint is mounted on; the console posts back to it.
    pub graphql_path: String,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, graphql_path: impl Into<String>) -> Self {
        AppState {
            schema: crate::schema::build_schema(store.clone()),
            store,
            graphql_path: graphql_path.into(),
        }
    }
}
