//! GraphQL gateway exposing CRUD over courses and students, backed by a PostgreSQL document store.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod routes;
pub mod schema;
pub mod service;
pub mod state;
pub mod store;

pub use bootstrap::{connect_store, connect_with_retry, run, serve};
pub use config::{GatewayConfig, RetryPolicy};
pub use error::{AppError, ConfigError};
pub use routes::{common_routes, common_routes_with_ready, gateway_router, graphql_routes};
pub use schema::{build_schema, GatewaySchema};
pub use service::{CourseRepository, StudentRepository};
pub use state::AppState;
pub use store::{ensure_collections, DocumentStore, MemoryStore, PgStore};
