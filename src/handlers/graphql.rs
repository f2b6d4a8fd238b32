//! GraphQL-over-HTTP handlers: POST executes, GET executes a query string or serves the console.

use crate::error::AppError;
use crate::state::AppState;
use async_graphql::http::GraphiQLSource;
use async_graphql::parser::types::OperationType;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::{RawQuery, State},
    response::{Html, IntoResponse, Response},
};

/// POST <graphql_path>. Bodies that are not a GraphQL request are rejected with 400 by the extractor.
pub async fn execute(State(state): State<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

/// GET <graphql_path>. With `?query=...` runs the query; without, serves GraphiQL.
pub async fn execute_get_or_console(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let Some(raw) = raw.filter(|q| !q.is_empty()) else {
        return Html(GraphiQLSource::build().endpoint(&state.graphql_path).finish()).into_response();
    };
    let request = match async_graphql::http::parse_query_string(&raw) {
        Ok(request) => request,
        Err(e) => return AppError::MalformedRequest(e.to_string()).into_response(),
    };
    if is_mutation(&request.query) {
        return AppError::MalformedRequest("mutations must be sent with POST".into()).into_response();
    }
    GraphQLResponse::from(state.schema.execute(request).await).into_response()
}

/// Unparseable documents are left for the executor to report.
fn is_mutation(query: &str) -> bool {
    match async_graphql::parser::parse_query(query) {
        Ok(doc) => doc
            .operations
            .iter()
            .any(|(_, op)| op.node.ty == OperationType::Mutation),
        Err(_) => false,
    }
}
