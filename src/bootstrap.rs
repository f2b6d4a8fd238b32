//! Process lifecycle: connect to the store (bounded retries), then serve HTTP.
//!
//! Connecting happens once. If every attempt fails the process gives up with an
//! error instead of serving; a connection lost after startup is left to the pool.

use crate::config::{GatewayConfig, RetryPolicy};
use crate::error::{AppError, ConfigError};
use crate::routes::gateway_router;
use crate::state::AppState;
use crate::store::{ensure_collections, DocumentStore, PgStore};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Call `connect` until it succeeds or `policy.attempts` is exhausted, sleeping `policy.delay` in between.
pub async fn connect_with_retry<T, F, Fut>(policy: &RetryPolicy, mut connect: F) -> Result<T, AppError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = None;
    for attempt in 1..=attempts {
        match connect(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(attempt, attempts, error = %e, "store connection failed");
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
    Err(AppError::StoreUnavailable(format!(
        "gave up after {} attempts: {}",
        attempts,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

/// Open the pool and make sure both collections exist.
/// Pool connections are liveness-checked before use and never expire on idle time or age.
pub async fn connect_store(config: &GatewayConfig) -> Result<PgStore, AppError> {
    let options = PgConnectOptions::from_str(&config.database_url).map_err(|e| ConfigError::Invalid {
        key: "DATABASE_URL",
        value: e.to_string(),
    })?;
    let max_connections = config.max_connections;
    let pool = connect_with_retry(&config.connect, |attempt| {
        let options = options.clone();
        async move {
            tracing::info!(attempt, "connecting to store");
            let pool = PgPoolOptions::new()
                .max_connections(max_connections)
                .test_before_acquire(true)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?;
            Ok::<_, AppError>(pool)
        }
    })
    .await?;
    ensure_collections(&pool, &config.store_schema).await?;
    Ok(PgStore::new(pool, config.store_schema.clone()))
}

/// Bind the listener and serve until Ctrl-C.
pub async fn serve(config: &GatewayConfig, store: Arc<dyn DocumentStore>) -> Result<(), AppError> {
    let state = AppState::new(store, config.graphql_path.clone());
    let app = gateway_router(state, config.body_limit);
    let listener = TcpListener::bind((config.bind_addr, config.port)).await?;
    tracing::info!(
        "GraphQL endpoint on http://{}{}",
        listener.local_addr()?,
        config.graphql_path
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

/// connecting -> serving. Serving is reached only after the store answered.
pub async fn run(config: GatewayConfig) -> Result<(), AppError> {
    tracing::info!(phase = "connecting", attempts = config.connect.attempts, "starting gateway");
    let store = connect_store(&config).await?;
    tracing::info!(phase = "serving", port = config.port, "store connected");
    serve(&config, Arc::new(store)).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = connect_with_retry(&policy(5), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(AppError::StoreUnavailable("refused".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AppError> = connect_with_retry(&policy(4), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::StoreUnavailable("refused".into())) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let err = result.unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(ref m) if m.starts_with("gave up after 4 attempts")));
    }

    #[tokio::test]
    async fn unparsable_url_fails_without_connecting() {
        let mut config = GatewayConfig::from_lookup(|_| None).unwrap();
        config.database_url = "not a url".into();
        let err = connect_store(&config).await.err().unwrap();
        assert!(matches!(err, AppError::Config(ConfigError::Invalid { key: "DATABASE_URL", .. })));
    }
}
