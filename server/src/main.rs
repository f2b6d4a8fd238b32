//! Gateway process: load config, connect to the store, serve GraphQL.
//!
//! Run from repo root: `cargo run -p course-roster-server`
//! Exits non-zero when the store cannot be reached within the configured attempts.

use course_roster::GatewayConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("course_roster=info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    if let Err(e) = course_roster::run(config).await {
        tracing::error!(error = %e, "gateway stopped");
        return Err(e.into());
    }
    Ok(())
}
