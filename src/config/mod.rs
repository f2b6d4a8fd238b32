//! Gateway configuration, sourced from the environment.

use crate::error::ConfigError;
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 7654;
pub const DEFAULT_GRAPHQL_PATH: &str = "/graphql";
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/course_roster";

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub database_url: String,
    /// Schema holding the `courses` and `students` collections.
    pub store_schema: String,
    pub graphql_path: String,
    pub max_connections: u32,
    pub connect: RetryPolicy,
    pub body_limit: usize,
}

/// Bounded retry for the initial store connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 30,
            delay: Duration::from_millis(1000),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or empty keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let store_schema = get("STORE_SCHEMA").unwrap_or_else(|| "public".into());
        let is_ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .map(|re| re.is_match(&store_schema))
            .unwrap_or(false);
        if !is_ident {
            return Err(ConfigError::Identifier {
                key: "STORE_SCHEMA",
                value: store_schema,
            });
        }

        let graphql_path = get("GRAPHQL_PATH").unwrap_or_else(|| DEFAULT_GRAPHQL_PATH.into());
        if !graphql_path.starts_with('/') {
            return Err(ConfigError::Path {
                key: "GRAPHQL_PATH",
                value: graphql_path,
            });
        }

        let defaults = RetryPolicy::default();
        Ok(GatewayConfig {
            bind_addr: parse_or(get("BIND_ADDR"), "BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            store_schema,
            graphql_path,
            max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 5)?,
            connect: RetryPolicy {
                attempts: parse_or(get("DB_CONNECT_ATTEMPTS"), "DB_CONNECT_ATTEMPTS", defaults.attempts)?.max(1),
                delay: Duration::from_millis(parse_or(
                    get("DB_CONNECT_RETRY_MS"),
                    "DB_CONNECT_RETRY_MS",
                    defaults.delay.as_millis() as u64,
                )?),
            },
            body_limit: parse_or(get("BODY_LIMIT_BYTES"), "BODY_LIMIT_BYTES", 1024 * 1024)?,
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        GatewayConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 7654);
        assert_eq!(cfg.graphql_path, "/graphql");
        assert_eq!(cfg.store_schema, "public");
        assert_eq!(cfg.connect, RetryPolicy::default());
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("PORT", "8080"),
            ("GRAPHQL_PATH", "/api/graphql"),
            ("DB_CONNECT_ATTEMPTS", "3"),
            ("DB_CONNECT_RETRY_MS", "10"),
            ("BIND_ADDR", "127.0.0.1"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.graphql_path, "/api/graphql");
        assert_eq!(cfg.connect.attempts, 3);
        assert_eq!(cfg.connect.delay, Duration::from_millis(10));
        assert_eq!(cfg.bind_addr, IpAddr::from([127, 0, 0, 1]));
    }

    #[test]
    fn empty_value_falls_back_to_default() {
        let cfg = config(&[("PORT", "  ")]).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = config(&[("PORT", "seventy")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn schema_must_be_identifier() {
        let err = config(&[("STORE_SCHEMA", "roster; drop table x")]).unwrap_err();
        assert!(matches!(err, ConfigError::Identifier { .. }));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let cfg = config(&[("DB_CONNECT_ATTEMPTS", "0")]).unwrap();
        assert_eq!(cfg.connect.attempts, 1);
    }
}
